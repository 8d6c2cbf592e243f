use std::sync::Mutex;

use ulid::{Generator, Ulid};

use crate::model::Token;

/// Issues reservation tokens. Every call must return a never-before-seen value.
pub trait TokenSource: Send + Sync {
    fn next_token(&self) -> Token;
}

/// Monotonic ULIDs, so tokens minted in the same millisecond still sort by issue order.
pub struct UlidTokens {
    generator: Mutex<Generator>,
}

impl Default for UlidTokens {
    fn default() -> Self {
        Self::new()
    }
}

impl UlidTokens {
    pub fn new() -> Self {
        Self {
            generator: Mutex::new(Generator::new()),
        }
    }
}

impl TokenSource for UlidTokens {
    fn next_token(&self) -> Token {
        let mut generator = match self.generator.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Overflow only happens after 2^80 tokens in one millisecond.
        generator.generate().unwrap_or_else(|_| Ulid::new())
    }
}
