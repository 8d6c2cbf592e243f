mod calendar;
mod capacity;
mod error;
mod mutations;
mod queries;
mod rules;

pub use calendar::build_calendar;
pub use capacity::{full_days, nights};
pub use error::EngineError;
pub use rules::validate_stay;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, MutexGuard};

use crate::clock::{Clock, SystemClock};
use crate::config::{Config, Policy};
use crate::store::ReservationStore;
use crate::token::{TokenSource, UlidTokens};

/// Booking coordinator. Validates, checks capacity and commits reservations
/// through a [`ReservationStore`].
pub struct Engine {
    pub(super) store: Arc<dyn ReservationStore>,
    pub(super) policy: Policy,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) tokens: Arc<dyn TokenSource>,
    /// Held for the count-compare-write sequence of every admission.
    admission: Mutex<()>,
    admission_timeout: Option<Duration>,
}

impl Engine {
    pub fn new(store: Arc<dyn ReservationStore>, policy: Policy) -> Self {
        Self {
            store,
            policy,
            clock: Arc::new(SystemClock),
            tokens: Arc::new(UlidTokens::new()),
            admission: Mutex::new(()),
            admission_timeout: None,
        }
    }

    pub fn from_config(store: Arc<dyn ReservationStore>, config: &Config) -> Self {
        Self::new(store, config.policy).with_admission_timeout(config.admission_timeout)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_tokens(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_admission_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.admission_timeout = timeout;
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn store(&self) -> &Arc<dyn ReservationStore> {
        &self.store
    }

    /// Enter the admission gate, waiting at most `admission_timeout`.
    pub(super) async fn enter_admission(&self) -> Result<MutexGuard<'_, ()>, EngineError> {
        let wait_start = Instant::now();
        let guard = match self.admission_timeout {
            Some(limit) => tokio::time::timeout(limit, self.admission.lock())
                .await
                .map_err(|_| EngineError::AdmissionTimeout)?,
            None => self.admission.lock().await,
        };
        metrics::histogram!(crate::observability::ADMISSION_WAIT_SECONDS)
            .record(wait_start.elapsed().as_secs_f64());
        Ok(guard)
    }
}
