mod journal;
mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::model::{Reservation, ReservationStatus, Token};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Save was handed a reservation without a token.
    MissingToken,
    Journal(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::MissingToken => write!(f, "reservation has no token"),
            StoreError::Journal(e) => write!(f, "journal error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Durable home of reservation records.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Number of ACTIVE reservations with `arrival <= day <= departure`.
    async fn count_overlapping(&self, day: NaiveDate) -> Result<u64, StoreError>;

    /// Insert or update by token. Assigns a record id on first save.
    async fn save(&self, reservation: Reservation) -> Result<Reservation, StoreError>;

    /// Save only while the stored record with the same token is ACTIVE,
    /// checked and written as one step. `None` means nothing was written.
    async fn replace_active(
        &self,
        reservation: Reservation,
    ) -> Result<Option<Reservation>, StoreError>;

    /// Flip the stored record to CANCELLED in place. Returns its status
    /// before the call, or `None` for an unknown token.
    async fn cancel(&self, token: &Token) -> Result<Option<ReservationStatus>, StoreError>;

    async fn find_by_token(&self, token: &Token) -> Result<Option<Reservation>, StoreError>;

    /// Matching reservations ordered by record id.
    async fn find_all_by_contact_and_status(
        &self,
        email: &str,
        status: ReservationStatus,
    ) -> Result<Vec<Reservation>, StoreError>;
}
