use crate::model::*;

use super::{Engine, EngineError};

impl Engine {
    /// Read-only lookup. Does not touch the admission gate.
    pub async fn find_by_token(&self, token: &Token) -> Result<Option<Reservation>, EngineError> {
        Ok(self.store.find_by_token(token).await?)
    }

    pub async fn list_active_by_contact(&self, email: &str) -> Result<Vec<Reservation>, EngineError> {
        Ok(self
            .store
            .find_all_by_contact_and_status(email, ReservationStatus::Active)
            .await?)
    }

    pub async fn list_cancelled_by_contact(
        &self,
        email: &str,
    ) -> Result<Vec<Reservation>, EngineError> {
        Ok(self
            .store
            .find_all_by_contact_and_status(email, ReservationStatus::Cancelled)
            .await?)
    }
}
