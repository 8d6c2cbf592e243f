use std::time::Instant;

use tracing::{debug, info, warn};

use crate::model::*;

use super::capacity::full_days;
use super::rules::validate_stay;
use super::{Engine, EngineError};

impl Engine {
    /// Book a new stay. Returns the stored reservation with its fresh token.
    pub async fn create_reservation(
        &self,
        candidate: NewReservation,
    ) -> Result<Reservation, EngineError> {
        let result = self
            .admit(Reservation::from_candidate(candidate), Commit::New)
            .await;
        record_admission("create", &result);
        result
    }

    /// Replace the dates and holder details of an existing reservation.
    /// The token and record id are preserved; the replacement goes through
    /// full admission again.
    pub async fn update_reservation(
        &self,
        token: Token,
        candidate: NewReservation,
    ) -> Result<Reservation, EngineError> {
        let result = self.replace(token, candidate).await;
        record_admission("update", &result);
        result
    }

    async fn replace(
        &self,
        token: Token,
        candidate: NewReservation,
    ) -> Result<Reservation, EngineError> {
        let existing = self
            .store
            .find_by_token(&token)
            .await?
            .ok_or(EngineError::NotFound(token))?;
        if !existing.is_active() {
            return Err(EngineError::AlreadyCancelled(token));
        }

        let mut replacement = Reservation::from_candidate(candidate);
        replacement.id = existing.id;
        replacement.token = Some(token);
        self.admit(replacement, Commit::Replace(token)).await
    }

    /// Mark a reservation cancelled. Cancelling twice is not an error.
    /// Never enters the admission gate: it only frees capacity.
    pub async fn cancel_reservation(&self, token: Token) -> Result<(), EngineError> {
        match self.store.cancel(&token).await? {
            None => Err(EngineError::NotFound(token)),
            Some(ReservationStatus::Cancelled) => {
                debug!("reservation {token} already cancelled");
                Ok(())
            }
            Some(ReservationStatus::Active) => {
                metrics::counter!(crate::observability::CANCELLATIONS_TOTAL).increment(1);
                info!("cancelled reservation {token}");
                Ok(())
            }
        }
    }

    /// Validate, then count-compare-write under the admission gate.
    async fn admit(
        &self,
        mut reservation: Reservation,
        commit: Commit,
    ) -> Result<Reservation, EngineError> {
        let today = self.clock.today();
        validate_stay(reservation.arrival, reservation.departure, today, &self.policy)?;

        let _gate = self.enter_admission().await?;
        let held_since = Instant::now();

        // A same-day stay is checked against its arrival day.
        let full = full_days(
            self.store.as_ref(),
            reservation.arrival,
            reservation.departure,
            self.policy.max_reservations_per_day,
        )
        .await?;
        if !full.is_empty() {
            debug!(
                "rejecting {}..{}: {} full day(s)",
                reservation.arrival,
                reservation.departure,
                full.len()
            );
            return Err(EngineError::MaxReservationsPerDayExceeded(full));
        }

        reservation.status = ReservationStatus::Active;
        let saved = match commit {
            Commit::New => {
                reservation.token = Some(self.tokens.next_token());
                self.store.save(reservation).await?
            }
            // Cancellation skips the gate, so the store re-checks the status.
            Commit::Replace(token) => self
                .store
                .replace_active(reservation)
                .await?
                .ok_or(EngineError::AlreadyCancelled(token))?,
        };

        metrics::histogram!(crate::observability::ADMISSION_HOLD_SECONDS)
            .record(held_since.elapsed().as_secs_f64());
        if let Some(token) = saved.token {
            info!(
                "admitted reservation {token} for {}..{}",
                saved.arrival, saved.departure
            );
        }
        Ok(saved)
    }
}

/// How an admitted reservation reaches the store.
enum Commit {
    /// Fresh token, unconditional save.
    New,
    /// Overwrite only while the stored record is still ACTIVE.
    Replace(Token),
}

fn record_admission(operation: &'static str, result: &Result<Reservation, EngineError>) {
    if let Err(err) = result {
        if !err.is_rejection() {
            warn!("{operation} failed: {err}");
        }
    }
    let outcome = crate::observability::outcome_label(&result.as_ref().map(|_| ()));
    metrics::counter!(
        crate::observability::ADMISSIONS_TOTAL,
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}
