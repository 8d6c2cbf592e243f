use chrono::NaiveDate;

use crate::model::Token;
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    EndBeforeStart,
    BookingInPast,
    BookingTooLate,
    BookingTooSoon,
    /// Carries the configured stay limit in days.
    MaxDaysExceeded(u32),
    /// Carries every day of the request already at capacity, in date order.
    MaxReservationsPerDayExceeded(Vec<NaiveDate>),
    NotFound(Token),
    AlreadyCancelled(Token),
    AdmissionTimeout,
    Internal(StoreError),
}

impl EngineError {
    /// True for rejections caused by the request itself rather than the engine.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, EngineError::AdmissionTimeout | EngineError::Internal(_))
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::EndBeforeStart => {
                write!(f, "departure date cannot be before arrival date")
            }
            EngineError::BookingInPast => write!(f, "cannot book a reservation in the past"),
            EngineError::BookingTooLate => {
                write!(f, "reservations must be made at least 1 day before arrival")
            }
            EngineError::BookingTooSoon => {
                write!(f, "reservations cannot be made more than 1 month before arrival")
            }
            EngineError::MaxDaysExceeded(limit) => {
                write!(f, "reservations cannot be longer than {limit} days")
            }
            EngineError::MaxReservationsPerDayExceeded(days) => {
                let days: Vec<String> = days.iter().map(|d| d.to_string()).collect();
                write!(f, "venue is full on: {}", days.join(", "))
            }
            EngineError::NotFound(token) => write!(f, "reservation not found: {token}"),
            EngineError::AlreadyCancelled(token) => {
                write!(f, "reservation {token} is cancelled and cannot be changed")
            }
            EngineError::AdmissionTimeout => {
                write!(f, "timed out waiting to check availability")
            }
            EngineError::Internal(e) => write!(f, "internal error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Internal(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        EngineError::Internal(e)
    }
}
