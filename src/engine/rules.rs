use chrono::{Days, Months, NaiveDate};

use crate::config::Policy;

use super::EngineError;

/// Check a stay against the booking policy. The first failing rule wins:
/// end before start, in the past, too late, too soon, too long.
pub fn validate_stay(
    arrival: NaiveDate,
    departure: NaiveDate,
    today: NaiveDate,
    policy: &Policy,
) -> Result<(), EngineError> {
    if departure < arrival {
        return Err(EngineError::EndBeforeStart);
    }
    if arrival < today || departure < today {
        return Err(EngineError::BookingInPast);
    }
    // The eve of arrival must be strictly after today.
    let eve = arrival.checked_sub_days(Days::new(1)).unwrap_or(NaiveDate::MIN);
    if eve <= today {
        return Err(EngineError::BookingTooLate);
    }
    // Month lengths vary; chrono clamps Jan 31 + 1 month to the end of February.
    let horizon = today.checked_add_months(Months::new(1)).unwrap_or(NaiveDate::MAX);
    if arrival >= horizon {
        return Err(EngineError::BookingTooSoon);
    }
    let nights = (departure - arrival).num_days();
    if nights >= i64::from(policy.max_stay_days) {
        return Err(EngineError::MaxDaysExceeded(policy.max_stay_days));
    }
    Ok(())
}
