use chrono::{Months, NaiveDate, NaiveDateTime};

use crate::model::{Calendar, Day};
use crate::store::ReservationStore;

use super::{Engine, EngineError};

/// Day-by-day capacity usage over the inclusive window `[from, to]`.
///
/// Each day is a separate count query; the result is a point-in-time
/// approximation and may be stale relative to concurrent admissions.
pub async fn build_calendar(
    store: &dyn ReservationStore,
    from: NaiveDate,
    to: NaiveDate,
    max_per_day: u32,
) -> Result<Calendar, EngineError> {
    let mut days = Vec::new();
    for date in from.iter_days().take_while(|d| *d <= to) {
        let made = store.count_overlapping(date).await?;
        days.push(Day::new(date, made, max_per_day));
    }
    Ok(Calendar { days })
}

impl Engine {
    /// Availability between `from` and `to`, both truncated to their day.
    /// Defaults to today through one month from today.
    pub async fn availability(
        &self,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
    ) -> Result<Calendar, EngineError> {
        let today = self.clock.today();
        let from = from.map(|t| t.date()).unwrap_or(today);
        let to = to
            .map(|t| t.date())
            .unwrap_or_else(|| today.checked_add_months(Months::new(1)).unwrap_or(NaiveDate::MAX));

        let calendar = build_calendar(
            self.store.as_ref(),
            from,
            to,
            self.policy.max_reservations_per_day,
        )
        .await?;
        metrics::histogram!(crate::observability::CALENDAR_DAYS).record(calendar.days.len() as f64);
        Ok(calendar)
    }
}
