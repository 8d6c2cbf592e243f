use chrono::NaiveDate;

use crate::store::ReservationStore;

use super::EngineError;

/// Nights a new stay consumes: `[arrival, departure)`.
/// A same-day stay still takes its arrival day.
pub fn nights(arrival: NaiveDate, departure: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let end = departure.max(arrival.succ_opt().unwrap_or(arrival));
    arrival.iter_days().take_while(move |d| *d < end)
}

/// Days of the stay whose ACTIVE count already meets `max_per_day`, in date order.
pub async fn full_days(
    store: &dyn ReservationStore,
    arrival: NaiveDate,
    departure: NaiveDate,
    max_per_day: u32,
) -> Result<Vec<NaiveDate>, EngineError> {
    let mut full = Vec::new();
    for day in nights(arrival, departure) {
        let count = store.count_overlapping(day).await?;
        if count >= u64::from(max_per_day) {
            full.push(day);
        }
    }
    Ok(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Reservation, ReservationStatus};
    use crate::store::InMemoryStore;
    use ulid::Ulid;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 9, day).unwrap()
    }

    async fn seed(store: &InMemoryStore, arrival: u32, departure: u32, n: usize) {
        for _ in 0..n {
            store
                .save(Reservation {
                    id: None,
                    token: Some(Ulid::new()),
                    name: "Ian Malcolm".into(),
                    email: "ian@example.org".into(),
                    arrival: d(arrival),
                    departure: d(departure),
                    status: ReservationStatus::Active,
                })
                .await
                .unwrap();
        }
    }

    #[test]
    fn nights_exclude_departure() {
        let n: Vec<_> = nights(d(4), d(6)).collect();
        assert_eq!(n, vec![d(4), d(5)]);
    }

    #[test]
    fn same_day_stay_takes_arrival() {
        let n: Vec<_> = nights(d(4), d(4)).collect();
        assert_eq!(n, vec![d(4)]);
    }

    #[tokio::test]
    async fn empty_store_has_no_full_days() {
        let store = InMemoryStore::new();
        assert!(full_days(&store, d(4), d(6), 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reports_every_full_night() {
        let store = InMemoryStore::new();
        seed(&store, 4, 6, 2).await;
        let full = full_days(&store, d(3), d(8), 2).await.unwrap();
        // Day 6 is the existing stays' departure: occupied in the store,
        // so it counts as full too.
        assert_eq!(full, vec![d(4), d(5), d(6)]);
    }

    #[tokio::test]
    async fn departure_day_of_request_is_not_checked() {
        let store = InMemoryStore::new();
        seed(&store, 6, 7, 2).await;
        // Day 6 is full, but it is the requested departure.
        assert!(full_days(&store, d(4), d(6), 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn below_capacity_is_free() {
        let store = InMemoryStore::new();
        seed(&store, 4, 6, 29).await;
        assert!(full_days(&store, d(4), d(6), 30).await.unwrap().is_empty());
        seed(&store, 4, 4, 1).await;
        assert_eq!(full_days(&store, d(4), d(6), 30).await.unwrap(), vec![d(4)]);
    }
}
