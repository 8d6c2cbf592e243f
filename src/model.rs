use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Opaque reservation handle given to the holder.
pub type Token = Ulid;

/// Store-owned record id, assigned on first save.
pub type RecordId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservationStatus {
    Active,
    Cancelled,
}

/// Candidate booking as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub name: String,
    pub email: String,
    pub arrival: NaiveDate,
    pub departure: NaiveDate,
}

impl NewReservation {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        arrival: NaiveDate,
        departure: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            arrival,
            departure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Option<RecordId>,
    pub token: Option<Token>,
    pub name: String,
    pub email: String,
    pub arrival: NaiveDate,
    pub departure: NaiveDate,
    pub status: ReservationStatus,
}

impl Reservation {
    /// Unsaved, tokenless reservation built from a candidate.
    pub fn from_candidate(candidate: NewReservation) -> Self {
        Self {
            id: None,
            token: None,
            name: candidate.name,
            email: candidate.email,
            arrival: candidate.arrival,
            departure: candidate.departure,
            status: ReservationStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }
}

/// Occupancy interval of one ACTIVE reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stay {
    pub token: Token,
    pub arrival: NaiveDate,
    pub departure: NaiveDate,
}

impl Stay {
    /// Store-side occupancy: inclusive on both ends.
    pub fn covers(&self, day: NaiveDate) -> bool {
        self.arrival <= day && day <= self.departure
    }
}

/// All ACTIVE stays, sorted by `arrival`.
#[derive(Debug, Clone, Default)]
pub struct Occupancy {
    pub stays: Vec<Stay>,
}

impl Occupancy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert stay maintaining sort order by arrival.
    pub fn insert_stay(&mut self, stay: Stay) {
        let pos = self
            .stays
            .binary_search_by_key(&stay.arrival, |s| s.arrival)
            .unwrap_or_else(|e| e);
        self.stays.insert(pos, stay);
    }

    pub fn remove_stay(&mut self, token: Token) -> Option<Stay> {
        let pos = self.stays.iter().position(|s| s.token == token)?;
        Some(self.stays.remove(pos))
    }

    /// Number of stays covering `day`.
    /// Stays at index >= right_bound arrive after `day` and can't cover it.
    pub fn count_covering(&self, day: NaiveDate) -> u64 {
        let right_bound = self.stays.partition_point(|s| s.arrival <= day);
        self.stays[..right_bound]
            .iter()
            .filter(|s| s.covers(day))
            .count() as u64
    }

    pub fn len(&self) -> usize {
        self.stays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stays.is_empty()
    }
}

/// Journal record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalEntry {
    Saved(Reservation),
}

// ── Availability view ────────────────────────────────────────────

/// Capacity usage for one calendar day. Derived on every query, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Day {
    pub date: NaiveDate,
    pub reservations_made: u64,
    pub max_reservations: u32,
    /// Negative when a day is over capacity.
    pub available_spots: i64,
}

impl Day {
    pub fn new(date: NaiveDate, reservations_made: u64, max_reservations: u32) -> Self {
        Self {
            date,
            reservations_made,
            max_reservations,
            available_spots: i64::from(max_reservations) - reservations_made as i64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Calendar {
    pub days: Vec<Day>,
}
