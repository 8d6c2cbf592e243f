use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MAX_RESERVATIONS_PER_DAY: u32 = 30;
pub const DEFAULT_MAX_STAY_DAYS: u32 = 8;
pub const DEFAULT_COMPACT_THRESHOLD: u64 = 1000;

/// Booking policy. Read-only after startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    /// Ceiling on ACTIVE reservations overlapping any one day.
    pub max_reservations_per_day: u32,
    /// A stay of this many nights or more is rejected.
    pub max_stay_days: u32,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            max_reservations_per_day: DEFAULT_MAX_RESERVATIONS_PER_DAY,
            max_stay_days: DEFAULT_MAX_STAY_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub policy: Policy,
    /// Journal file backing the store. `None` keeps reservations in memory only.
    pub journal_path: Option<PathBuf>,
    /// Journal appends tolerated before the compactor rewrites it.
    pub compact_threshold: u64,
    /// Bound on waiting for the admission gate. `None` waits forever.
    pub admission_timeout: Option<Duration>,
    pub metrics_port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: Policy::default(),
            journal_path: None,
            compact_threshold: DEFAULT_COMPACT_THRESHOLD,
            admission_timeout: None,
            metrics_port: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());

        let policy = Policy {
            max_reservations_per_day: parsed("INNKEEP_MAX_RESERVATIONS_PER_DAY")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(DEFAULT_MAX_RESERVATIONS_PER_DAY),
            max_stay_days: parsed("INNKEEP_MAX_STAY_DAYS")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(DEFAULT_MAX_STAY_DAYS),
        };

        Self {
            policy,
            journal_path: lookup("INNKEEP_JOURNAL_PATH")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            compact_threshold: parsed("INNKEEP_COMPACT_THRESHOLD")
                .unwrap_or(DEFAULT_COMPACT_THRESHOLD),
            admission_timeout: parsed("INNKEEP_ADMISSION_TIMEOUT_MS").map(Duration::from_millis),
            metrics_port: parsed("INNKEEP_METRICS_PORT").and_then(|v| u16::try_from(v).ok()),
        }
    }
}
