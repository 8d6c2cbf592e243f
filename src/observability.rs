use std::net::SocketAddr;

use crate::engine::EngineError;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: admission decisions. Labels: operation, outcome.
pub const ADMISSIONS_TOTAL: &str = "innkeep_admissions_total";

/// Histogram: time spent waiting for the admission gate, in seconds.
pub const ADMISSION_WAIT_SECONDS: &str = "innkeep_admission_wait_seconds";

/// Histogram: time spent inside the admission gate, in seconds.
pub const ADMISSION_HOLD_SECONDS: &str = "innkeep_admission_hold_seconds";

/// Counter: reservations cancelled.
pub const CANCELLATIONS_TOTAL: &str = "innkeep_cancellations_total";

/// Histogram: days per availability query.
pub const CALENDAR_DAYS: &str = "innkeep_calendar_days";

// ── USE metrics (resource utilization) ──────────────────────────

/// Histogram: journal group-commit flush duration in seconds.
pub const JOURNAL_FLUSH_DURATION_SECONDS: &str = "innkeep_journal_flush_duration_seconds";

/// Histogram: journal group-commit batch size (entries per flush).
pub const JOURNAL_FLUSH_BATCH_SIZE: &str = "innkeep_journal_flush_batch_size";

/// Counter: journal compactions run.
pub const JOURNAL_COMPACTIONS_TOTAL: &str = "innkeep_journal_compactions_total";

/// Install a fmt subscriber. Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init_metrics(port: Option<u16>) -> Result<(), String> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("failed to install Prometheus metrics exporter: {e}"))?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Map an admission result to a short label for metrics.
pub fn outcome_label(result: &Result<(), &EngineError>) -> &'static str {
    match result {
        Ok(()) => "admitted",
        Err(EngineError::EndBeforeStart) => "end_before_start",
        Err(EngineError::BookingInPast) => "booking_in_past",
        Err(EngineError::BookingTooLate) => "booking_too_late",
        Err(EngineError::BookingTooSoon) => "booking_too_soon",
        Err(EngineError::MaxDaysExceeded(_)) => "max_days_exceeded",
        Err(EngineError::MaxReservationsPerDayExceeded(_)) => "venue_full",
        Err(EngineError::NotFound(_)) => "not_found",
        Err(EngineError::AlreadyCancelled(_)) => "already_cancelled",
        Err(EngineError::AdmissionTimeout) => "admission_timeout",
        Err(EngineError::Internal(_)) => "internal",
    }
}
