//! Reservation admission for a capacity-limited venue.
//!
//! [`engine::Engine`] decides whether a stay may be booked: it checks the
//! booking policy, counts existing reservations per night and commits the
//! new reservation while holding a single admission gate, so concurrent
//! requests can never overbook a night.

pub mod clock;
pub mod compactor;
pub mod config;
pub mod engine;
pub mod model;
pub mod observability;
pub mod store;
pub mod token;

use std::sync::Arc;

use crate::config::Config;
use crate::engine::Engine;
use crate::store::InMemoryStore;

/// Wire up an engine from configuration: tracing, metrics, the store (journal
/// backed when a path is configured) and its compactor.
/// Must run inside a tokio runtime.
pub fn bootstrap(config: &Config) -> std::io::Result<(Arc<Engine>, Arc<InMemoryStore>)> {
    observability::init_tracing();
    observability::init_metrics(config.metrics_port).map_err(std::io::Error::other)?;

    let store = match &config.journal_path {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)?;
            }
            let store = Arc::new(InMemoryStore::open(path)?);
            tokio::spawn(compactor::run_compactor(store.clone(), config.compact_threshold));
            store
        }
        None => Arc::new(InMemoryStore::new()),
    };

    tracing::info!(
        "innkeep ready: {} reservations/day, stays under {} days, journal: {}",
        config.policy.max_reservations_per_day,
        config.policy.max_stay_days,
        config
            .journal_path
            .as_ref()
            .map_or("disabled".to_string(), |p| p.display().to_string()),
    );

    let engine = Arc::new(Engine::from_config(store.clone(), config));
    Ok((engine, store))
}
