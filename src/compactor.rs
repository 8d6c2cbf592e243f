use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::store::{InMemoryStore, StoreError};

const CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Compact the journal once it has taken `threshold` appends since the last
/// compaction. Returns whether a compaction ran.
pub async fn compact_if_needed(store: &InMemoryStore, threshold: u64) -> Result<bool, StoreError> {
    let appends = store.appends_since_compact().await;
    if appends < threshold.max(1) {
        return Ok(false);
    }
    store.compact().await?;
    metrics::counter!(crate::observability::JOURNAL_COMPACTIONS_TOTAL).increment(1);
    debug!("journal compacted after {appends} appends");
    Ok(true)
}

/// Background task that periodically compacts the store's journal.
pub async fn run_compactor(store: Arc<InMemoryStore>, threshold: u64) {
    let mut interval = tokio::time::interval(CHECK_INTERVAL);
    loop {
        interval.tick().await;
        if let Err(e) = compact_if_needed(&store, threshold).await {
            // Appends keep working against the old file; try again next tick.
            warn!("journal compaction failed: {e}");
        }
    }
}
