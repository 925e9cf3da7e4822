//! Demand-driven refresh ahead of queries.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::stations::{BikeSystem, StationFetcher};

use super::orchestrator::{SyncReport, Synchronizer};

/// Decides whether a system's index is recent enough to answer a query.
///
/// There is no lock around the check: callers that find the index stale at
/// the same moment may each start a sync. Both merge into the same index,
/// so the only cost is a redundant fetch.
pub struct RefreshPolicy<F> {
    synchronizer: Arc<Synchronizer<F>>,
    ttl: Duration,
}

impl<F: StationFetcher> RefreshPolicy<F> {
    pub fn new(synchronizer: Arc<Synchronizer<F>>, ttl: Duration) -> Self {
        Self { synchronizer, ttl }
    }

    /// Sync `system` first if its last completed sync is older than the TTL.
    ///
    /// Returns the report when a sync ran, `None` when the index was fresh.
    pub async fn ensure_fresh(&self, system: &BikeSystem) -> Option<SyncReport> {
        if system.index().is_fresh(self.ttl).await {
            return None;
        }

        debug!(
            system = %system.id(),
            ttl_secs = self.ttl.as_secs(),
            "Station data stale, refreshing before query"
        );
        Some(self.synchronizer.synchronize(system).await)
    }
}
