//! In-memory station index for one bike system.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, RwLockReadGuard};
use tokio::time::Instant;

use super::record::StationRecord;

/// The two lookup maps for a bike system.
///
/// Every code in `by_name` is also a key of `by_code`: codes are only ever
/// inserted, and a name is inserted together with its record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationTable {
    by_code: HashMap<String, StationRecord>,
    by_name: HashMap<String, String>,
}

impl StationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a batch of records, overwriting any existing entry per code
    /// and per name. Entries absent from the batch are kept.
    ///
    /// Returns the number of records applied.
    pub fn merge(&mut self, batch: Vec<StationRecord>) -> usize {
        let count = batch.len();
        for record in batch {
            self.by_name.insert(record.name.clone(), record.code.clone());
            self.by_code.insert(record.code.clone(), record);
        }
        count
    }

    /// Look up a station by code.
    pub fn get(&self, code: &str) -> Option<&StationRecord> {
        self.by_code.get(code)
    }

    /// Resolve a station name to its code.
    pub fn code_for_name(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    /// All `(name, code)` pairs.
    pub fn names(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_name
            .iter()
            .map(|(name, code)| (name.as_str(), code.as_str()))
    }

    /// All indexed station codes.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.by_code.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

/// When a sync pass last completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshStamp {
    /// Monotonic time, used for TTL checks.
    pub at: Instant,
    /// Wall-clock time, for reporting.
    pub wall: DateTime<Utc>,
}

/// Thread-safe station index with its refresh timestamp.
///
/// Merges take the write lock once per batch, so readers see either none
/// or all of a batch.
#[derive(Debug, Default)]
pub struct StationIndex {
    table: RwLock<StationTable>,
    refreshed: RwLock<Option<RefreshStamp>>,
}

impl StationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch into the index. An empty batch does not take the lock.
    pub async fn merge(&self, batch: Vec<StationRecord>) -> usize {
        if batch.is_empty() {
            return 0;
        }
        let mut guard = self.table.write().await;
        guard.merge(batch)
    }

    /// Lock the table for reading.
    ///
    /// Hold the guard for the whole of a multi-step lookup so that it sees
    /// one consistent state.
    pub async fn read(&self) -> RwLockReadGuard<'_, StationTable> {
        self.table.read().await
    }

    /// Number of indexed stations.
    pub async fn len(&self) -> usize {
        self.table.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.table.read().await.is_empty()
    }

    /// Record that a sync pass has just completed.
    pub async fn mark_refreshed(&self) {
        let stamp = RefreshStamp {
            at: Instant::now(),
            wall: Utc::now(),
        };
        *self.refreshed.write().await = Some(stamp);
    }

    pub async fn last_refreshed_at(&self) -> Option<RefreshStamp> {
        *self.refreshed.read().await
    }

    /// Whether a sync pass completed less than `ttl` ago.
    pub async fn is_fresh(&self, ttl: Duration) -> bool {
        match self.last_refreshed_at().await {
            Some(stamp) => stamp.at.elapsed() < ttl,
            None => false,
        }
    }
}
