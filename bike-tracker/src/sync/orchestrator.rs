//! Full resynchronization of one bike system.

use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::config::{RefreshConfig, Source};
use crate::stations::{BikeSystem, StationFetcher};

/// Retry and concurrency limits for a sync pass.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Consecutive failures after which a paginated source is abandoned.
    pub max_consecutive_failures: u32,
    /// Wait before retrying a failed page.
    pub retry_backoff: Duration,
    /// Pages read from one source before the pass moves on.
    pub max_pages: u32,
    /// Sources of one system fetched at the same time.
    pub max_concurrent_sources: usize,
}

impl SyncSettings {
    pub fn from_refresh(refresh: &RefreshConfig) -> Self {
        Self {
            max_consecutive_failures: refresh.max_consecutive_failures.max(1),
            retry_backoff: refresh.retry_backoff(),
            max_pages: refresh.max_pages,
            max_concurrent_sources: refresh.max_concurrent_sources.max(1),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from_refresh(&RefreshConfig::default())
    }
}

/// Outcome of one sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Records merged into the index.
    pub records: usize,
    /// Sources read to the end.
    pub sources_ok: usize,
    /// Sources abandoned or skipped.
    pub sources_failed: usize,
}

/// Result of reading one source.
struct SourceOutcome {
    records: usize,
    complete: bool,
}

/// Drives a fetcher over every source of a bike system and merges the
/// results into the system's index.
///
/// Safe to run concurrently for the same system: merges serialize on the
/// index lock and later batches overwrite earlier ones per code.
pub struct Synchronizer<F> {
    fetcher: F,
    settings: SyncSettings,
}

impl<F: StationFetcher> Synchronizer<F> {
    pub fn new(fetcher: F, settings: SyncSettings) -> Self {
        Self { fetcher, settings }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch every source of `system` and merge what arrives.
    ///
    /// Never fails: sources that cannot be read are logged and skipped.
    /// The refresh timestamp is updated once every source has been tried,
    /// whether or not they all succeeded.
    pub async fn synchronize(&self, system: &BikeSystem) -> SyncReport {
        let started = Instant::now();
        let permits = Semaphore::new(self.settings.max_concurrent_sources);

        let mut passes = Vec::with_capacity(system.sources().len());
        for source in system.sources() {
            passes.push(self.sync_source(system, source, &permits));
        }

        let mut report = SyncReport::default();
        for outcome in join_all(passes).await {
            report.records += outcome.records;
            if outcome.complete {
                report.sources_ok += 1;
            } else {
                report.sources_failed += 1;
            }
        }

        system.index().mark_refreshed().await;

        let stations = system.index().len().await;
        info!(
            system = %system.id(),
            records = report.records,
            stations,
            sources_ok = report.sources_ok,
            sources_failed = report.sources_failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Station sync complete"
        );

        report
    }

    async fn sync_source(
        &self,
        system: &BikeSystem,
        source: &Source,
        permits: &Semaphore,
    ) -> SourceOutcome {
        // The semaphore is local and never closed.
        let _permit = permits.acquire().await.ok();

        match source {
            Source::Paginated { .. } => self.sync_paginated(system, source).await,
            Source::Single { .. } => self.sync_single(system, source).await,
        }
    }

    /// Read pages 0, 1, 2, ... until an empty page, retrying a failed page
    /// after a backoff until the consecutive-failure limit.
    async fn sync_paginated(&self, system: &BikeSystem, source: &Source) -> SourceOutcome {
        let mut page = 0;
        let mut failures = 0;
        let mut records = 0;

        loop {
            if page >= self.settings.max_pages {
                warn!(
                    system = %system.id(),
                    url = source.url(),
                    max_pages = self.settings.max_pages,
                    "Page limit reached, remaining pages skipped this pass"
                );
                return SourceOutcome {
                    records,
                    complete: true,
                };
            }

            match self.fetcher.fetch(source, Some(page)).await {
                Ok(batch) if batch.is_empty() => {
                    return SourceOutcome {
                        records,
                        complete: true,
                    };
                }
                Ok(batch) => {
                    records += system.index().merge(batch).await;
                    failures = 0;
                    page += 1;
                }
                Err(e) => {
                    failures += 1;
                    if failures >= self.settings.max_consecutive_failures {
                        error!(
                            system = %system.id(),
                            url = source.url(),
                            page,
                            failures,
                            error = %e,
                            "Giving up on station source for this pass"
                        );
                        return SourceOutcome {
                            records,
                            complete: false,
                        };
                    }
                    warn!(
                        system = %system.id(),
                        url = source.url(),
                        page,
                        failures,
                        error = %e,
                        "Station fetch failed, retrying"
                    );
                    tokio::time::sleep(self.settings.retry_backoff).await;
                }
            }
        }
    }

    /// One attempt; a failure skips the source until the next pass.
    async fn sync_single(&self, system: &BikeSystem, source: &Source) -> SourceOutcome {
        match self.fetcher.fetch(source, None).await {
            Ok(batch) => SourceOutcome {
                records: system.index().merge(batch).await,
                complete: true,
            },
            Err(e) => {
                error!(
                    system = %system.id(),
                    url = source.url(),
                    error = %e,
                    "Station source skipped for this pass"
                );
                SourceOutcome {
                    records: 0,
                    complete: false,
                }
            }
        }
    }
}
