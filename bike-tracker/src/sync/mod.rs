//! Keeping station indexes fresh.
//!
//! A sync pass fetches every source of a bike system and merges the
//! results. Passes are started by an unconditional background loop and,
//! when a query finds the data older than the cache TTL, on demand.

mod orchestrator;
mod refresh;
mod scheduler;

pub use orchestrator::{SyncReport, SyncSettings, Synchronizer};
pub use refresh::RefreshPolicy;
pub use scheduler::{RefreshHandle, spawn_background_refresh};
