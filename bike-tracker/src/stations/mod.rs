//! Station feeds and the in-memory station index.
//!
//! Each bike system keeps a code → record map and a name → code map,
//! filled from paginated or single-shot JSON feeds and refreshed
//! periodically.

mod client;
mod error;
mod index;
#[cfg(test)]
pub(crate) mod mock;
mod record;
mod system;

pub use client::{HttpFetcher, HttpFetcherConfig, StationFetcher};
pub use error::{FetchError, FetchErrorKind};
pub use index::{RefreshStamp, StationIndex, StationTable};
pub use record::StationRecord;
pub use system::{BikeSystem, BikeSystems};
