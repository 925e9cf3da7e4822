//! Service configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all)
//! yields a working configuration pointed at the public YouBike feeds.

use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// New Taipei YouBike 1.0 feed (paginated).
const NEW_TAIPEI_YOUBIKE_URL: &str =
    "https://data.ntpc.gov.tw/api/datasets/71cd1490-a2df-4198-bef1-318479775e8a/json";

/// New Taipei YouBike 2.0 feed (paginated).
const NEW_TAIPEI_YOUBIKE2_URL: &str =
    "https://data.ntpc.gov.tw/api/datasets/010e5b15-3823-4b20-b401-b1cf000550c5/json";

/// Taipei YouBike 2.0 feed (full dataset in one response).
const TAIPEI_YOUBIKE2_URL: &str =
    "https://tcgbusfs.blob.core.windows.net/dotapp/youbike/v2/youbike_immediate.json";

/// Identifier of a bike system, as used in the `system` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SystemId {
    /// YouBike 1.0, query value `"1"`.
    #[serde(rename = "1")]
    YouBike,
    /// YouBike 2.0, query value `"2"`.
    #[serde(rename = "2")]
    YouBike2,
}

impl SystemId {
    /// All known systems, in query-value order.
    pub const ALL: [SystemId; 2] = [SystemId::YouBike, SystemId::YouBike2];

    /// The query-parameter value for this system.
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemId::YouBike => "1",
            SystemId::YouBike2 => "2",
        }
    }

    pub(crate) fn slot(&self) -> usize {
        match self {
            SystemId::YouBike => 0,
            SystemId::YouBike2 => 1,
        }
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemId::YouBike => f.write_str("YouBike"),
            SystemId::YouBike2 => f.write_str("YouBike2"),
        }
    }
}

/// Error returned when a `system` value is neither `"1"` nor `"2"`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown bike system: {0:?} (expected \"1\" or \"2\")")]
pub struct UnknownSystem(pub String);

impl FromStr for SystemId {
    type Err = UnknownSystem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(SystemId::YouBike),
            "2" => Ok(SystemId::YouBike2),
            other => Err(UnknownSystem(other.to_string())),
        }
    }
}

/// An upstream feed of station records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Source {
    /// Served in pages of `page_size`; an empty page ends the data.
    Paginated { url: String },
    /// Returns the whole dataset in one response; an empty response is a failure.
    Single { url: String },
}

impl Source {
    pub fn paginated(url: impl Into<String>) -> Self {
        Source::Paginated { url: url.into() }
    }

    pub fn single(url: impl Into<String>) -> Self {
        Source::Single { url: url.into() }
    }

    pub fn url(&self) -> &str {
        match self {
            Source::Paginated { url } | Source::Single { url } => url,
        }
    }

    pub fn is_paginated(&self) -> bool {
        matches!(self, Source::Paginated { .. })
    }
}

/// Sources for one bike system.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    pub id: SystemId,
    #[serde(default)]
    pub sources: Vec<Source>,
}

/// Timing and limits for fetching and refreshing station data.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    /// Seconds between unconditional background syncs (default: 180)
    #[serde(default = "RefreshConfig::default_background_interval_secs")]
    pub background_interval_secs: u64,
    /// Seconds a completed sync satisfies incoming queries (default: 60)
    #[serde(default = "RefreshConfig::default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Records requested per page from paginated sources (default: 200)
    #[serde(default = "RefreshConfig::default_page_size")]
    pub page_size: u32,
    /// Consecutive failures before a paginated source is abandoned for a pass (default: 3)
    #[serde(default = "RefreshConfig::default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    /// Seconds to wait before retrying a failed page (default: 3)
    #[serde(default = "RefreshConfig::default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,
    /// Per-request timeout in seconds (default: 10)
    #[serde(default = "RefreshConfig::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Upper bound on pages read from one source in a single pass (default: 500)
    #[serde(default = "RefreshConfig::default_max_pages")]
    pub max_pages: u32,
    /// Sources of one system fetched at the same time (default: 2)
    #[serde(default = "RefreshConfig::default_max_concurrent_sources")]
    pub max_concurrent_sources: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            background_interval_secs: Self::default_background_interval_secs(),
            cache_ttl_secs: Self::default_cache_ttl_secs(),
            page_size: Self::default_page_size(),
            max_consecutive_failures: Self::default_max_consecutive_failures(),
            retry_backoff_secs: Self::default_retry_backoff_secs(),
            request_timeout_secs: Self::default_request_timeout_secs(),
            max_pages: Self::default_max_pages(),
            max_concurrent_sources: Self::default_max_concurrent_sources(),
        }
    }
}

impl RefreshConfig {
    fn default_background_interval_secs() -> u64 {
        180
    }
    fn default_cache_ttl_secs() -> u64 {
        60
    }
    fn default_page_size() -> u32 {
        200
    }
    fn default_max_consecutive_failures() -> u32 {
        3
    }
    fn default_retry_backoff_secs() -> u64 {
        3
    }
    fn default_request_timeout_secs() -> u64 {
        10
    }
    fn default_max_pages() -> u32 {
        500
    }
    fn default_max_concurrent_sources() -> usize {
        2
    }

    pub fn background_interval(&self) -> Duration {
        Duration::from_secs(self.background_interval_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Reject values that would stall or panic the refresh machinery.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let nonzero = [
            ("background_interval_secs", self.background_interval_secs),
            ("cache_ttl_secs", self.cache_ttl_secs),
            ("page_size", u64::from(self.page_size)),
            ("max_consecutive_failures", u64::from(self.max_consecutive_failures)),
            ("request_timeout_secs", self.request_timeout_secs),
            ("max_pages", u64::from(self.max_pages)),
            ("max_concurrent_sources", self.max_concurrent_sources as u64),
        ];
        for (field, value) in nonzero {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("refresh.{field} must be at least 1")));
            }
        }
        Ok(())
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// Address the HTTP server listens on.
    #[serde(default = "TrackerConfig::default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// One entry per bike system.
    #[serde(default = "TrackerConfig::default_systems")]
    pub systems: Vec<SystemConfig>,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            bind_addr: Self::default_bind_addr(),
            systems: Self::default_systems(),
            refresh: RefreshConfig::default(),
        }
    }
}

impl TrackerConfig {
    fn default_bind_addr() -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], 3000))
    }

    fn default_systems() -> Vec<SystemConfig> {
        vec![
            SystemConfig {
                id: SystemId::YouBike,
                sources: vec![Source::paginated(NEW_TAIPEI_YOUBIKE_URL)],
            },
            SystemConfig {
                id: SystemId::YouBike2,
                sources: vec![
                    Source::paginated(NEW_TAIPEI_YOUBIKE2_URL),
                    Source::single(TAIPEI_YOUBIKE2_URL),
                ],
            },
        ]
    }

    /// Load and validate configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Read(e.to_string()))?;

        let config: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.refresh.validate()
    }

    /// Override the listen address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(String),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("no configuration for bike system {0}")]
    MissingSystem(SystemId),
    #[error("bike system {0} is configured more than once")]
    DuplicateSystem(SystemId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn system_id_parses_exact_values_only() {
        assert_eq!("1".parse::<SystemId>(), Ok(SystemId::YouBike));
        assert_eq!("2".parse::<SystemId>(), Ok(SystemId::YouBike2));
        assert!("3".parse::<SystemId>().is_err());
        assert!(" 1".parse::<SystemId>().is_err());
        assert!("".parse::<SystemId>().is_err());
        assert!("youbike".parse::<SystemId>().is_err());
    }

    #[test]
    fn unknown_system_names_the_value() {
        let err = "7".parse::<SystemId>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown bike system: \"7\" (expected \"1\" or \"2\")"
        );
    }

    #[test]
    fn refresh_defaults() {
        let config = RefreshConfig::default();
        assert_eq!(config.background_interval(), Duration::from_secs(180));
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.page_size, 200);
        assert_eq!(config.max_consecutive_failures, 3);
        assert_eq!(config.retry_backoff(), Duration::from_secs(3));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn default_systems_match_upstream_layout() {
        let config = TrackerConfig::default();
        assert_eq!(config.systems.len(), 2);
        assert_eq!(config.systems[0].id, SystemId::YouBike);
        assert_eq!(config.systems[0].sources.len(), 1);
        assert!(config.systems[0].sources[0].is_paginated());
        assert_eq!(config.systems[1].id, SystemId::YouBike2);
        assert!(config.systems[1].sources[0].is_paginated());
        assert!(!config.systems[1].sources[1].is_paginated());
    }

    #[test]
    fn load_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "bind_addr": "127.0.0.1:8080",
                "systems": [
                    {{"id": "1", "sources": [{{"kind": "paginated", "url": "http://a/json"}}]}},
                    {{"id": "2", "sources": [{{"kind": "single", "url": "http://b/json"}}]}}
                ],
                "refresh": {{"cache_ttl_secs": 5}}
            }}"#
        )
        .unwrap();

        let config = TrackerConfig::load(file.path()).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.systems[0].sources, vec![Source::paginated("http://a/json")]);
        assert_eq!(config.systems[1].sources, vec![Source::single("http://b/json")]);
        assert_eq!(config.refresh.cache_ttl_secs, 5);
        assert_eq!(config.refresh.background_interval_secs, 180);
    }

    #[test]
    fn load_empty_object_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        std::fs::write(&path, "{}").unwrap();

        let config = TrackerConfig::load(&path).unwrap();
        assert_eq!(config.bind_addr, TrackerConfig::default().bind_addr);
        assert_eq!(config.systems.len(), 2);
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let err = TrackerConfig::load("/nonexistent/tracker.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }

    #[test]
    fn load_rejects_unknown_system_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        std::fs::write(&path, r#"{"systems": [{"id": "9"}]}"#).unwrap();

        let err = TrackerConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_rejects_zero_background_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        std::fs::write(&path, r#"{"refresh": {"background_interval_secs": 0}}"#).unwrap();

        let err = TrackerConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("background_interval_secs"));
    }

    #[test]
    fn zero_limits_are_invalid() {
        assert!(TrackerConfig::default().validate().is_ok());

        let zeroed = [
            RefreshConfig { cache_ttl_secs: 0, ..RefreshConfig::default() },
            RefreshConfig { page_size: 0, ..RefreshConfig::default() },
            RefreshConfig { request_timeout_secs: 0, ..RefreshConfig::default() },
            RefreshConfig { max_pages: 0, ..RefreshConfig::default() },
            RefreshConfig { max_concurrent_sources: 0, ..RefreshConfig::default() },
        ];
        for refresh in zeroed {
            assert!(matches!(refresh.validate(), Err(ConfigError::Invalid(_))));
        }

        let no_backoff = RefreshConfig { retry_backoff_secs: 0, ..RefreshConfig::default() };
        assert!(no_backoff.validate().is_ok());
    }
}
