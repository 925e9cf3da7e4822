//! Upstream station records.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// One station observation from an upstream feed.
///
/// Only `sno`, `sna`, `sbi` and `bemp` are interpreted. Every other field
/// is carried along untouched in `attributes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    /// Stable station identifier.
    #[serde(rename = "sno", deserialize_with = "code_from_string_or_number")]
    pub code: String,

    /// Human-readable station name.
    #[serde(rename = "sna")]
    pub name: String,

    /// Bikes available to borrow.
    #[serde(rename = "sbi", deserialize_with = "count_from_string_or_number")]
    pub bikes_available: u32,

    /// Empty docks available to return a bike to.
    #[serde(rename = "bemp", deserialize_with = "count_from_string_or_number")]
    pub docks_available: u32,

    /// Opaque pass-through fields.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl StationRecord {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        bikes_available: u32,
        docks_available: u32,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            bikes_available,
            docks_available,
            attributes: Map::new(),
        }
    }
}

/// The New Taipei feeds publish every field as a string; Taipei uses numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(Number),
}

fn code_from_string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match StringOrNumber::deserialize(d)? {
        StringOrNumber::String(s) => Ok(s),
        StringOrNumber::Number(n) => Ok(n.to_string()),
    }
}

fn count_from_string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    match StringOrNumber::deserialize(d)? {
        StringOrNumber::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid station count: {s:?}"))),
        StringOrNumber::Number(n) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| de::Error::custom(format!("invalid station count: {n}"))),
    }
}
