//! Availability queries against a station table.

use std::collections::BTreeMap;
use std::fmt;

use crate::stations::{StationRecord, StationTable};

/// How station keys in a query are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Station code (`sno`)
    Code,
    /// Exact station name (`sna`)
    Name,
}

/// Which end of the trip a key refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationRole {
    Depart,
    Arrive,
}

impl fmt::Display for StationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationRole::Depart => f.write_str("depart"),
            StationRole::Arrive => f.write_str("arrive"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("{role} station {key} not found")]
    StationNotFound { role: StationRole, key: String },
}

/// Bikes and docks for a trip between two stations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Availability {
    /// Bikes to borrow at the departure station.
    pub bikes_available: u32,
    /// Empty docks at the arrival station.
    pub docks_available: u32,
    /// The smaller of the two: trips that can actually be completed.
    pub actual_available: u32,
}

/// Compute availability from `depart` to `arrive`.
///
/// The departure is resolved first; if it is missing the arrival is not
/// looked up.
pub fn availability(
    table: &StationTable,
    depart: &str,
    arrive: &str,
    kind: KeyKind,
) -> Result<Availability, QueryError> {
    let departure = resolve(table, depart, kind, StationRole::Depart)?;
    let arrival = resolve(table, arrive, kind, StationRole::Arrive)?;

    Ok(Availability {
        bikes_available: departure.bikes_available,
        docks_available: arrival.docks_available,
        actual_available: departure.bikes_available.min(arrival.docks_available),
    })
}

fn resolve<'a>(
    table: &'a StationTable,
    key: &str,
    kind: KeyKind,
    role: StationRole,
) -> Result<&'a StationRecord, QueryError> {
    let record = match kind {
        KeyKind::Code => table.get(key),
        KeyKind::Name => table.code_for_name(key).and_then(|code| table.get(code)),
    };

    record.ok_or_else(|| QueryError::StationNotFound {
        role,
        key: key.to_string(),
    })
}

/// Every station whose name contains `fragment` (case-sensitive), as
/// name → code.
pub fn find_codes_by_name_substring(
    table: &StationTable,
    fragment: &str,
) -> BTreeMap<String, String> {
    table
        .names()
        .filter(|(name, _)| name.contains(fragment))
        .map(|(name, code)| (name.to_string(), code.to_string()))
        .collect()
}
