//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::query::Availability;

/// Request to look up station codes by name fragment.
///
/// Fields are optional so that a missing parameter becomes a 400 with a
/// useful message instead of a rejection from the extractor.
#[derive(Debug, Default, Deserialize)]
pub struct StationCodeRequest {
    /// Bike system, `"1"` or `"2"`
    pub system: Option<String>,

    /// Substring of the station name
    pub name: Option<String>,
}

/// Request for availability between two stations.
#[derive(Debug, Default, Deserialize)]
pub struct TrackRequest {
    /// Bike system, `"1"` or `"2"`
    pub system: Option<String>,

    /// Departure station (code or name, depending on the route)
    pub depart: Option<String>,

    /// Arrival station (code or name, depending on the route)
    pub arrive: Option<String>,
}

/// Availability between two stations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackResponse {
    /// Bikes available at the departure station
    pub can_borrow: u32,

    /// Empty docks at the arrival station
    pub can_park: u32,

    /// Lesser of the two
    pub actual_available: u32,
}

/// Index state for one bike system.
#[derive(Debug, Serialize)]
pub struct SystemStatus {
    /// Query value of the system
    pub system: &'static str,

    /// Stations currently indexed
    pub stations: usize,

    /// Completion time of the last sync pass (RFC 3339)
    pub last_refreshed_at: Option<String>,
}

/// Response for the status endpoint.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub systems: Vec<SystemStatus>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

impl From<Availability> for TrackResponse {
    fn from(a: Availability) -> Self {
        Self {
            can_borrow: a.bikes_available,
            can_park: a.docks_available,
            actual_available: a.actual_available,
        }
    }
}
