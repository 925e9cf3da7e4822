//! Application state for the web layer.

use std::sync::Arc;

use crate::stations::BikeSystems;
use crate::sync::RefreshPolicy;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
pub struct AppState<F> {
    /// Bike systems and their station indexes
    pub systems: Arc<BikeSystems>,

    /// Demand-driven refresh ahead of queries
    pub refresh: Arc<RefreshPolicy<F>>,
}

impl<F> AppState<F> {
    /// Create a new app state.
    pub fn new(systems: Arc<BikeSystems>, refresh: RefreshPolicy<F>) -> Self {
        Self {
            systems,
            refresh: Arc::new(refresh),
        }
    }
}

// Manual impl: `F` itself need not be `Clone`.
impl<F> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            systems: self.systems.clone(),
            refresh: self.refresh.clone(),
        }
    }
}
