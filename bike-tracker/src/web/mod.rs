//! Web layer for the bike tracker.
//!
//! Provides HTTP endpoints for station lookup and trip availability.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
