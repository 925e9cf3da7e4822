//! YouBike availability tracker.
//!
//! Keeps an in-memory index of bike-share stations for two systems,
//! refreshed from the public JSON feeds, and answers "can I borrow here
//! and park there?" queries against it.

pub mod config;
pub mod query;
pub mod stations;
pub mod sync;
pub mod web;
