//! HTTP API handlers

pub mod health;
pub mod tropes;

pub use health::health_routes;
pub use tropes::trope_routes;
