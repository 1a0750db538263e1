//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::types::SourceId;
use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok" when every source is configured, otherwise "degraded"
    pub status: String,
    /// Module name ("librarian-tropes")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Sources with the credentials they need
    pub configured_sources: Vec<SourceId>,
    /// Last request failure, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let configured_sources = state.identifier.configured_sources();
    let status = if configured_sources.len() == state.identifier.source_ids().len() {
        "ok"
    } else {
        "degraded"
    };

    let last_error = state.last_error.read().await.clone();

    Json(HealthResponse {
        status: status.to_string(),
        module: "librarian-tropes".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        configured_sources,
        last_error,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
