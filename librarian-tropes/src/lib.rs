//! librarian-tropes library interface
//!
//! Identifies literary tropes in a book by merging evidence from three
//! independent sources. Exposes the pipeline and HTTP router for the binary
//! and for integration testing.

pub mod aggregator;
pub mod api;
pub mod canonicalizer;
pub mod collector;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod protocol;
pub mod ranker;
pub mod sources;
pub mod types;
pub mod vocabulary;

pub use crate::error::{TropeError, TropeResult};
pub use crate::pipeline::TropeIdentifier;

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::aggregator::Aggregator;
use crate::canonicalizer::Canonicalizer;
use crate::collector::EvidenceCollector;
use crate::config::TropesConfig;
use crate::sources::SourceError;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub identifier: Arc<TropeIdentifier>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last request failure for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(identifier: Arc<TropeIdentifier>) -> Self {
        Self {
            identifier,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Assemble the pipeline from configuration
pub fn build_identifier(config: &TropesConfig) -> Result<TropeIdentifier, SourceError> {
    let collector = EvidenceCollector::new(config.build_sources()?, config.collector_config());
    let canonicalizer = Canonicalizer::new(config.canonicalizer_config());

    Ok(TropeIdentifier::new(collector, canonicalizer, Aggregator::default())
        .with_request_deadline(config.request_deadline()))
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::trope_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
