//! Error types for librarian-tropes
//!
//! Request-level failures. Per-source failures (`SourceError`) are recovered
//! by the collector and only surface here once every source has failed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::protocol::TropeResponse;
use crate::types::SourceId;

/// Trope identification error
#[derive(Debug, Error)]
pub enum TropeError {
    /// Malformed request (400); raised before any source is queried
    #[error("Invalid request: {0}")]
    Validation(String),

    /// A single source timed out or errored
    #[error("Source {source_id} unavailable: {reason}")]
    SourceUnavailable { source_id: SourceId, reason: String },

    /// Every source failed (502)
    #[error("No trope sources are currently available ({})", join_sources(.failed))]
    AllSourcesFailed { failed: Vec<SourceId> },

    /// Caller cancelled the request
    #[error("Request was cancelled")]
    Cancelled,

    /// Caller deadline expired before evidence collection finished (504)
    #[error("Request deadline exceeded")]
    DeadlineExceeded,
}

fn join_sources(sources: &[SourceId]) -> String {
    sources
        .iter()
        .map(SourceId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl TropeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TropeError::Validation(_) => StatusCode::BAD_REQUEST,
            TropeError::SourceUnavailable { .. } | TropeError::AllSourcesFailed { .. } => {
                StatusCode::BAD_GATEWAY
            }
            TropeError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            TropeError::Cancelled => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TropeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(TropeResponse::from_error(&self));
        (status, body).into_response()
    }
}

/// Result type for trope operations
pub type TropeResult<T> = Result<T, TropeError>;
