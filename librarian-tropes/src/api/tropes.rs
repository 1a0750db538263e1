//! Trope identification endpoint
//!
//! POST /tropes with `{"title", "author", "top_n"?}`. Always answers with the
//! JSON envelope; the HTTP status reflects the failure class.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::error::TropeError;
use crate::protocol::TropeResponse;
use crate::AppState;

/// POST /tropes
///
/// A client disconnect drops this future, which aborts in-flight source queries.
pub async fn identify_tropes(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("trope_request", request_id = %request_id);

    async move {
        let Some(Json(body)) = body else {
            return TropeError::Validation("request body must be a JSON object".into())
                .into_response();
        };

        match state
            .identifier
            .handle_json(&body, &CancellationToken::new())
            .await
        {
            Ok(tropes) => (StatusCode::OK, Json(TropeResponse::success(&tropes))).into_response(),
            Err(e) => {
                if !matches!(e, TropeError::Validation(_)) {
                    *state.last_error.write().await = Some(e.to_string());
                }
                e.into_response()
            }
        }
    }
    .instrument(span)
    .await
}

/// Build trope routes
pub fn trope_routes() -> Router<AppState> {
    Router::new().route("/tropes", post(identify_tropes))
}
