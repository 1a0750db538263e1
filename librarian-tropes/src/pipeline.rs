//! Trope identification pipeline
//!
//! validate → collect (concurrent) → canonicalize → aggregate → rank → render
//!
//! Only collection is concurrent. The later stages are sequential and
//! deterministic for a given evidence set.

use crate::aggregator::Aggregator;
use crate::canonicalizer::Canonicalizer;
use crate::collector::EvidenceCollector;
use crate::error::{TropeError, TropeResult};
use crate::protocol::{TropeRequest, TropeResponse};
use crate::ranker;
use crate::types::{AggregatedTrope, SourceId};
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Default overall request deadline
pub const DEFAULT_REQUEST_DEADLINE: Duration = Duration::from_secs(30);

pub struct TropeIdentifier {
    collector: EvidenceCollector,
    canonicalizer: Canonicalizer,
    aggregator: Aggregator,
    request_deadline: Duration,
}

impl TropeIdentifier {
    pub fn new(collector: EvidenceCollector, canonicalizer: Canonicalizer, aggregator: Aggregator) -> Self {
        Self {
            collector,
            canonicalizer,
            aggregator,
            request_deadline: DEFAULT_REQUEST_DEADLINE,
        }
    }

    pub fn with_request_deadline(mut self, deadline: Duration) -> Self {
        self.request_deadline = deadline;
        self
    }

    pub fn request_deadline(&self) -> Duration {
        self.request_deadline
    }

    pub fn source_ids(&self) -> Vec<SourceId> {
        self.collector.source_ids()
    }

    /// Sources that have the credentials they need
    pub fn configured_sources(&self) -> Vec<SourceId> {
        self.collector
            .sources()
            .iter()
            .filter(|s| s.is_configured())
            .map(|s| s.source_id())
            .collect()
    }

    /// Run the full pipeline for a validated request
    ///
    /// # Errors
    /// * `AllSourcesFailed` - no source produced evidence
    /// * `DeadlineExceeded` - collection outlived the request deadline
    /// * `Cancelled` - `cancel` fired; nothing downstream of collection runs
    pub async fn identify(
        &self,
        request: &TropeRequest,
        cancel: &CancellationToken,
    ) -> TropeResult<Vec<AggregatedTrope>> {
        let started = Instant::now();
        info!(title = %request.title, author = %request.author, top_n = request.top_n, "Identifying tropes");

        // Dropping the collect future on deadline aborts its pending source tasks
        let collected = tokio::time::timeout(
            self.request_deadline,
            self.collector.collect(&request.title, &request.author, cancel),
        )
        .await
        .map_err(|_| TropeError::DeadlineExceeded)??;

        if cancel.is_cancelled() {
            return Err(TropeError::Cancelled);
        }

        let clusters = self.canonicalizer.canonicalize(collected.items().cloned());
        let aggregated = self.aggregator.aggregate(&clusters);
        let distinct = aggregated.len();
        let ranked = ranker::rank(aggregated, request.top_n);

        info!(
            clusters = distinct,
            returned = ranked.len(),
            missing_sources = collected.failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Trope identification complete"
        );

        Ok(ranked)
    }

    /// Validate and run a raw JSON request, always producing an envelope
    pub async fn handle(&self, body: &Value, cancel: &CancellationToken) -> TropeResponse {
        match self.handle_json(body, cancel).await {
            Ok(tropes) => TropeResponse::success(&tropes),
            Err(e) => TropeResponse::from_error(&e),
        }
    }

    /// Validate and run a raw JSON request
    pub async fn handle_json(
        &self,
        body: &Value,
        cancel: &CancellationToken,
    ) -> TropeResult<Vec<AggregatedTrope>> {
        let request = TropeRequest::from_json(body)?;
        self.identify(&request, cancel).await.map_err(|e| {
            error!("Trope request failed: {}", e);
            e
        })
    }
}
