//! Evidence Collector
//!
//! Fans out one query per source, concurrently, each bounded by its own
//! timeout. Partial failure is tolerated: the request only fails when every
//! source fails.
//!
//! # Cancellation
//! Source queries run as spawned tasks owned by the collect future. Cancelling
//! the token, or dropping the future (caller deadline, client disconnect),
//! aborts whatever is still pending. Nothing collected so far is returned.

use crate::error::{TropeError, TropeResult};
use crate::sources::{SourceError, TropeSource};
use crate::types::{EvidenceItem, SourceId, TropeMention};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default per-source timeout
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(10);

/// Collector configuration
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Timeout for sources without an override
    pub default_timeout: Duration,
    /// Per-source timeout overrides
    pub source_timeouts: HashMap<SourceId, Duration>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_SOURCE_TIMEOUT,
            source_timeouts: HashMap::new(),
        }
    }
}

impl CollectorConfig {
    pub fn timeout_for(&self, source_id: SourceId) -> Duration {
        self.source_timeouts
            .get(&source_id)
            .copied()
            .unwrap_or(self.default_timeout)
    }
}

/// Evidence from one source that answered in time
#[derive(Debug, Clone)]
pub struct SourceEvidence {
    pub source_id: SourceId,
    pub items: Vec<EvidenceItem>,
    pub elapsed: Duration,
}

/// Outcome of a fan-out with at least one successful source
///
/// `responded` follows source registration order, not completion order.
#[derive(Debug)]
pub struct CollectedEvidence {
    pub responded: Vec<SourceEvidence>,
    /// `TropeError::SourceUnavailable` per failed source
    pub failures: Vec<TropeError>,
}

impl CollectedEvidence {
    pub fn failed_sources(&self) -> Vec<SourceId> {
        self.failures
            .iter()
            .filter_map(|f| match f {
                TropeError::SourceUnavailable { source_id, .. } => Some(*source_id),
                _ => None,
            })
            .collect()
    }

    /// All evidence items, in source order then mention order
    pub fn items(&self) -> impl Iterator<Item = &EvidenceItem> {
        self.responded.iter().flat_map(|s| s.items.iter())
    }
}

/// Aborts the wrapped task when dropped
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

type QueryOutcome = (Result<Vec<TropeMention>, SourceError>, Duration);

pub struct EvidenceCollector {
    sources: Vec<Arc<dyn TropeSource>>,
    config: CollectorConfig,
}

impl EvidenceCollector {
    pub fn new(sources: Vec<Arc<dyn TropeSource>>, config: CollectorConfig) -> Self {
        Self { sources, config }
    }

    pub fn source_ids(&self) -> Vec<SourceId> {
        self.sources.iter().map(|s| s.source_id()).collect()
    }

    pub fn sources(&self) -> &[Arc<dyn TropeSource>] {
        &self.sources
    }

    /// Query every source concurrently
    ///
    /// # Errors
    /// * `AllSourcesFailed` - no source answered successfully in time
    /// * `Cancelled` - the token fired before all sources settled
    pub async fn collect(
        &self,
        title: &str,
        author: &str,
        cancel: &CancellationToken,
    ) -> TropeResult<CollectedEvidence> {
        let source_ids = self.source_ids();
        debug!(sources = source_ids.len(), "Fanning out evidence queries");

        let mut tasks: Vec<AbortOnDrop<QueryOutcome>> = self
            .sources
            .iter()
            .map(|source| {
                let source = Arc::clone(source);
                let timeout = self.config.timeout_for(source.source_id());
                let title = title.to_string();
                let author = author.to_string();

                AbortOnDrop(tokio::spawn(async move {
                    let started = Instant::now();
                    let result = match tokio::time::timeout(timeout, source.query(&title, &author)).await {
                        Ok(result) => result,
                        Err(_) => Err(SourceError::Timeout(timeout.as_millis() as u64)),
                    };
                    (result, started.elapsed())
                }))
            })
            .collect();

        let outcomes = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Evidence collection cancelled, abandoning pending sources");
                return Err(TropeError::Cancelled);
            }
            outcomes = join_all(tasks.iter_mut().map(|task| &mut task.0)) => outcomes,
        };

        let mut responded = Vec::new();
        let mut failures = Vec::new();

        for (source_id, outcome) in source_ids.into_iter().zip(outcomes) {
            match outcome {
                Ok((Ok(mentions), elapsed)) => {
                    let items = to_evidence(source_id, mentions);
                    debug!(
                        source = %source_id,
                        items = items.len(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Source responded"
                    );
                    responded.push(SourceEvidence {
                        source_id,
                        items,
                        elapsed,
                    });
                }
                Ok((Err(e), elapsed)) => {
                    let failure = TropeError::SourceUnavailable {
                        source_id,
                        reason: e.to_string(),
                    };
                    warn!(elapsed_ms = elapsed.as_millis() as u64, "{}", failure);
                    failures.push(failure);
                }
                Err(join_error) => {
                    let failure = TropeError::SourceUnavailable {
                        source_id,
                        reason: format!("query task failed: {}", join_error),
                    };
                    warn!("{}", failure);
                    failures.push(failure);
                }
            }
        }

        let collected = CollectedEvidence {
            responded,
            failures,
        };

        if collected.responded.is_empty() {
            return Err(TropeError::AllSourcesFailed {
                failed: collected.failed_sources(),
            });
        }

        info!(
            responded = collected.responded.len(),
            failed = collected.failures.len(),
            "Evidence collection complete"
        );

        Ok(collected)
    }
}

/// Attribute mentions to a source, dropping unusable ones
fn to_evidence(source_id: SourceId, mentions: Vec<TropeMention>) -> Vec<EvidenceItem> {
    mentions
        .into_iter()
        .filter_map(|mention| {
            let label = mention.label.clone();
            let item = EvidenceItem::from_mention(source_id, mention);
            if item.is_none() {
                warn!(source = %source_id, label = %label, "Dropping unusable trope mention");
            }
            item
        })
        .collect()
}
