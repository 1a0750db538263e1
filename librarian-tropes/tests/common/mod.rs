//! Shared test helpers: scripted evidence sources and pipeline builders

#![allow(dead_code)]

use async_trait::async_trait;
use librarian_tropes::aggregator::Aggregator;
use librarian_tropes::canonicalizer::Canonicalizer;
use librarian_tropes::collector::{CollectorConfig, EvidenceCollector};
use librarian_tropes::sources::{SourceError, TropeSource};
use librarian_tropes::types::{SourceId, TropeMention};
use librarian_tropes::TropeIdentifier;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Source returning a fixed answer after an optional delay
pub struct MockSource {
    id: SourceId,
    delay: Duration,
    mentions: Option<Vec<TropeMention>>,
    configured: bool,
    pub calls: AtomicUsize,
    pub finished: AtomicBool,
}

impl MockSource {
    pub fn ok(id: SourceId, mentions: &[(&str, f64)]) -> Arc<Self> {
        Arc::new(Self {
            id,
            delay: Duration::ZERO,
            mentions: Some(
                mentions
                    .iter()
                    .map(|(label, confidence)| TropeMention::new(*label, *confidence))
                    .collect(),
            ),
            configured: true,
            calls: AtomicUsize::new(0),
            finished: AtomicBool::new(false),
        })
    }

    pub fn failing(id: SourceId) -> Arc<Self> {
        Arc::new(Self {
            id,
            delay: Duration::ZERO,
            mentions: None,
            configured: true,
            calls: AtomicUsize::new(0),
            finished: AtomicBool::new(false),
        })
    }

    pub fn unconfigured(id: SourceId) -> Arc<Self> {
        Arc::new(Self {
            id,
            delay: Duration::ZERO,
            mentions: None,
            configured: false,
            calls: AtomicUsize::new(0),
            finished: AtomicBool::new(false),
        })
    }

    pub fn slow(id: SourceId, delay: Duration, mentions: &[(&str, f64)]) -> Arc<Self> {
        Arc::new(Self {
            id,
            delay,
            mentions: Some(
                mentions
                    .iter()
                    .map(|(label, confidence)| TropeMention::new(*label, *confidence))
                    .collect(),
            ),
            configured: true,
            calls: AtomicUsize::new(0),
            finished: AtomicBool::new(false),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn has_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TropeSource for MockSource {
    fn source_id(&self) -> SourceId {
        self.id
    }

    async fn query(&self, _title: &str, _author: &str) -> Result<Vec<TropeMention>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.finished.store(true, Ordering::SeqCst);

        if !self.configured {
            return Err(SourceError::NotConfigured("credentials missing".into()));
        }
        self.mentions
            .clone()
            .ok_or_else(|| SourceError::Transport("connection refused".into()))
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

/// Build a pipeline over the given sources
pub fn identifier(sources: Vec<Arc<MockSource>>, config: CollectorConfig) -> TropeIdentifier {
    let sources: Vec<Arc<dyn TropeSource>> = sources
        .into_iter()
        .map(|s| s as Arc<dyn TropeSource>)
        .collect();

    TropeIdentifier::new(
        EvidenceCollector::new(sources, config),
        Canonicalizer::default(),
        Aggregator::default(),
    )
}

/// The three sources from the Hero's Journey walkthrough
pub fn heros_journey_sources() -> Vec<Arc<MockSource>> {
    vec![
        MockSource::ok(SourceId::LlmKnowledge, &[("Hero's Journey", 0.9)]),
        MockSource::ok(SourceId::InternetSearch, &[("monomyth", 0.7)]),
        MockSource::ok(SourceId::Database, &[("Hero's Journey", 0.8)]),
    ]
}
