// Aggregator - Weighted Multi-Source Scoring
//
// Per cluster:
//   weighted_sum = sum over sources of weight(source) * max confidence from that source
//   base         = weighted_sum / distinct sources
//   bonus        = min(cap, per_source * (distinct sources - 1))
//   final_score  = round(clamp(base + bonus, 0, 1), 3 decimals)
//
// Scores are stored at reported precision so ranking ties match what callers see.

use crate::canonicalizer::EvidenceCluster;
use crate::types::{AggregatedTrope, Confidence, SourceId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Weight of the language-model knowledge source
pub const LLM_KNOWLEDGE_WEIGHT: f64 = 1.0;
/// Weight of the search-grounded source
pub const INTERNET_SEARCH_WEIGHT: f64 = 0.8;
/// Weight of the structured-record source (verified data)
pub const DATABASE_WEIGHT: f64 = 1.2;

/// Bonus per additional confirming source
pub const BONUS_PER_EXTRA_SOURCE: f64 = 0.1;
/// Maximum confirmation bonus
pub const MAX_CONFIRMATION_BONUS: f64 = 0.2;

/// Decimal places kept in final scores
pub const SCORE_DECIMALS: i32 = 3;

/// Clamp to 0.0-1.0 and round to `SCORE_DECIMALS` places
pub fn round_score(score: f64) -> f64 {
    let factor = 10f64.powi(SCORE_DECIMALS);
    (score.clamp(0.0, 1.0) * factor).round() / factor
}

/// Fixed per-source reliability weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceWeights {
    pub llm_knowledge: f64,
    pub internet_search: f64,
    pub database: f64,
}

impl Default for SourceWeights {
    fn default() -> Self {
        Self {
            llm_knowledge: LLM_KNOWLEDGE_WEIGHT,
            internet_search: INTERNET_SEARCH_WEIGHT,
            database: DATABASE_WEIGHT,
        }
    }
}

impl SourceWeights {
    pub fn weight(&self, source: SourceId) -> f64 {
        match source {
            SourceId::LlmKnowledge => self.llm_knowledge,
            SourceId::InternetSearch => self.internet_search,
            SourceId::Database => self.database,
        }
    }
}

/// Multi-source confirmation bonus policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BonusPolicy {
    pub per_extra_source: f64,
    pub cap: f64,
}

impl Default for BonusPolicy {
    fn default() -> Self {
        Self {
            per_extra_source: BONUS_PER_EXTRA_SOURCE,
            cap: MAX_CONFIRMATION_BONUS,
        }
    }
}

impl BonusPolicy {
    /// Bonus for a cluster confirmed by `source_count` distinct sources
    pub fn bonus(&self, source_count: usize) -> f64 {
        let extra = source_count.saturating_sub(1) as f64;
        (self.per_extra_source * extra).min(self.cap)
    }
}

/// Cluster scorer
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    weights: SourceWeights,
    bonus: BonusPolicy,
}

impl Aggregator {
    pub fn new(weights: SourceWeights, bonus: BonusPolicy) -> Self {
        Self { weights, bonus }
    }

    /// Score every non-empty cluster
    pub fn aggregate(&self, clusters: &[EvidenceCluster]) -> Vec<AggregatedTrope> {
        clusters
            .iter()
            .filter_map(|cluster| self.score_cluster(cluster))
            .collect()
    }

    /// Score one cluster; `None` for a cluster without evidence
    pub fn score_cluster(&self, cluster: &EvidenceCluster) -> Option<AggregatedTrope> {
        // Same-source duplicates count once, at their highest confidence
        let mut per_source: BTreeMap<SourceId, Confidence> = BTreeMap::new();
        for item in &cluster.items {
            per_source
                .entry(item.source_id)
                .and_modify(|c| *c = c.max(item.confidence))
                .or_insert(item.confidence);
        }

        if per_source.is_empty() {
            return None;
        }

        let source_count = per_source.len();
        let weighted_sum: f64 = per_source
            .iter()
            .map(|(source, confidence)| self.weights.weight(*source) * confidence)
            .sum();
        let base = weighted_sum / source_count as f64;
        let bonus = self.bonus.bonus(source_count);
        let final_score = round_score(base + bonus);

        debug!(
            trope = %cluster.canonical_label,
            sources = source_count,
            base = base,
            bonus = bonus,
            final_score = final_score,
            "Cluster scored"
        );

        let contributing_sources: BTreeSet<SourceId> = per_source.keys().copied().collect();

        Some(AggregatedTrope {
            canonical_label: cluster.canonical_label.clone(),
            per_source_confidence: per_source,
            contributing_sources,
            final_score,
        })
    }
}
