//! Core Types for Trope Identification
//!
//! Data model shared by the pipeline stages:
//! - **Sources:** `SourceId`, `TropeMention` (raw adapter output)
//! - **Evidence:** `EvidenceItem` (one attributed mention)
//! - **Result:** `AggregatedTrope` (scored canonical trope)

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Confidence score (0.0-1.0)
pub type Confidence = f64;

// ============================================================================
// Sources
// ============================================================================

/// Identity of an evidence source
///
/// Declaration order is the canonical attribution order used when listing
/// contributing sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// Language-model knowledge
    LlmKnowledge,
    /// Search-grounded language model
    InternetSearch,
    /// Structured trope records (MCP server)
    Database,
}

impl SourceId {
    /// All sources in canonical order
    pub const ALL: [SourceId; 3] = [
        SourceId::LlmKnowledge,
        SourceId::InternetSearch,
        SourceId::Database,
    ];

    /// Wire identifier (e.g. "llm_knowledge")
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::LlmKnowledge => "llm_knowledge",
            SourceId::InternetSearch => "internet_search",
            SourceId::Database => "database",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw trope mention as returned by a source adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TropeMention {
    pub label: String,
    pub confidence: Confidence,
}

impl TropeMention {
    pub fn new(label: impl Into<String>, confidence: Confidence) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

// ============================================================================
// Evidence
// ============================================================================

/// One attributed trope mention
///
/// Confidence is clamped to 0.0-1.0 on construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceItem {
    pub source_id: SourceId,
    pub raw_label: String,
    pub confidence: Confidence,
}

impl EvidenceItem {
    pub fn new(source_id: SourceId, raw_label: impl Into<String>, confidence: Confidence) -> Self {
        Self {
            source_id,
            raw_label: raw_label.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Convert an adapter mention, rejecting non-finite confidence and labels
    /// with no alphanumeric content (they normalize to nothing)
    pub fn from_mention(source_id: SourceId, mention: TropeMention) -> Option<Self> {
        let label = mention.label.trim();
        if !label.chars().any(char::is_alphanumeric) || !mention.confidence.is_finite() {
            return None;
        }
        Some(Self::new(source_id, label, mention.confidence))
    }
}

// ============================================================================
// Aggregation Result
// ============================================================================

/// Scored canonical trope with full source attribution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedTrope {
    pub canonical_label: String,
    /// Max confidence contributed by each source
    pub per_source_confidence: BTreeMap<SourceId, Confidence>,
    pub contributing_sources: BTreeSet<SourceId>,
    /// Clamped to 0.0-1.0
    pub final_score: Confidence,
}

impl AggregatedTrope {
    pub fn source_count(&self) -> usize {
        self.contributing_sources.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_wire_names() {
        assert_eq!(SourceId::LlmKnowledge.as_str(), "llm_knowledge");
        assert_eq!(SourceId::InternetSearch.to_string(), "internet_search");
        assert_eq!(
            serde_json::to_string(&SourceId::Database).unwrap(),
            "\"database\""
        );
    }

    #[test]
    fn test_source_order_is_attribution_order() {
        let mut sources = vec![SourceId::Database, SourceId::LlmKnowledge, SourceId::InternetSearch];
        sources.sort();
        assert_eq!(sources, SourceId::ALL.to_vec());
    }

    #[test]
    fn test_evidence_confidence_clamped() {
        assert_eq!(EvidenceItem::new(SourceId::Database, "X", 1.7).confidence, 1.0);
        assert_eq!(EvidenceItem::new(SourceId::Database, "X", -0.2).confidence, 0.0);
    }

    #[test]
    fn test_from_mention_rejects_bad_items() {
        assert!(EvidenceItem::from_mention(SourceId::LlmKnowledge, TropeMention::new("  ", 0.5)).is_none());
        assert!(EvidenceItem::from_mention(SourceId::LlmKnowledge, TropeMention::new("Heist", f64::NAN)).is_none());
        assert!(EvidenceItem::from_mention(SourceId::LlmKnowledge, TropeMention::new("???", 0.9)).is_none());
        assert!(EvidenceItem::from_mention(SourceId::LlmKnowledge, TropeMention::new("\u{2014}", 0.9)).is_none());

        let item = EvidenceItem::from_mention(SourceId::LlmKnowledge, TropeMention::new(" Heist ", 0.4)).unwrap();
        assert_eq!(item.raw_label, "Heist");
    }
}
