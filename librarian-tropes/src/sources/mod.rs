// Evidence Sources - Uniform Adapter Interface
//
// Three adapters: LLM knowledge (Gemini), internet search (search-grounded
// Gemini), structured trope records (MCP server). Each returns raw mentions;
// the collector attributes, bounds and merges them.

use crate::types::{Confidence, SourceId, TropeMention};
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub mod database;
pub mod gemini;
pub mod internet_search;
pub mod llm_knowledge;

pub use database::DatabaseSource;
pub use gemini::GeminiClient;
pub use internet_search::InternetSearchSource;
pub use llm_knowledge::LlmKnowledgeSource;

/// Source adapter trait - all evidence sources implement this
#[async_trait]
pub trait TropeSource: Send + Sync {
    /// Source identifier for attribution
    fn source_id(&self) -> SourceId;

    /// Query the source for tropes in a book
    ///
    /// # Returns
    /// * `Ok(mentions)` - Raw trope mentions (possibly empty)
    /// * `Err(_)` - Source failed; the collector records it and carries on
    async fn query(&self, title: &str, author: &str) -> Result<Vec<TropeMention>, SourceError>;

    /// Check if the source has the credentials/endpoints it needs
    fn is_configured(&self) -> bool {
        true
    }
}

/// Source adapter error
#[derive(Debug, Error)]
pub enum SourceError {
    /// Source exceeded its deadline (raised by the collector)
    #[error("timed out after {0} ms")]
    Timeout(u64),

    /// Network or client failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status from the upstream service
    #[error("upstream returned HTTP {status}")]
    Http { status: u16 },

    /// Response body could not be interpreted
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Missing credentials or endpoint
    #[error("not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            SourceError::Http {
                status: status.as_u16(),
            }
        } else {
            SourceError::Transport(err.to_string())
        }
    }
}

/// `{"tropes": [{"name": ..., "confidence": ...}]}` payload shared by all sources
#[derive(Debug, Deserialize)]
struct TropePayload {
    #[serde(default)]
    tropes: Vec<RawTrope>,
}

#[derive(Debug, Deserialize)]
struct RawTrope {
    name: String,
    #[serde(default)]
    confidence: Option<Confidence>,
}

/// Remove a surrounding Markdown code fence (```json ... ```), if any
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.trim_start_matches("json"),
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// Parse a trope payload into mentions
///
/// `default_confidence` applies to entries without a confidence; with `None`
/// such entries make the whole payload malformed.
pub fn parse_trope_payload(
    text: &str,
    default_confidence: Option<Confidence>,
) -> Result<Vec<TropeMention>, SourceError> {
    let payload: TropePayload = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| SourceError::MalformedPayload(e.to_string()))?;

    payload
        .tropes
        .into_iter()
        .map(|raw| {
            let confidence = raw.confidence.or(default_confidence).ok_or_else(|| {
                SourceError::MalformedPayload(format!("trope '{}' has no confidence", raw.name))
            })?;
            Ok(TropeMention::new(raw.name, confidence))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"tropes\": []}\n```"), "{\"tropes\": []}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_payload_in_fence() {
        let text = "```json\n{\"tropes\": [{\"name\": \"Test Trope\", \"confidence\": 0.8, \"description\": \"x\"}]}\n```";
        let mentions = parse_trope_payload(text, None).unwrap();
        assert_eq!(mentions, vec![TropeMention::new("Test Trope", 0.8)]);
    }

    #[test]
    fn test_parse_payload_default_confidence() {
        let mentions = parse_trope_payload(r#"{"tropes": [{"name": "Heist"}]}"#, Some(0.7)).unwrap();
        assert_eq!(mentions[0].confidence, 0.7);
    }

    #[test]
    fn test_parse_payload_missing_confidence_without_default() {
        let result = parse_trope_payload(r#"{"tropes": [{"name": "Heist"}]}"#, None);
        assert!(matches!(result, Err(SourceError::MalformedPayload(_))));
    }

    #[test]
    fn test_parse_payload_not_json() {
        let result = parse_trope_payload("I think the tropes are...", None);
        assert!(matches!(result, Err(SourceError::MalformedPayload(_))));
    }

    #[test]
    fn test_parse_payload_without_tropes_key() {
        assert!(parse_trope_payload("{}", None).unwrap().is_empty());
    }
}
