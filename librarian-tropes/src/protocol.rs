//! Request/response protocol
//!
//! Request: `{"title": string, "author": string, "top_n": integer?}`
//!
//! Response envelope:
//! - `{"status": "success", "tropes": [{"name", "confidence", "sources"}]}`
//! - `{"status": "error", "message": string}`
//!
//! Validation runs before any source is queried.

use crate::aggregator::round_score;
use crate::error::{TropeError, TropeResult};
use crate::types::{AggregatedTrope, SourceId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tropes returned when `top_n` is omitted
pub const DEFAULT_TOP_N: usize = 5;

/// Validated trope identification request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TropeRequest {
    pub title: String,
    pub author: String,
    pub top_n: usize,
}

impl TropeRequest {
    /// Build a request from already-typed values, applying the same rules as `from_json`
    pub fn new(title: &str, author: &str, top_n: Option<i64>) -> TropeResult<Self> {
        let title = required_text("title", Some(title))?;
        let author = required_text("author", Some(author))?;
        let top_n = match top_n {
            None => DEFAULT_TOP_N,
            Some(n) if n > 0 => n as usize,
            Some(_) => return Err(invalid_top_n()),
        };
        Ok(Self {
            title,
            author,
            top_n,
        })
    }

    /// Validate a raw JSON request body
    ///
    /// # Errors
    /// `TropeError::Validation` when the body is not an object, `title` or
    /// `author` is missing/empty/not a string, or `top_n` is present but not a
    /// positive integer.
    pub fn from_json(body: &Value) -> TropeResult<Self> {
        let object = body
            .as_object()
            .ok_or_else(|| TropeError::Validation("request body must be a JSON object".into()))?;

        let title = required_text("title", text_field(object.get("title"), "title")?)?;
        let author = required_text("author", text_field(object.get("author"), "author")?)?;

        let top_n = match object.get("top_n") {
            None | Some(Value::Null) => DEFAULT_TOP_N,
            Some(value) => match value.as_u64() {
                Some(n) if n > 0 => usize::try_from(n).map_err(|_| invalid_top_n())?,
                _ => return Err(invalid_top_n()),
            },
        };

        Ok(Self {
            title,
            author,
            top_n,
        })
    }
}

fn text_field<'a>(value: Option<&'a Value>, name: &str) -> TropeResult<Option<&'a str>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(TropeError::Validation(format!("'{}' must be a string", name))),
    }
}

fn required_text(name: &str, value: Option<&str>) -> TropeResult<String> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(TropeError::Validation(format!(
            "'{}' is required and must be non-empty",
            name
        ))),
    }
}

fn invalid_top_n() -> TropeError {
    TropeError::Validation("'top_n' must be a positive integer".into())
}

/// One rendered trope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TropeEntry {
    pub name: String,
    pub confidence: f64,
    /// Contributing sources in attribution order
    pub sources: Vec<SourceId>,
}

impl From<&AggregatedTrope> for TropeEntry {
    fn from(trope: &AggregatedTrope) -> Self {
        Self {
            name: trope.canonical_label.clone(),
            confidence: round_score(trope.final_score),
            // BTreeSet iteration is already sorted by SourceId order
            sources: trope.contributing_sources.iter().copied().collect(),
        }
    }
}

/// Response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TropeResponse {
    Success { tropes: Vec<TropeEntry> },
    Error { message: String },
}

impl TropeResponse {
    pub fn success(tropes: &[AggregatedTrope]) -> Self {
        TropeResponse::Success {
            tropes: tropes.iter().map(TropeEntry::from).collect(),
        }
    }

    /// Render an error using its stable display text
    pub fn from_error(err: &TropeError) -> Self {
        TropeResponse::Error {
            message: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TropeResponse::Success { .. })
    }
}
