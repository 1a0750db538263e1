// LLM Knowledge Source
//
// Asks a Gemini model what it knows about the book's tropes.

use crate::sources::{parse_trope_payload, GeminiClient, SourceError, TropeSource};
use crate::types::{SourceId, TropeMention};
use crate::vocabulary;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_LLM_MODEL: &str = "gemini-2.5-flash-lite";

pub struct LlmKnowledgeSource {
    gemini: Arc<GeminiClient>,
    model: String,
}

impl LlmKnowledgeSource {
    pub fn new(gemini: Arc<GeminiClient>, model: impl Into<String>) -> Self {
        Self {
            gemini,
            model: model.into(),
        }
    }
}

/// Build the knowledge prompt
pub fn build_prompt(title: &str, author: &str) -> String {
    format!(
        r#"Analyze the book "{title}" by {author} and identify the major literary tropes present.
A trope is a common or recurring literary device, theme, motif, or cliche.

Return ONLY a raw JSON object with this structure:
{{
    "tropes": [
        {{
            "name": "trope name",
            "confidence": 0.0-1.0,
            "description": "brief description"
        }}
    ]
}}

Focus on these well-known tropes (use these exact names when possible):
{list}"#,
        title = title,
        author = author,
        list = vocabulary::prompt_list()
    )
}

#[async_trait]
impl TropeSource for LlmKnowledgeSource {
    fn source_id(&self) -> SourceId {
        SourceId::LlmKnowledge
    }

    async fn query(&self, title: &str, author: &str) -> Result<Vec<TropeMention>, SourceError> {
        let text = self
            .gemini
            .generate(&self.model, &build_prompt(title, author), false)
            .await?;
        let mentions = parse_trope_payload(&text, None)?;
        debug!(count = mentions.len(), "LLM knowledge mentions parsed");
        Ok(mentions)
    }

    fn is_configured(&self) -> bool {
        self.gemini.is_configured()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_book_and_vocabulary() {
        let prompt = build_prompt("The Way of Kings", "Brandon Sanderson");
        assert!(prompt.contains("\"The Way of Kings\" by Brandon Sanderson"));
        assert!(prompt.contains("- Psychological Horror"));
        assert!(prompt.contains("\"tropes\": ["));
    }
}
