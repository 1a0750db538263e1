// Internet Search Source
//
// Search-grounded Gemini call: the model answers from reviews, analyses and
// discussions it finds online rather than from training data alone.

use crate::sources::{parse_trope_payload, GeminiClient, SourceError, TropeSource};
use crate::types::{SourceId, TropeMention};
use crate::vocabulary;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_SEARCH_MODEL: &str = "gemini-2.0-flash-exp";

pub struct InternetSearchSource {
    gemini: Arc<GeminiClient>,
    model: String,
}

impl InternetSearchSource {
    pub fn new(gemini: Arc<GeminiClient>, model: impl Into<String>) -> Self {
        Self {
            gemini,
            model: model.into(),
        }
    }
}

pub fn build_prompt(title: &str, author: &str) -> String {
    format!(
        r#"Search the internet and analyze information about "{title}" by {author}.
Based on reviews, analyses, and discussions found online, identify the major literary tropes present.

Return ONLY a raw JSON object:
{{
    "tropes": [
        {{
            "name": "trope name",
            "confidence": 0.0-1.0
        }}
    ]
}}

Use these canonical trope names when possible:
{list}"#,
        title = title,
        author = author,
        list = vocabulary::prompt_list()
    )
}

#[async_trait]
impl TropeSource for InternetSearchSource {
    fn source_id(&self) -> SourceId {
        SourceId::InternetSearch
    }

    async fn query(&self, title: &str, author: &str) -> Result<Vec<TropeMention>, SourceError> {
        let text = self
            .gemini
            .generate(&self.model, &build_prompt(title, author), true)
            .await?;
        let mentions = parse_trope_payload(&text, None)?;
        debug!(count = mentions.len(), "Search-grounded mentions parsed");
        Ok(mentions)
    }

    fn is_configured(&self) -> bool {
        self.gemini.is_configured()
    }
}
