// Gemini API Client
//
// Shared by the LLM knowledge and internet search sources.
// generateContent over REST; optional Google Search grounding tool.

use crate::sources::SourceError;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::debug;

pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    rate_limiter: DefaultDirectRateLimiter,
}

impl GeminiClient {
    /// Create a client; a missing key yields a client whose calls fail with `NotConfigured`
    pub fn new(api_key: Option<String>, requests_per_second: u32) -> Result<Self, SourceError> {
        Self::with_base_url(api_key, GEMINI_API_URL, requests_per_second)
    }

    pub fn with_base_url(
        api_key: Option<String>,
        base_url: impl Into<String>,
        requests_per_second: u32,
    ) -> Result<Self, SourceError> {
        let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));

        let client = reqwest::Client::builder()
            .user_agent(concat!("agentic-librarian/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| SourceError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            rate_limiter: RateLimiter::direct(quota),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate text for a prompt
    ///
    /// # Arguments
    /// * `model` - Gemini model name (e.g. "gemini-2.5-flash-lite")
    /// * `prompt` - Prompt text
    /// * `search_grounding` - Attach the Google Search tool
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        search_grounding: bool,
    ) -> Result<String, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SourceError::NotConfigured("GOOGLE_SEARCH_API_KEY not set".to_string()))?;

        self.rate_limiter.until_ready().await;

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            tools: if search_grounding {
                vec![Tool {
                    google_search: GoogleSearch {},
                }]
            } else {
                Vec::new()
            },
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        debug!(model = model, search_grounding, "Gemini generateContent");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Http {
                status: response.status().as_u16(),
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| SourceError::MalformedPayload(e.to_string()))?;

        extract_text(body)
    }
}

/// Concatenate the text parts of the first candidate
fn extract_text(body: GenerateResponse) -> Result<String, SourceError> {
    let text: String = body
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(SourceError::MalformedPayload(
            "response contained no text".to_string(),
        ));
    }
    Ok(text)
}
