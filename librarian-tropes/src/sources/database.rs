// Structured Record Source
//
// Queries the trope database through its MCP server:
// POST {url}/query {"title", "author", "query_type": "tropes"}
// Records are pre-vetted; entries without a confidence default to 0.7.

use crate::sources::{parse_trope_payload, SourceError, TropeSource};
use crate::types::{Confidence, SourceId, TropeMention};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_RECORD_CONFIDENCE: Confidence = 0.7;

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    title: &'a str,
    author: &'a str,
    query_type: &'static str,
}

pub struct DatabaseSource {
    client: reqwest::Client,
    server_url: Option<String>,
}

impl DatabaseSource {
    /// Create a source; a missing URL yields a source whose queries fail with `NotConfigured`
    pub fn new(server_url: Option<String>) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("agentic-librarian/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SourceError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            server_url: server_url
                .filter(|u| !u.trim().is_empty())
                .map(|u| u.trim_end_matches('/').to_string()),
        })
    }
}

#[async_trait]
impl TropeSource for DatabaseSource {
    fn source_id(&self) -> SourceId {
        SourceId::Database
    }

    async fn query(&self, title: &str, author: &str) -> Result<Vec<TropeMention>, SourceError> {
        let base = self
            .server_url
            .as_deref()
            .ok_or_else(|| SourceError::NotConfigured("MCP_SERVER_URL not set".to_string()))?;

        let url = format!("{}/query", base);
        debug!(url = %url, "Querying trope records");

        let response = self
            .client
            .post(&url)
            .json(&QueryRequest {
                title,
                author,
                query_type: "tropes",
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Http {
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        parse_trope_payload(&body, Some(DEFAULT_RECORD_CONFIDENCE))
    }

    fn is_configured(&self) -> bool {
        self.server_url.is_some()
    }
}
