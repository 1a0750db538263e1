//! Configuration resolution for librarian-tropes
//!
//! Provides multi-tier configuration resolution with CLI → ENV → TOML → default
//! priority. Secrets (Gemini API key, MCP server URL) resolve ENV → TOML.

use crate::canonicalizer::{CanonicalizerConfig, DEFAULT_QUALIFIER_WORDS, DEFAULT_SIMILARITY_THRESHOLD};
use crate::collector::CollectorConfig;
use crate::sources::internet_search::DEFAULT_SEARCH_MODEL;
use crate::sources::llm_knowledge::DEFAULT_LLM_MODEL;
use crate::sources::{
    DatabaseSource, GeminiClient, InternetSearchSource, LlmKnowledgeSource, SourceError, TropeSource,
};
use crate::types::SourceId;
use librarian_common::config::{load_toml_or_default, resolve_config_path, LoggingConfig, ServerConfig};
use librarian_common::{Error, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "LIBRARIAN_CONFIG";
/// Config file name under the config directory
pub const CONFIG_FILE_NAME: &str = "tropes.toml";
/// Gemini API key (LLM knowledge and internet search sources)
pub const GEMINI_API_KEY_ENV: &str = "GOOGLE_SEARCH_API_KEY";
/// Structured trope record server
pub const MCP_SERVER_URL_ENV: &str = "MCP_SERVER_URL";

/// Complete service configuration (`tropes.toml`)
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TropesConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub canonicalizer: CanonicalizerSection,
}

/// `[sources]` section
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SourcesConfig {
    /// Default per-source timeout
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Per-source overrides
    #[serde(default)]
    pub llm_knowledge_timeout_ms: Option<u64>,
    #[serde(default)]
    pub internet_search_timeout_ms: Option<u64>,
    #[serde(default)]
    pub database_timeout_ms: Option<u64>,

    /// Overall request deadline
    #[serde(default = "default_request_deadline_ms")]
    pub request_deadline_ms: u64,

    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    #[serde(default = "default_search_model")]
    pub search_model: String,

    /// Gemini request pacing shared by both Gemini-backed sources
    #[serde(default = "default_gemini_requests_per_second")]
    pub gemini_requests_per_second: u32,

    #[serde(default)]
    pub gemini_api_key: Option<String>,

    #[serde(default)]
    pub mcp_server_url: Option<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            llm_knowledge_timeout_ms: None,
            internet_search_timeout_ms: None,
            database_timeout_ms: None,
            request_deadline_ms: default_request_deadline_ms(),
            llm_model: default_llm_model(),
            search_model: default_search_model(),
            gemini_requests_per_second: default_gemini_requests_per_second(),
            gemini_api_key: None,
            mcp_server_url: None,
        }
    }
}

/// `[canonicalizer]` section
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CanonicalizerSection {
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    #[serde(default = "default_qualifier_words")]
    pub qualifier_words: Vec<String>,

    /// variant → canonical name, added to the built-in alias table
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl Default for CanonicalizerSection {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            qualifier_words: default_qualifier_words(),
            aliases: BTreeMap::new(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_request_deadline_ms() -> u64 {
    30_000
}

fn default_llm_model() -> String {
    DEFAULT_LLM_MODEL.to_string()
}

fn default_search_model() -> String {
    DEFAULT_SEARCH_MODEL.to_string()
}

fn default_gemini_requests_per_second() -> u32 {
    2
}

fn default_similarity_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}

fn default_qualifier_words() -> Vec<String> {
    DEFAULT_QUALIFIER_WORDS.iter().map(|w| w.to_string()).collect()
}

impl TropesConfig {
    /// Locate and load `tropes.toml`, then validate it
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = resolve_config_path(cli_path, CONFIG_ENV_VAR, CONFIG_FILE_NAME);
        let config: TropesConfig = load_toml_or_default(path.as_deref())?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let threshold = self.canonicalizer.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::Config(format!(
                "canonicalizer.similarity_threshold must be within 0.0-1.0 (got {})",
                threshold
            )));
        }
        if self.sources.timeout_ms == 0 || self.sources.request_deadline_ms == 0 {
            return Err(Error::Config(
                "sources.timeout_ms and sources.request_deadline_ms must be positive".to_string(),
            ));
        }
        let overrides = [
            ("llm_knowledge_timeout_ms", self.sources.llm_knowledge_timeout_ms),
            ("internet_search_timeout_ms", self.sources.internet_search_timeout_ms),
            ("database_timeout_ms", self.sources.database_timeout_ms),
        ];
        if let Some((name, _)) = overrides.iter().find(|(_, ms)| *ms == Some(0)) {
            return Err(Error::Config(format!("sources.{} must be positive", name)));
        }
        if self.sources.gemini_requests_per_second == 0 {
            return Err(Error::Config(
                "sources.gemini_requests_per_second must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn collector_config(&self) -> CollectorConfig {
        let overrides = [
            (SourceId::LlmKnowledge, self.sources.llm_knowledge_timeout_ms),
            (SourceId::InternetSearch, self.sources.internet_search_timeout_ms),
            (SourceId::Database, self.sources.database_timeout_ms),
        ];

        let source_timeouts: HashMap<SourceId, Duration> = overrides
            .into_iter()
            .filter_map(|(id, ms)| ms.map(|ms| (id, Duration::from_millis(ms))))
            .collect();

        CollectorConfig {
            default_timeout: Duration::from_millis(self.sources.timeout_ms),
            source_timeouts,
        }
    }

    pub fn canonicalizer_config(&self) -> CanonicalizerConfig {
        CanonicalizerConfig {
            similarity_threshold: self.canonicalizer.similarity_threshold,
            qualifier_words: self.canonicalizer.qualifier_words.clone(),
            extra_aliases: self
                .canonicalizer
                .aliases
                .iter()
                .map(|(variant, canonical)| (variant.clone(), canonical.clone()))
                .collect(),
        }
    }

    pub fn request_deadline(&self) -> Duration {
        Duration::from_millis(self.sources.request_deadline_ms)
    }

    /// Build the three source adapters
    ///
    /// Sources with missing credentials are still registered; their queries
    /// fail with `SourceError::NotConfigured`.
    pub fn build_sources(&self) -> std::result::Result<Vec<Arc<dyn TropeSource>>, SourceError> {
        let gemini_key = resolve_gemini_api_key(&self.sources);
        let mcp_url = resolve_mcp_server_url(&self.sources);

        let gemini = Arc::new(GeminiClient::new(
            gemini_key,
            self.sources.gemini_requests_per_second,
        )?);

        let sources: Vec<Arc<dyn TropeSource>> = vec![
            Arc::new(LlmKnowledgeSource::new(
                Arc::clone(&gemini),
                self.sources.llm_model.clone(),
            )),
            Arc::new(InternetSearchSource::new(
                gemini,
                self.sources.search_model.clone(),
            )),
            Arc::new(DatabaseSource::new(mcp_url)?),
        ];
        Ok(sources)
    }
}

/// Resolve the Gemini API key (ENV → TOML)
pub fn resolve_gemini_api_key(sources: &SourcesConfig) -> Option<String> {
    resolve_secret(
        "Gemini API key",
        GEMINI_API_KEY_ENV,
        sources.gemini_api_key.as_deref(),
    )
}

/// Resolve the MCP server URL (ENV → TOML)
pub fn resolve_mcp_server_url(sources: &SourcesConfig) -> Option<String> {
    resolve_secret(
        "MCP server URL",
        MCP_SERVER_URL_ENV,
        sources.mcp_server_url.as_deref(),
    )
}

fn resolve_secret(what: &str, env_var: &str, toml_value: Option<&str>) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|v| is_valid_key(v));
    let toml_value = toml_value.filter(|v| is_valid_key(v));

    // Warn if multiple sources (potential misconfiguration)
    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in both environment and TOML. Using environment (highest priority).",
            what
        );
    }

    if let Some(value) = env_value {
        info!("{} loaded from environment variable", what);
        return Some(value);
    }

    if let Some(value) = toml_value {
        info!("{} loaded from TOML config", what);
        return Some(value.to_string());
    }

    warn!(
        "{} not configured (set {} or add it to {}); dependent sources will be unavailable",
        what, env_var, CONFIG_FILE_NAME
    );
    None
}

/// Validate a credential (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// No config file located
    Defaults,
    /// A config file was named but does not exist
    Missing(PathBuf),
    File(PathBuf),
}

/// Resolve the config file the same way `TropesConfig::load` does
///
/// Used to report the configuration once logging is up.
pub fn config_origin(cli_path: Option<&Path>) -> ConfigOrigin {
    match resolve_config_path(cli_path, CONFIG_ENV_VAR, CONFIG_FILE_NAME) {
        None => ConfigOrigin::Defaults,
        Some(path) if path.exists() => ConfigOrigin::File(path),
        Some(path) => ConfigOrigin::Missing(path),
    }
}
