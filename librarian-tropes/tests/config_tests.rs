//! Configuration loading and secret resolution tests
//!
//! Tests mutate process environment variables and run serially.

use librarian_tropes::config::{
    resolve_gemini_api_key, resolve_mcp_server_url, SourcesConfig, TropesConfig, CONFIG_ENV_VAR,
    GEMINI_API_KEY_ENV, MCP_SERVER_URL_ENV,
};
use librarian_tropes::types::SourceId;
use serial_test::serial;
use std::io::Write;

fn clear_env() {
    std::env::remove_var(CONFIG_ENV_VAR);
    std::env::remove_var(GEMINI_API_KEY_ENV);
    std::env::remove_var(MCP_SERVER_URL_ENV);
}

#[test]
#[serial]
fn test_env_overrides_toml_secret() {
    clear_env();
    std::env::set_var(GEMINI_API_KEY_ENV, "env-key");

    let sources = SourcesConfig {
        gemini_api_key: Some("toml-key".to_string()),
        ..SourcesConfig::default()
    };
    assert_eq!(resolve_gemini_api_key(&sources).as_deref(), Some("env-key"));

    clear_env();
}

#[test]
#[serial]
fn test_toml_secret_used_without_env() {
    clear_env();

    let sources = SourcesConfig {
        mcp_server_url: Some("http://records.local".to_string()),
        ..SourcesConfig::default()
    };
    assert_eq!(
        resolve_mcp_server_url(&sources).as_deref(),
        Some("http://records.local")
    );
}

#[test]
#[serial]
fn test_blank_secret_is_missing() {
    clear_env();
    std::env::set_var(MCP_SERVER_URL_ENV, "   ");

    assert_eq!(resolve_mcp_server_url(&SourcesConfig::default()), None);

    clear_env();
}

#[test]
#[serial]
fn test_load_from_env_path() {
    clear_env();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[server]\nport = 7001\n\n[sources]\ntimeout_ms = 2500").unwrap();
    std::env::set_var(CONFIG_ENV_VAR, file.path());

    let config = TropesConfig::load(None).unwrap();
    assert_eq!(config.server.port, 7001);
    assert_eq!(
        config.collector_config().timeout_for(SourceId::InternetSearch).as_millis(),
        2500
    );

    clear_env();
}

#[test]
#[serial]
fn test_cli_path_wins_over_env() {
    clear_env();

    let mut env_file = tempfile::NamedTempFile::new().unwrap();
    writeln!(env_file, "[server]\nport = 7001").unwrap();
    let mut cli_file = tempfile::NamedTempFile::new().unwrap();
    writeln!(cli_file, "[server]\nport = 7002").unwrap();
    std::env::set_var(CONFIG_ENV_VAR, env_file.path());

    let config = TropesConfig::load(Some(cli_file.path())).unwrap();
    assert_eq!(config.server.port, 7002);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_threshold_rejected_on_load() {
    clear_env();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[canonicalizer]\nsimilarity_threshold = 2.0").unwrap();

    assert!(TropesConfig::load(Some(file.path())).is_err());
}

#[tokio::test]
#[serial]
async fn test_sources_without_credentials_are_registered_unconfigured() {
    clear_env();

    let config = TropesConfig::default();
    let identifier = librarian_tropes::build_identifier(&config).unwrap();

    assert_eq!(
        identifier.source_ids(),
        vec![SourceId::LlmKnowledge, SourceId::InternetSearch, SourceId::Database]
    );
    assert!(identifier.configured_sources().is_empty());
}
