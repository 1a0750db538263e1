//! Tests for config file discovery and graceful degradation
//!
//! Tests that manipulate LIBRARIAN_TEST_CONFIG are marked #[serial] so env
//! mutation does not race.

use librarian_common::config::{load_toml_or_default, resolve_config_path, LoggingConfig, ServerConfig};
use librarian_common::Error;
use serde::Deserialize;
use serial_test::serial;
use std::env;
use std::path::Path;

#[derive(Debug, Deserialize, Default, PartialEq)]
struct TestConfig {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

#[test]
#[serial]
fn test_cli_argument_wins_over_env() {
    env::set_var("LIBRARIAN_TEST_CONFIG", "/tmp/from-env.toml");

    let resolved = resolve_config_path(
        Some(Path::new("/tmp/from-cli.toml")),
        "LIBRARIAN_TEST_CONFIG",
        "test.toml",
    );
    assert_eq!(resolved.as_deref(), Some(Path::new("/tmp/from-cli.toml")));

    env::remove_var("LIBRARIAN_TEST_CONFIG");
}

#[test]
#[serial]
fn test_env_var_used_without_cli_argument() {
    env::set_var("LIBRARIAN_TEST_CONFIG", "/tmp/from-env.toml");

    let resolved = resolve_config_path(None, "LIBRARIAN_TEST_CONFIG", "test.toml");
    assert_eq!(resolved.as_deref(), Some(Path::new("/tmp/from-env.toml")));

    env::remove_var("LIBRARIAN_TEST_CONFIG");
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let config: TestConfig = load_toml_or_default(Some(&path)).unwrap();
    assert_eq!(config, TestConfig::default());
}

#[test]
fn test_no_path_falls_back_to_defaults() {
    let config: TestConfig = load_toml_or_default(None).unwrap();
    assert_eq!(config.server.port, 5810);
}

#[test]
fn test_file_values_are_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tropes.toml");
    std::fs::write(&path, "[server]\nhost = \"0.0.0.0\"\nport = 6000\n\n[logging]\nlevel = \"debug\"\n").unwrap();

    let config: TestConfig = load_toml_or_default(Some(&path)).unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 6000);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_malformed_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[server\nport = ").unwrap();

    let result: Result<TestConfig, Error> = load_toml_or_default(Some(&path));
    assert!(matches!(result, Err(Error::Config(_))));
}
