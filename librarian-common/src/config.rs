//! Bootstrap configuration loading and config file discovery
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. User config directory (`<config_dir>/agentic-librarian/<file>`)
//! 4. System config (`/etc/agentic-librarian/<file>`, Linux only)
//!
//! A missing file is not an error: callers fall back to compiled defaults.
//! A file that exists but fails to parse is a configuration error.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Directory name used under the platform config directory
pub const CONFIG_DIR_NAME: &str = "agentic-librarian";

/// HTTP server bootstrap settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5810
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Locate a config file following the resolution priority above
///
/// Returns `None` when no candidate exists.
pub fn resolve_config_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    file_name: &str,
) -> Option<PathBuf> {
    // Priority 1: Command-line argument (returned even if missing so the caller can report it)
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: User config directory
    if let Some(user_config) = dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(file_name)) {
        if user_config.exists() {
            return Some(user_config);
        }
    }

    // Priority 4: System config
    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(CONFIG_DIR_NAME).join(file_name);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Parse a TOML document into `T`
pub fn parse_toml<T: DeserializeOwned>(content: &str) -> Result<T> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Load a TOML config file, falling back to `T::default()` when the file is absent
pub fn load_toml_or_default<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        info!("No config file found, using built-in defaults");
        return Ok(T::default());
    };

    if !path.exists() {
        warn!(
            "Config file {} not found, using built-in defaults",
            path.display()
        );
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    let config = parse_toml(&content)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let server = ServerConfig::default();
        assert_eq!(server.host, "127.0.0.1");
        assert_eq!(server.port, 5810);
    }

    #[test]
    fn test_partial_section_uses_field_defaults() {
        #[derive(Debug, Deserialize, Default)]
        struct Doc {
            #[serde(default)]
            server: ServerConfig,
            #[serde(default)]
            logging: LoggingConfig,
        }

        let doc: Doc = parse_toml("[server]\nport = 9000\n").unwrap();
        assert_eq!(doc.server.port, 9000);
        assert_eq!(doc.server.host, "127.0.0.1");
        assert_eq!(doc.logging.level, "info");
    }

    #[test]
    fn test_parse_error_is_config_error() {
        let result: Result<LoggingConfig> = parse_toml("level = [");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
