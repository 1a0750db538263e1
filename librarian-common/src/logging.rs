//! Tracing subscriber initialisation
//!
//! `RUST_LOG` takes precedence; otherwise the configured level applies to the
//! given crates plus `tower_http`.

use crate::config::LoggingConfig;
use crate::{Error, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the default filter directive for a set of crate targets
pub fn default_directive(targets: &[&str], level: &str) -> String {
    let mut directives: Vec<String> = targets.iter().map(|t| format!("{}={}", t, level)).collect();
    directives.push(format!("tower_http={}", level));
    directives.join(",")
}

/// Install the global tracing subscriber (stderr `fmt` layer)
pub fn init_tracing(logging: &LoggingConfig, targets: &[&str]) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(targets, &logging.level)))
        .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| Error::Internal(format!("Tracing already initialised: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        let directive = default_directive(&["librarian_tropes"], "debug");
        assert_eq!(directive, "librarian_tropes=debug,tower_http=debug");
    }
}
