//! # Agentic Librarian Common Library
//!
//! Shared code for the librarian services:
//! - Common error type
//! - Bootstrap TOML configuration and config file discovery
//! - Tracing subscriber initialisation

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
