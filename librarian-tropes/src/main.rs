//! librarian-tropes - Trope Identification Service
//!
//! Subcommands:
//! - `serve`: HTTP service (`POST /tropes`, `GET /health`)
//! - `identify`: one-shot identification, prints the JSON envelope to stdout

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use librarian_common::logging::init_tracing;
use librarian_tropes::config::{config_origin, ConfigOrigin, TropesConfig};
use librarian_tropes::protocol::{TropeRequest, TropeResponse};
use librarian_tropes::{build_identifier, build_router, AppState};

/// Command-line arguments for librarian-tropes
#[derive(Parser, Debug)]
#[command(name = "librarian-tropes")]
#[command(about = "Identify literary tropes in a book from multiple evidence sources")]
#[command(version)]
struct Args {
    /// Path to tropes.toml
    #[arg(short, long, global = true, env = "LIBRARIAN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service
    Serve {
        /// Address to bind (overrides [server] host)
        #[arg(long, env = "LIBRARIAN_HOST")]
        host: Option<String>,

        /// Port to listen on (overrides [server] port)
        #[arg(short, long, env = "LIBRARIAN_PORT")]
        port: Option<u16>,
    },
    /// Identify tropes for one book and print the result
    Identify {
        #[arg(long)]
        title: String,

        #[arg(long)]
        author: String,

        /// Number of tropes to return
        #[arg(long, allow_negative_numbers = true)]
        top_n: Option<i64>,
    },
}

const LOG_TARGETS: &[&str] = &["librarian_tropes", "librarian_common"];

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Loading happens before the subscriber exists; report the outcome afterwards
    let config = TropesConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.logging, LOG_TARGETS).context("Failed to initialize logging")?;

    match config_origin(args.config.as_deref()) {
        ConfigOrigin::File(path) => info!("Loaded configuration from {}", path.display()),
        ConfigOrigin::Missing(path) => warn!(
            "Config file {} not found, using built-in defaults",
            path.display()
        ),
        ConfigOrigin::Defaults => info!("No config file found, using built-in defaults"),
    }

    match args.command {
        Command::Serve { host, port } => {
            serve(config, host, port).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Identify {
            title,
            author,
            top_n,
        } => identify(&config, &title, &author, top_n).await,
    }
}

async fn serve(config: TropesConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info!("Starting librarian-tropes (Trope Identification) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let identifier = Arc::new(build_identifier(&config).context("Failed to build evidence sources")?);
    info!(
        configured = ?identifier.configured_sources(),
        deadline_ms = identifier.request_deadline().as_millis() as u64,
        "Trope pipeline ready"
    );

    let app = build_router(AppState::new(identifier));

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn identify(config: &TropesConfig, title: &str, author: &str, top_n: Option<i64>) -> Result<ExitCode> {
    let response = match TropeRequest::new(title, author, top_n) {
        Err(e) => TropeResponse::from_error(&e),
        Ok(request) => {
            let identifier = build_identifier(config).context("Failed to build evidence sources")?;

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if signal::ctrl_c().await.is_ok() {
                    info!("Received Ctrl+C, cancelling request");
                    on_interrupt.cancel();
                }
            });

            match identifier.identify(&request, &cancel).await {
                Ok(tropes) => TropeResponse::success(&tropes),
                Err(e) => TropeResponse::from_error(&e),
            }
        }
    };

    let rendered = serde_json::to_string_pretty(&response).context("Failed to render response")?;
    println!("{}", rendered);

    Ok(if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
