//! Outfit generation service binary
//!
//! Reads service credentials from the environment, builds the client state,
//! and serves the HTTP API. Operational knobs (bind address, verbosity,
//! body limit) are flags; everything else is driven over HTTP.

use anyhow::Context;
use clap::Parser;
use outfitgen::{
    config::AppConfig,
    server::{self, AppState},
    tracing_config::{TracingConfig, TracingFormat},
};
use std::net::SocketAddr;
use tracing::{info, warn};

/// Outfit generation service
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "outfitgen-server")]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8787)]
    port: u16,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Request body limit in megabytes
    #[arg(long, default_value_t = 25)]
    body_limit_mb: usize,

    /// Compact log output without ANSI colors (for CI and log collectors)
    #[arg(long)]
    compact_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let format = if args.compact_logs {
        TracingFormat::Compact
    } else {
        TracingFormat::Console
    };
    TracingConfig::new()
        .with_verbosity(args.verbose)
        .with_format(format)
        .init()
        .context("failed to initialize tracing")?;

    let config = AppConfig::from_env();
    if config.gemini.api_key.is_empty() {
        warn!("GEMINI_API_KEY is not set; generation endpoints will return configuration errors");
    }
    if config.storage.is_none() {
        info!("hosted store not configured; wardrobe endpoints are disabled");
    }
    #[cfg(feature = "vectorize")]
    if config.vectorizer.is_none() {
        info!("vectorizer not configured; /api/vectorize is disabled");
    }

    let state = AppState::from_config(&config).context("failed to build service state")?;
    let app = server::router(state, args.body_limit_mb * 1024 * 1024);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("invalid bind address")?;
    info!(%addr, "outfitgen server listening");

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .context("server error")?;

    Ok(())
}
