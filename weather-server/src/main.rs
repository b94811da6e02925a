//! Binary crate for the `weather-server` HTTP service.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Logging setup
//! - Mapping aggregation results and errors onto HTTP responses

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod cli;
mod http;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cmd = cli::Cli::parse();
    if let Err(e) = cmd.run().await {
        error!("weather-server failed: {e:#}");
        return Err(e);
    }

    Ok(())
}
