use anyhow::Context;
use clap::Parser;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tracing::info;
use weather_core::{Config, WeatherAggregator, provider_from_config};

use crate::http;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-server",
    version,
    about = "Serve current weather and air quality for a city"
)]
pub struct Cli {
    /// Path to a TOML config file; defaults to the platform config directory.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Address to listen on, overriding config and WEATHER_BIND.
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        info!(?config, "configuration loaded");

        let provider = provider_from_config(&config)?;
        let aggregator = WeatherAggregator::new(Arc::from(provider), config.timeout())
            .with_concurrent_fetch(config.concurrent_fetch);

        let listener = tokio::net::TcpListener::bind(config.bind)
            .await
            .with_context(|| format!("Failed to bind {}", config.bind))?;
        info!("HTTP server listening on {}", config.bind);

        axum::serve(listener, http::create_router(aggregator))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server error")?;

        info!("weather-server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl+C, shutting down gracefully...");
    }
}
