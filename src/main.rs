//! Liquidation Herald - Main Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use liquidation_herald::application::Herald;
use liquidation_herald::config::AppConfig;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Announces exchange liquidations.
#[derive(Debug, Parser)]
#[command(name = "liquidation-herald", version, about)]
struct Cli {
    /// Configuration file path.
    #[arg(short, long, value_name = "FILE", default_value = "herald.toml")]
    config: PathBuf,

    /// Log announcements instead of publishing them.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(error) = dotenvy::dotenv() {
        if !error.not_found() {
            return Err(error).context("failed to read .env");
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "liquidation_herald=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_sources(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    if cli.dry_run {
        config.publisher.dry_run = true;
    }

    info!(version = env!("CARGO_PKG_VERSION"), "starting liquidation herald");
    let herald = Herald::start(&config)
        .await
        .context("failed to start pipeline")?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown requested");

    herald.shutdown().await?;
    info!("stopped");
    Ok(())
}
