//! bucket-gateway - HTTP gateway for an S3 bucket

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use bucket_gateway::cli::Cli;
use bucket_gateway::run_server_with_shutdown;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();

    let config = cli.load_config()?;

    run_server_with_shutdown(config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {e}");
        }
        tracing::info!("Shutdown signal received");
    })
    .await
}
