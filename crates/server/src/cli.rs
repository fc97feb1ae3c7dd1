//! Command-line arguments

use std::path::PathBuf;

use bg_core::{ConfigManager, GatewayConfig};
use clap::Parser;

/// bucket-gateway - HTTP gateway for managing objects in an S3 bucket
///
/// The bucket itself is chosen at runtime through `POST /configure`.
#[derive(Parser, Debug, Default)]
#[command(name = "bucket-gateway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the gateway config file
    #[arg(short, long, env = "BUCKET_GATEWAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on, overrides the config file
    #[arg(short, long, env = "BUCKET_GATEWAY_BIND")]
    pub bind: Option<String>,

    /// Use in-memory storage (data will not persist)
    #[arg(long, default_value = "false")]
    pub memory: bool,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub debug: bool,
}

impl Cli {
    /// Load the config file and apply command-line overrides
    pub fn load_config(&self) -> bg_core::Result<GatewayConfig> {
        let manager = match &self.config {
            Some(path) => ConfigManager::with_path(path.clone()),
            None => ConfigManager::new()?,
        };
        let mut config = manager.load()?;

        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if self.memory {
            config.storage.memory = true;
        }
        Ok(config)
    }
}
