//! Application state

use std::sync::Arc;

use bg_core::{GatewayConfig, GatewaySession, MemoryConnector, SessionOptions, StoreConnector};
use bg_s3::{ConnectOptions, S3Connector};
use tracing::{info, warn};

/// Application state shared across handlers
pub struct AppState {
    /// Gateway configuration
    pub config: GatewayConfig,
    /// Session holding the active bucket
    pub session: GatewaySession,
}

impl AppState {
    /// Create application state, picking the store backend from config
    pub fn new(config: GatewayConfig) -> Self {
        let connector: Arc<dyn StoreConnector> = if config.storage.memory {
            warn!("Storage mode: in-memory (NOT persistent - for development only)");
            Arc::new(MemoryConnector::default())
        } else {
            info!(
                endpoint = config.storage.endpoint.as_deref().unwrap_or("aws"),
                "Storage mode: S3"
            );
            Arc::new(S3Connector::new(ConnectOptions {
                endpoint: config.storage.endpoint.clone(),
                force_path_style: config.storage.force_path_style,
            }))
        };

        Self::with_connector(config, connector)
    }

    /// Create application state around an explicit connector
    pub fn with_connector(config: GatewayConfig, connector: Arc<dyn StoreConnector>) -> Self {
        let session = GatewaySession::new(connector, SessionOptions::from(&config));
        Self { config, session }
    }
}
