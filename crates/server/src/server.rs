//! Server startup and lifecycle

use std::sync::Arc;

use bg_core::GatewayConfig;
use tokio::net::TcpListener;
use tracing::info;

use crate::{AppState, routes};

/// Run the gateway until `shutdown_signal` resolves
pub async fn run_server_with_shutdown(
    config: GatewayConfig,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = config.server.bind.clone();
    let state = Arc::new(AppState::new(config));
    let app = routes::create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("Bucket gateway listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Gateway shutdown complete");
    Ok(())
}
