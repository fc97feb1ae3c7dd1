//! HTTP route definitions

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::{AppState, handlers};

/// Create the main router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/configure", post(handlers::configure))
        .route("/files", get(handlers::list_files))
        .route("/create-folder", post(handlers::create_folder))
        .route("/upload", post(handlers::upload))
        .route("/delete", post(handlers::delete_object))
        .route("/delete-folder", post(handlers::delete_folder))
        .route("/delete-all", post(handlers::delete_all))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(state.config.server.max_body_bytes))
        .with_state(state)
}
