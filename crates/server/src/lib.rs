//! bucket-gateway HTTP server
//!
//! Exposes the bg-core gateway session over a small JSON and multipart API.
//! The router is exported so integration tests can drive it in-process.

pub mod cli;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use server::run_server_with_shutdown;
pub use state::AppState;
