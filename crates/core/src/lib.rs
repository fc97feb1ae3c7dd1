//! bg-core: Core library for the bucket gateway
//!
//! This crate provides the object-storage management layer, including:
//! - Folder emulation over a flat key space
//! - Visibility discovery and access URLs
//! - Batched bulk deletion
//! - The upload pipeline with thumbnail generation
//! - The gateway session holding the active bucket
//!
//! This crate is designed to be independent of any specific S3 SDK. The
//! remote store is reached through the [`ObjectStore`] trait.

pub mod config;
pub mod delete;
pub mod error;
pub mod listing;
pub mod memory;
pub mod namespace;
pub mod path;
pub mod session;
pub mod thumbnail;
pub mod traits;
pub mod upload;
pub mod visibility;

pub use config::{ConfigManager, GatewayConfig};
pub use delete::{BulkDeleter, Confirmation};
pub use error::{Error, Result};
pub use listing::ObjectRecord;
pub use memory::{MemoryConnector, MemoryStore};
pub use namespace::{FolderStatus, NamespaceManager};
pub use session::{GatewaySession, SessionOptions, StoreConfiguration, StoreConnector};
pub use thumbnail::ThumbnailGenerator;
pub use traits::{
    Grant, Grantee, ListPage, MAX_DELETE_BATCH, ObjectInfo, ObjectStore, Permission, Visibility,
};
pub use upload::{UploadOrchestrator, UploadRequest, UploadResult};
pub use visibility::{ResolvedUrl, VisibilityResolver};
