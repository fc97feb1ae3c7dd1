//! Bucket listing with per-object access details

use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::namespace::NamespaceManager;
use crate::traits::ObjectStore;
use crate::visibility::VisibilityResolver;

/// One object as reported to callers
///
/// Derived fresh on every listing; two listings may disagree if the bucket
/// changes in between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub key: String,
    pub size: i64,
    pub last_modified: Option<Timestamp>,
    pub url: String,
    pub content_type: String,
    /// `None` when ACL inspection is disabled
    #[serde(rename = "isPublic")]
    pub is_public: Option<bool>,
}

/// List every object under `prefix` with its URL, content type and
/// visibility
///
/// Metadata and ACL lookups that fail for a single object degrade that
/// record instead of failing the listing.
pub async fn list_records(
    store: &dyn ObjectStore,
    resolver: &VisibilityResolver<'_>,
    prefix: &str,
    ttl: Duration,
) -> Result<Vec<ObjectRecord>> {
    let objects = NamespaceManager::new(store).list_under_prefix(prefix).await?;

    let mut records = Vec::with_capacity(objects.len());
    for object in objects {
        let resolved = resolver.discover(&object.key, ttl).await?;
        let content_type = content_type_of(store, &object.key).await;

        records.push(ObjectRecord {
            key: object.key,
            size: object.size_bytes,
            last_modified: object.last_modified,
            url: resolved.url,
            content_type,
            is_public: resolved.is_public,
        });
    }

    info!(prefix, count = records.len(), "Listed objects");
    Ok(records)
}

/// Stored content type, falling back to a guess from the key's extension
async fn content_type_of(store: &dyn ObjectStore, key: &str) -> String {
    match store.head_object(key).await {
        Ok(info) => info.content_type.unwrap_or_default(),
        Err(e) => {
            debug!(key, error = %e, "Metadata lookup failed, guessing content type");
            mime_guess::from_path(key)
                .first()
                .map(|m| m.essence_str().to_string())
                .unwrap_or_default()
        }
    }
}
