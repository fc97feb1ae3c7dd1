//! Bulk deletion
//!
//! Targets are enumerated in full before anything is removed, then deleted
//! in sequential batches no larger than the provider allows. A failed batch
//! stops the run; batches already sent stay deleted.

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::namespace::NamespaceManager;
use crate::traits::{MAX_DELETE_BATCH, ObjectStore};

/// Safety gate in front of deleting a whole bucket
#[derive(Debug, Clone, Default)]
pub struct Confirmation {
    /// Value typed by the caller
    pub captcha: Option<String>,
    /// Value the caller was shown
    pub expected: Option<String>,
}

impl Confirmation {
    pub fn new(captcha: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            captcha: Some(captcha.into()),
            expected: Some(expected.into()),
        }
    }

    /// Both values present and equal ignoring case
    pub fn verify(&self) -> Result<()> {
        let (Some(captcha), Some(expected)) = (
            self.captcha.as_deref().filter(|s| !s.is_empty()),
            self.expected.as_deref().filter(|s| !s.is_empty()),
        ) else {
            return Err(Error::ConfirmationRequired);
        };

        if captcha.to_lowercase() != expected.to_lowercase() {
            return Err(Error::ConfirmationMismatch);
        }
        Ok(())
    }
}

/// Deletes folders or whole buckets under the batch limit
pub struct BulkDeleter<'a> {
    store: &'a dyn ObjectStore,
    batch_size: usize,
}

impl<'a> BulkDeleter<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self {
            store,
            batch_size: MAX_DELETE_BATCH,
        }
    }

    /// Use smaller batches; values are clamped to `1..=MAX_DELETE_BATCH`
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.clamp(1, MAX_DELETE_BATCH);
        self
    }

    /// Delete a folder marker and everything under its prefix
    pub async fn delete_folder(&self, path: &str) -> Result<usize> {
        let keys: Vec<String> = NamespaceManager::new(self.store)
            .list_folder(path)
            .await?
            .into_iter()
            .map(|o| o.key)
            .collect();

        self.delete_keys(&keys).await
    }

    /// Delete every object in the bucket once the confirmation checks out
    pub async fn delete_all(&self, confirmation: &Confirmation) -> Result<usize> {
        confirmation.verify()?;
        self.delete_prefix("").await
    }

    /// Delete everything whose key starts with `prefix`
    pub async fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let keys: Vec<String> = NamespaceManager::new(self.store)
            .list_under_prefix(prefix)
            .await?
            .into_iter()
            .map(|o| o.key)
            .collect();

        self.delete_keys(&keys).await
    }

    /// Delete `keys` in batches, returning how many were targeted
    pub async fn delete_keys(&self, keys: &[String]) -> Result<usize> {
        if keys.is_empty() {
            debug!("Nothing to delete");
            return Ok(0);
        }

        let mut deleted = 0usize;
        for (index, chunk) in keys.chunks(self.batch_size).enumerate() {
            if let Err(e) = self.store.delete_objects(chunk).await {
                warn!(
                    batch = index,
                    deleted,
                    remaining = keys.len() - deleted,
                    error = %e,
                    "Batch delete failed, aborting"
                );
                return Err(e);
            }
            deleted += chunk.len();
            debug!(batch = index, size = chunk.len(), "Deleted batch");
        }

        info!(count = deleted, "Bulk delete complete");
        Ok(deleted)
    }
}
