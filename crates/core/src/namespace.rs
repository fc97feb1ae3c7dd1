//! Folder emulation over a flat key space
//!
//! A folder is a zero-byte marker object whose key ends in `/`. It is
//! considered to exist if that marker or any object under its prefix does.

use tracing::{debug, info};

use crate::error::Result;
use crate::path::folder_key;
use crate::traits::{ObjectInfo, ObjectStore, Visibility};

/// Outcome of [`NamespaceManager::ensure_folder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderStatus {
    Created,
    AlreadyExists,
}

/// Creates folder markers and drains prefix listings
pub struct NamespaceManager<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> NamespaceManager<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    /// Make sure a marker exists for `path`, creating it if absent
    pub async fn ensure_folder(&self, path: &str) -> Result<FolderStatus> {
        let marker = folder_key(path)?;

        match self.store.head_object(&marker).await {
            Ok(_) => {
                debug!(folder = %marker, "Folder marker already present");
                Ok(FolderStatus::AlreadyExists)
            }
            Err(e) if e.is_not_found() => {
                self.store
                    .put_object(&marker, Vec::new(), None, Visibility::Private)
                    .await?;
                info!(folder = %marker, "Created folder marker");
                Ok(FolderStatus::Created)
            }
            Err(e) => Err(e),
        }
    }

    /// Every object under a folder, marker included
    pub async fn list_folder(&self, path: &str) -> Result<Vec<ObjectInfo>> {
        let prefix = folder_key(path)?;
        self.list_under_prefix(&prefix).await
    }

    /// Every object whose key starts with `prefix`
    ///
    /// Pages are fetched one after another until the store stops returning
    /// a continuation token, so the result is never truncated.
    pub async fn list_under_prefix(&self, prefix: &str) -> Result<Vec<ObjectInfo>> {
        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .store
                .list_page(prefix, continuation_token.take())
                .await?;
            pages += 1;
            debug!(prefix, page = pages, items = page.items.len(), "Listed page");
            objects.extend(page.items);

            match page.continuation_token {
                Some(token) => continuation_token = Some(token),
                None => break,
            }
        }

        Ok(objects)
    }
}
