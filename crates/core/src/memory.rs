//! In-memory object store
//!
//! Backs the gateway in development mode and drives the test suites. It
//! keeps S3's observable behavior where the management layer depends on it:
//! lexicographic key order, bounded pages with continuation tokens, quiet
//! batch deletes capped at [`MAX_DELETE_BATCH`] keys, and ACL grants that
//! reflect the visibility an object was written with.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jiff::Timestamp;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::session::{StoreConfiguration, StoreConnector};
use crate::traits::{
    ALL_USERS_URI, Grant, Grantee, ListPage, MAX_DELETE_BATCH, ObjectInfo, ObjectStore,
    Permission, Visibility,
};

/// Default number of keys returned per listing page
pub const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: Option<String>,
    visibility: Visibility,
    last_modified: Timestamp,
}

#[derive(Debug, Default)]
struct Inner {
    objects: BTreeMap<String, StoredObject>,
    batch_sizes: Vec<usize>,
    presign_count: u64,
}

/// Bucket held entirely in process memory
#[derive(Debug)]
pub struct MemoryStore {
    bucket: String,
    page_size: usize,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store for a bucket
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            page_size: DEFAULT_PAGE_SIZE,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Override the listing page size
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Number of stored objects, folder markers included
    pub async fn len(&self) -> usize {
        self.inner.lock().await.objects.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Whether a key is present
    pub async fn contains(&self, key: &str) -> bool {
        self.inner.lock().await.objects.contains_key(key)
    }

    /// Stored bytes for a key
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.inner
            .lock()
            .await
            .objects
            .get(key)
            .map(|o| o.data.clone())
    }

    /// All keys in lexicographic order
    pub async fn keys(&self) -> Vec<String> {
        self.inner.lock().await.objects.keys().cloned().collect()
    }

    /// Sizes of every batch delete call received so far
    pub async fn batch_sizes(&self) -> Vec<usize> {
        self.inner.lock().await.batch_sizes.clone()
    }

    /// Change an object's ACL as an outside party would
    pub async fn set_visibility(&self, key: &str, visibility: Visibility) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let object = inner
            .objects
            .get_mut(key)
            .ok_or_else(|| Error::NotFound(key.to_string()))?;
        object.visibility = visibility;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: Option<String>,
        visibility: Visibility,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.objects.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type,
                visibility,
                last_modified: Timestamp::now(),
            },
        );
        Ok(())
    }

    async fn head_object(&self, key: &str) -> Result<ObjectInfo> {
        let inner = self.inner.lock().await;
        let object = inner
            .objects
            .get(key)
            .ok_or_else(|| Error::NotFound(key.to_string()))?;

        let mut info = ObjectInfo::new(key, object.data.len() as i64);
        info.last_modified = Some(object.last_modified);
        info.content_type = object.content_type.clone();
        Ok(info)
    }

    async fn get_object_acl(&self, key: &str) -> Result<Vec<Grant>> {
        let inner = self.inner.lock().await;
        let object = inner
            .objects
            .get(key)
            .ok_or_else(|| Error::NotFound(key.to_string()))?;

        let mut grants = vec![Grant::new(
            Grantee::CanonicalUser("owner".to_string()),
            Permission::FullControl,
        )];
        if object.visibility.is_public() {
            grants.push(Grant::new(
                Grantee::Group(ALL_USERS_URI.to_string()),
                Permission::Read,
            ));
        }
        Ok(grants)
    }

    async fn list_page(
        &self,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ListPage> {
        let inner = self.inner.lock().await;

        // The token is the last key of the previous page
        let start_after = continuation_token.unwrap_or_default();
        let mut matching = inner
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix) && key.as_str() > start_after.as_str());

        let items: Vec<ObjectInfo> = matching
            .by_ref()
            .take(self.page_size)
            .map(|(key, object)| {
                let mut info = ObjectInfo::new(key, object.data.len() as i64);
                info.last_modified = Some(object.last_modified);
                info
            })
            .collect();

        let continuation_token = if matching.next().is_some() {
            items.last().map(|info| info.key.clone())
        } else {
            None
        };

        Ok(ListPage {
            items,
            continuation_token,
        })
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        self.inner.lock().await.objects.remove(key);
        Ok(())
    }

    async fn delete_objects(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Err(Error::Store("MalformedXML: empty delete batch".to_string()));
        }
        if keys.len() > MAX_DELETE_BATCH {
            return Err(Error::Store(format!(
                "MalformedXML: {} keys exceeds the batch limit of {MAX_DELETE_BATCH}",
                keys.len()
            )));
        }

        let mut inner = self.inner.lock().await;
        inner.batch_sizes.push(keys.len());
        for key in keys {
            inner.objects.remove(key);
        }
        Ok(())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String> {
        let mut inner = self.inner.lock().await;
        inner.presign_count += 1;
        Ok(format!(
            "memory://{}/{key}?expires_in={}&signature={}",
            self.bucket,
            expires_in.as_secs(),
            inner.presign_count
        ))
    }
}

/// Connector that hands out one shared [`MemoryStore`] for every
/// configuration
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    store: Arc<MemoryStore>,
}

impl MemoryConnector {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// The store handed to every session
    pub fn store(&self) -> Arc<MemoryStore> {
        Arc::clone(&self.store)
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new(Arc::new(MemoryStore::new("memory")))
    }
}

#[async_trait]
impl StoreConnector for MemoryConnector {
    async fn connect(&self, config: &StoreConfiguration) -> Result<Arc<dyn ObjectStore>> {
        tracing::debug!(bucket = %config.bucket, "Using in-memory store");
        Ok(self.store() as Arc<dyn ObjectStore>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn filled(count: usize, page_size: usize) -> MemoryStore {
        let store = MemoryStore::new("test").with_page_size(page_size);
        for i in 0..count {
            store
                .put_object(&format!("k/{i:04}"), vec![1], None, Visibility::Private)
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_list_page_follows_tokens() {
        let store = filled(5, 2).await;

        let first = store.list_page("k/", None).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.continuation_token.as_deref(), Some("k/0001"));

        let second = store.list_page("k/", first.continuation_token).await.unwrap();
        assert_eq!(second.items[0].key, "k/0002");

        let third = store.list_page("k/", second.continuation_token).await.unwrap();
        assert_eq!(third.items.len(), 1);
        assert!(third.continuation_token.is_none());
    }

    #[tokio::test]
    async fn test_exact_page_boundary_has_no_token() {
        let store = filled(2, 2).await;
        let page = store.list_page("", None).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.continuation_token.is_none());
    }

    #[tokio::test]
    async fn test_head_missing_is_not_found() {
        let store = MemoryStore::new("test");
        let err = store.head_object("nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_acl_reflects_visibility() {
        let store = MemoryStore::new("test");
        store
            .put_object("a", vec![], None, Visibility::Public)
            .await
            .unwrap();
        let grants = store.get_object_acl("a").await.unwrap();
        assert!(grants.iter().any(Grant::allows_public_read));

        store.set_visibility("a", Visibility::Private).await.unwrap();
        let grants = store.get_object_acl("a").await.unwrap();
        assert!(!grants.iter().any(Grant::allows_public_read));
    }

    #[tokio::test]
    async fn test_batch_limits() {
        let store = MemoryStore::new("test");
        assert!(store.delete_objects(&[]).await.is_err());

        let too_many: Vec<String> = (0..=MAX_DELETE_BATCH).map(|i| i.to_string()).collect();
        assert!(store.delete_objects(&too_many).await.is_err());
        assert!(store.batch_sizes().await.is_empty());
    }

    #[tokio::test]
    async fn test_presign_varies_with_ttl() {
        let store = MemoryStore::new("test");
        let a = store.presign_get("k", Duration::from_secs(60)).await.unwrap();
        let b = store.presign_get("k", Duration::from_secs(120)).await.unwrap();
        assert!(a.contains("expires_in=60"));
        assert!(b.contains("expires_in=120"));
        assert_ne!(a, b);
    }
}
