//! Gateway session
//!
//! Holds the single active bucket configuration and routes every gateway
//! operation through it. A session is an ordinary value: the server builds
//! one at startup and shares it, tests build as many as they like.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::config::GatewayConfig;
use crate::delete::{BulkDeleter, Confirmation};
use crate::error::{Error, Result};
use crate::listing::{ObjectRecord, list_records};
use crate::namespace::NamespaceManager;
use crate::path::normalize_folder;
use crate::thumbnail::ThumbnailGenerator;
use crate::traits::ObjectStore;
use crate::upload::{UploadOrchestrator, UploadRequest, UploadResult};
use crate::visibility::{DEFAULT_PROVIDER_DOMAIN, DEFAULT_URL_TTL, VisibilityResolver, url_ttl};

/// Credentials and location of the bucket the gateway manages
///
/// Absent fields deserialize as empty and are caught by [`validate`].
///
/// [`validate`]: StoreConfiguration::validate
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfiguration {
    #[serde(alias = "bucket_name")]
    pub bucket: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
}

impl StoreConfiguration {
    pub fn new(
        bucket: impl Into<String>,
        region: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// All four fields are required
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("bucket", &self.bucket),
            ("region", &self.region),
            ("access_key", &self.access_key),
            ("secret_key", &self.secret_key),
        ];
        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidInput(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )))
        }
    }
}

impl std::fmt::Debug for StoreConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfiguration")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Builds a bucket-bound store from a configuration
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self, config: &StoreConfiguration) -> Result<Arc<dyn ObjectStore>>;
}

/// Settings that shape every operation of a session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub provider_domain: String,
    pub default_url_ttl: Duration,
    pub inspect_acl: bool,
    pub thumbnails: ThumbnailGenerator,
    pub staging_dir: Option<PathBuf>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            provider_domain: DEFAULT_PROVIDER_DOMAIN.to_string(),
            default_url_ttl: DEFAULT_URL_TTL,
            inspect_acl: true,
            thumbnails: ThumbnailGenerator::default(),
            staging_dir: None,
        }
    }
}

impl From<&GatewayConfig> for SessionOptions {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            provider_domain: config.storage.provider_domain.clone(),
            default_url_ttl: config.default_url_ttl(),
            inspect_acl: config.storage.inspect_acl,
            thumbnails: ThumbnailGenerator::new(
                config.upload.thumbnail_max_width,
                config.upload.thumbnail_max_height,
            ),
            staging_dir: config.upload.staging_dir.clone(),
        }
    }
}

/// A configured bucket and the store that reaches it
pub struct ConfiguredBucket {
    pub config: StoreConfiguration,
    pub store: Arc<dyn ObjectStore>,
}

/// Entry point for every gateway operation
pub struct GatewaySession {
    connector: Arc<dyn StoreConnector>,
    options: SessionOptions,
    active: RwLock<Option<Arc<ConfiguredBucket>>>,
}

impl GatewaySession {
    pub fn new(connector: Arc<dyn StoreConnector>, options: SessionOptions) -> Self {
        Self {
            connector,
            options,
            active: RwLock::new(None),
        }
    }

    /// Connect to a bucket, replacing any earlier configuration
    pub async fn configure(&self, config: StoreConfiguration) -> Result<()> {
        config.validate()?;
        let store = self.connector.connect(&config).await?;

        info!(bucket = %config.bucket, region = %config.region, "Configured bucket");
        *self.active.write().await = Some(Arc::new(ConfiguredBucket { config, store }));
        Ok(())
    }

    pub async fn is_configured(&self) -> bool {
        self.active.read().await.is_some()
    }

    /// The active bucket, or `Unconfigured`
    ///
    /// Callers keep the returned handle for the whole operation, so a
    /// concurrent reconfigure does not switch buckets mid-way.
    pub async fn bucket(&self) -> Result<Arc<ConfiguredBucket>> {
        self.active.read().await.clone().ok_or(Error::Unconfigured)
    }

    fn resolver<'a>(&'a self, bucket: &'a ConfiguredBucket) -> VisibilityResolver<'a> {
        VisibilityResolver::new(
            bucket.store.as_ref(),
            &bucket.config.bucket,
            &self.options.provider_domain,
        )
        .inspect_acl(self.options.inspect_acl)
    }

    /// List objects under `prefix` (whole bucket when `None`)
    pub async fn list_files(
        &self,
        prefix: Option<&str>,
        expires_in: Option<u64>,
    ) -> Result<Vec<ObjectRecord>> {
        let bucket = self.bucket().await?;
        let ttl = url_ttl(expires_in, self.options.default_url_ttl)?;
        let resolver = self.resolver(&bucket);
        list_records(
            bucket.store.as_ref(),
            &resolver,
            prefix.unwrap_or_default(),
            ttl,
        )
        .await
    }

    /// Create a folder marker, returning the normalized folder path
    pub async fn create_folder(&self, path: &str) -> Result<String> {
        let bucket = self.bucket().await?;
        NamespaceManager::new(bucket.store.as_ref())
            .ensure_folder(path)
            .await?;
        Ok(normalize_folder(path).to_string())
    }

    pub async fn upload(&self, request: UploadRequest) -> Result<UploadResult> {
        let bucket = self.bucket().await?;
        UploadOrchestrator::new(
            bucket.store.as_ref(),
            self.resolver(&bucket),
            self.options.thumbnails,
            self.options.default_url_ttl,
        )
        .staging_dir(self.options.staging_dir.clone())
        .upload(request)
        .await
    }

    pub async fn delete_object(&self, key: &str) -> Result<()> {
        let bucket = self.bucket().await?;
        if key.is_empty() {
            return Err(Error::InvalidInput("No file key provided".to_string()));
        }
        bucket.store.delete_object(key).await?;
        info!(key, "Deleted object");
        Ok(())
    }

    /// Delete a folder and its contents, returning the number of objects
    pub async fn delete_folder(&self, path: &str) -> Result<usize> {
        let bucket = self.bucket().await?;
        BulkDeleter::new(bucket.store.as_ref())
            .delete_folder(path)
            .await
    }

    /// Delete every object in the bucket
    pub async fn delete_all(&self, confirmation: &Confirmation) -> Result<usize> {
        let bucket = self.bucket().await?;
        BulkDeleter::new(bucket.store.as_ref())
            .delete_all(confirmation)
            .await
    }
}
