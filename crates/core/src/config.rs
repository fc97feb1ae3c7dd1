//! Gateway configuration
//!
//! Startup settings for the gateway, stored in TOML at
//! ~/.config/bucket-gateway/config.toml. Bucket credentials are not part of
//! this file; they arrive at runtime through the configure operation.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::thumbnail::DEFAULT_THUMBNAIL_SIZE;
use crate::visibility::{DEFAULT_PROVIDER_DOMAIN, url_ttl};

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

const DEFAULT_BIND: &str = "127.0.0.1:5006";

const DEFAULT_MAX_BODY_BYTES: usize = 100 * 1024 * 1024;

const DEFAULT_URL_TTL_SECS: u64 = 3600;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Schema version for migration support
    pub schema_version: u32,

    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub upload: UploadSettings,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Listen address
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Largest accepted request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Object store behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Domain used to build public object URLs
    #[serde(default = "default_provider_domain")]
    pub provider_domain: String,

    /// Custom S3-compatible endpoint URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Use path-style bucket addressing
    #[serde(default)]
    pub force_path_style: bool,

    /// Presigned URL lifetime when the caller gives none
    #[serde(default = "default_url_ttl_secs")]
    pub default_url_ttl_secs: u64,

    /// Look up each object's ACL while listing
    #[serde(default = "default_true")]
    pub inspect_acl: bool,

    /// Keep objects in process memory instead of a remote bucket
    #[serde(default)]
    pub memory: bool,
}

/// Upload handling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSettings {
    /// Directory for staged uploads (system temp dir when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_dir: Option<PathBuf>,

    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_max_width: u32,

    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_max_height: u32,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn default_provider_domain() -> String {
    DEFAULT_PROVIDER_DOMAIN.to_string()
}

fn default_url_ttl_secs() -> u64 {
    DEFAULT_URL_TTL_SECS
}

fn default_thumbnail_size() -> u32 {
    DEFAULT_THUMBNAIL_SIZE
}

fn default_true() -> bool {
    true
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            provider_domain: default_provider_domain(),
            endpoint: None,
            force_path_style: false,
            default_url_ttl_secs: default_url_ttl_secs(),
            inspect_acl: true,
            memory: false,
        }
    }
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            staging_dir: None,
            thumbnail_max_width: default_thumbnail_size(),
            thumbnail_max_height: default_thumbnail_size(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            server: ServerSettings::default(),
            storage: StorageSettings::default(),
            upload: UploadSettings::default(),
        }
    }
}

impl GatewayConfig {
    /// Reject settings that would only fail later at request time
    pub fn validate(&self) -> Result<()> {
        if self.storage.provider_domain.trim().is_empty() {
            return Err(Error::Config("storage.provider_domain cannot be empty".into()));
        }
        if let Some(endpoint) = &self.storage.endpoint {
            url::Url::parse(endpoint)?;
        }
        url_ttl(Some(self.storage.default_url_ttl_secs), self.default_url_ttl())
            .map_err(|e| Error::Config(format!("storage.default_url_ttl_secs: {e}")))?;
        Ok(())
    }

    pub fn default_url_ttl(&self) -> Duration {
        Duration::from_secs(self.storage.default_url_ttl_secs)
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;
        let config_path = config_dir.join("bucket-gateway").join("config.toml");
        Ok(Self { config_path })
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    pub fn load(&self) -> Result<GatewayConfig> {
        if !self.config_path.exists() {
            return Ok(GatewayConfig::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let config: GatewayConfig = toml::from_str(&content)?;

        if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade bucket-gateway.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to disk
    ///
    /// Creates parent directories if they don't exist.
    pub fn save(&self, config: &GatewayConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }
}
