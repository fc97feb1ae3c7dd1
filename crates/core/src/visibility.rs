//! Object visibility and access URLs
//!
//! Uploads choose their visibility, so the URL form follows directly from
//! the caller's flag. Listings have to discover it from the object's ACL,
//! which may have been changed outside the gateway.

use std::time::Duration;

use tracing::warn;

use crate::error::{Error, Result};
use crate::traits::{Grant, ObjectStore, Visibility};

/// Default lifetime of presigned URLs
pub const DEFAULT_URL_TTL: Duration = Duration::from_secs(3600);

/// Longest lifetime a presigned URL may have (7 days)
pub const MAX_URL_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

/// Default public endpoint domain
pub const DEFAULT_PROVIDER_DOMAIN: &str = "s3.amazonaws.com";

/// Validate a caller-supplied URL lifetime in seconds, falling back to
/// `default` when absent
pub fn url_ttl(expires_in: Option<u64>, default: Duration) -> Result<Duration> {
    let Some(secs) = expires_in else {
        return Ok(default);
    };
    let ttl = Duration::from_secs(secs);
    if secs == 0 || ttl > MAX_URL_TTL {
        return Err(Error::InvalidInput(format!(
            "expires_in must be between 1 and {} seconds",
            MAX_URL_TTL.as_secs()
        )));
    }
    Ok(ttl)
}

/// Access URL for an object plus what is known about its visibility
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrl {
    pub url: String,
    /// `None` when visibility was not inspected
    pub is_public: Option<bool>,
}

/// Decides whether an object is public and which URL form to hand out
pub struct VisibilityResolver<'a> {
    store: &'a dyn ObjectStore,
    bucket: &'a str,
    provider_domain: &'a str,
    inspect_acl: bool,
}

impl<'a> VisibilityResolver<'a> {
    pub fn new(store: &'a dyn ObjectStore, bucket: &'a str, provider_domain: &'a str) -> Self {
        Self {
            store,
            bucket,
            provider_domain,
            inspect_acl: true,
        }
    }

    /// Skip per-object ACL lookups during discovery
    pub fn inspect_acl(mut self, inspect: bool) -> Self {
        self.inspect_acl = inspect;
        self
    }

    /// Deterministic public URL of a key
    pub fn public_url(&self, key: &str) -> String {
        format!("https://{}.{}/{key}", self.bucket, self.provider_domain)
    }

    /// Resolve the URL for `key`
    ///
    /// With an explicit request the caller's choice is trusted (upload
    /// path). Without one the object's ACL is inspected (listing path).
    pub async fn resolve(
        &self,
        key: &str,
        explicit_public: Option<bool>,
        ttl: Duration,
    ) -> Result<ResolvedUrl> {
        match explicit_public {
            Some(public) => self.for_upload(key, Visibility::from_public_flag(public), ttl).await,
            None => self.discover(key, ttl).await,
        }
    }

    /// URL for an object whose visibility was set at write time
    pub async fn for_upload(
        &self,
        key: &str,
        visibility: Visibility,
        ttl: Duration,
    ) -> Result<ResolvedUrl> {
        let url = match visibility {
            Visibility::Public => self.public_url(key),
            Visibility::Private => self.store.presign_get(key, ttl).await?,
        };
        Ok(ResolvedUrl {
            url,
            is_public: Some(visibility.is_public()),
        })
    }

    /// URL for an existing object, inspecting its ACL
    pub async fn discover(&self, key: &str, ttl: Duration) -> Result<ResolvedUrl> {
        if !self.inspect_acl {
            return Ok(ResolvedUrl {
                url: self.store.presign_get(key, ttl).await?,
                is_public: None,
            });
        }

        let public = self.is_public(key).await;
        let url = if public {
            self.public_url(key)
        } else {
            self.store.presign_get(key, ttl).await?
        };
        Ok(ResolvedUrl {
            url,
            is_public: Some(public),
        })
    }

    /// Whether any grant lets anonymous users read `key`
    ///
    /// A failed lookup counts as private.
    pub async fn is_public(&self, key: &str) -> bool {
        match self.store.get_object_acl(key).await {
            Ok(grants) => grants.iter().any(Grant::allows_public_read),
            Err(e) => {
                warn!(key, error = %e, "ACL lookup failed, treating object as private");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::traits::MockObjectStore;

    #[test]
    fn test_url_ttl_bounds() {
        assert_eq!(url_ttl(None, DEFAULT_URL_TTL).unwrap(), DEFAULT_URL_TTL);
        assert_eq!(url_ttl(Some(60), DEFAULT_URL_TTL).unwrap().as_secs(), 60);
        assert!(url_ttl(Some(0), DEFAULT_URL_TTL).is_err());
        assert!(url_ttl(Some(MAX_URL_TTL.as_secs() + 1), DEFAULT_URL_TTL).is_err());
        assert!(url_ttl(Some(MAX_URL_TTL.as_secs()), DEFAULT_URL_TTL).is_ok());
    }

    #[tokio::test]
    async fn test_upload_public_uses_deterministic_url() {
        let store = MemoryStore::new("photos");
        let resolver = VisibilityResolver::new(&store, "photos", DEFAULT_PROVIDER_DOMAIN);

        let resolved = resolver
            .resolve("a/cat.png", Some(true), DEFAULT_URL_TTL)
            .await
            .unwrap();
        assert_eq!(resolved.url, "https://photos.s3.amazonaws.com/a/cat.png");
        assert_eq!(resolved.is_public, Some(true));
    }

    #[tokio::test]
    async fn test_upload_private_url_depends_on_ttl() {
        let store = MemoryStore::new("photos");
        let resolver = VisibilityResolver::new(&store, "photos", DEFAULT_PROVIDER_DOMAIN);

        let short = resolver
            .resolve("cat.png", Some(false), Duration::from_secs(60))
            .await
            .unwrap();
        let long = resolver
            .resolve("cat.png", Some(false), Duration::from_secs(600))
            .await
            .unwrap();
        assert_ne!(short.url, long.url);
        assert!(!short.url.starts_with("https://photos.s3.amazonaws.com"));
        assert_eq!(short.is_public, Some(false));
    }

    #[tokio::test]
    async fn test_discover_reads_acl() {
        let store = MemoryStore::new("b");
        store
            .put_object("pub", vec![1], None, Visibility::Public)
            .await
            .unwrap();
        store
            .put_object("priv", vec![1], None, Visibility::Private)
            .await
            .unwrap();
        let resolver = VisibilityResolver::new(&store, "b", "example.com");

        let public = resolver.resolve("pub", None, DEFAULT_URL_TTL).await.unwrap();
        assert_eq!(public.url, "https://b.example.com/pub");
        assert_eq!(public.is_public, Some(true));

        let private = resolver.resolve("priv", None, DEFAULT_URL_TTL).await.unwrap();
        assert_eq!(private.is_public, Some(false));
    }

    #[tokio::test]
    async fn test_discover_acl_failure_degrades_to_private() {
        let mut store = MockObjectStore::new();
        store
            .expect_get_object_acl()
            .returning(|key| Err(Error::Store(format!("AccessDenied on {key}"))));
        store
            .expect_presign_get()
            .returning(|key, _| Ok(format!("signed://{key}")));

        let resolver = VisibilityResolver::new(&store, "b", DEFAULT_PROVIDER_DOMAIN);
        let resolved = resolver.discover("gone", DEFAULT_URL_TTL).await.unwrap();
        assert_eq!(resolved.url, "signed://gone");
        assert_eq!(resolved.is_public, Some(false));
    }

    #[tokio::test]
    async fn test_discover_without_inspection_is_unknown() {
        let mut store = MockObjectStore::new();
        store.expect_get_object_acl().never();
        store
            .expect_presign_get()
            .returning(|key, _| Ok(format!("signed://{key}")));

        let resolver =
            VisibilityResolver::new(&store, "b", DEFAULT_PROVIDER_DOMAIN).inspect_acl(false);
        let resolved = resolver.discover("k", DEFAULT_URL_TTL).await.unwrap();
        assert_eq!(resolved.is_public, None);
    }
}
