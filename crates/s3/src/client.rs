//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from bg-core.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectCannedAcl, ObjectIdentifier};
use aws_smithy_types::DateTime;

use bg_core::{
    Error, Grant, Grantee, ListPage, ObjectInfo, ObjectStore, Permission, Result,
    StoreConfiguration, StoreConnector, Visibility,
};

/// Connection options that come from the gateway config rather than from
/// the configure call
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Custom S3-compatible endpoint
    pub endpoint: Option<String>,

    /// Use path-style bucket addressing
    pub force_path_style: bool,
}

/// S3 client wrapper bound to one bucket
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Client {
    /// Create a new S3 client from a store configuration
    pub async fn new(config: &StoreConfiguration, options: &ConnectOptions) -> Result<Self> {
        // Build credentials provider
        let credentials = aws_credential_types::Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None, // session token
            None, // expiry
            "bucket-gateway-static-credentials",
        );

        // Build SDK config
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(config.region.clone()));
        if let Some(endpoint) = &options.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(options.force_path_style)
            .build();

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        })
    }
}

/// Map an SDK failure to `NotFound` for missing keys, `Store` otherwise
fn map_sdk_error<E, R>(err: SdkError<E, R>, key: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.as_service_error().and_then(|e| e.code());
    if matches!(code, Some("NoSuchKey" | "NotFound")) {
        return Error::NotFound(key.to_string());
    }
    Error::Store(DisplayErrorContext(&err).to_string())
}

fn to_timestamp(value: &DateTime) -> Option<jiff::Timestamp> {
    jiff::Timestamp::new(value.secs(), value.subsec_nanos() as i32).ok()
}

fn convert_grant(grant: &aws_sdk_s3::types::Grant) -> Grant {
    use aws_sdk_s3::types::Permission as S3Permission;

    let grantee = match grant.grantee() {
        Some(g) => match (g.uri(), g.id()) {
            (Some(uri), _) => Grantee::Group(uri.to_string()),
            (None, Some(id)) => Grantee::CanonicalUser(id.to_string()),
            _ => Grantee::Unknown,
        },
        None => Grantee::Unknown,
    };

    let permission = match grant.permission() {
        Some(S3Permission::Read) => Permission::Read,
        Some(S3Permission::Write) => Permission::Write,
        Some(S3Permission::ReadAcp) => Permission::ReadAcp,
        Some(S3Permission::WriteAcp) => Permission::WriteAcp,
        Some(S3Permission::FullControl) => Permission::FullControl,
        Some(other) => Permission::Other(other.as_str().to_string()),
        None => Permission::Other(String::new()),
    };

    Grant::new(grantee, permission)
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: Option<String>,
        visibility: Visibility,
    ) -> Result<()> {
        let mut request = self
            .inner
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .set_content_type(content_type);

        if visibility.is_public() {
            request = request.acl(ObjectCannedAcl::PublicRead);
        }

        request.send().await.map_err(|e| map_sdk_error(e, key))?;
        Ok(())
    }

    async fn head_object(&self, key: &str) -> Result<ObjectInfo> {
        let response = self
            .inner
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, key))?;

        let mut info = ObjectInfo::new(key, response.content_length().unwrap_or(0));
        info.last_modified = response.last_modified().and_then(to_timestamp);
        info.content_type = response.content_type().map(str::to_string);
        Ok(info)
    }

    async fn get_object_acl(&self, key: &str) -> Result<Vec<Grant>> {
        let response = self
            .inner
            .get_object_acl()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, key))?;

        Ok(response.grants().iter().map(convert_grant).collect())
    }

    async fn list_page(
        &self,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ListPage> {
        let mut request = self
            .inner
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_continuation_token(continuation_token);

        if !prefix.is_empty() {
            request = request.prefix(prefix);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Store(DisplayErrorContext(&e).to_string()))?;

        let items = response
            .contents()
            .iter()
            .map(|object| {
                let mut info = ObjectInfo::new(
                    object.key().unwrap_or_default(),
                    object.size().unwrap_or(0),
                );
                info.last_modified = object.last_modified().and_then(to_timestamp);
                info
            })
            .collect();

        let continuation_token = if response.is_truncated().unwrap_or(false) {
            response.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ListPage {
            items,
            continuation_token,
        })
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        self.inner
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, key))?;
        Ok(())
    }

    async fn delete_objects(&self, keys: &[String]) -> Result<()> {
        let objects = keys
            .iter()
            .map(|k| ObjectIdentifier::builder().key(k).build())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::General(e.to_string()))?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .map_err(|e| Error::General(e.to_string()))?;

        let response = self
            .inner
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| Error::Store(DisplayErrorContext(&e).to_string()))?;

        // Quiet mode only reports failures
        if !response.errors().is_empty() {
            let error_keys: Vec<&str> = response
                .errors()
                .iter()
                .filter_map(|e| e.key())
                .collect();
            tracing::warn!("Failed to delete some objects: {:?}", error_keys);
        }

        Ok(())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| Error::InvalidInput(e.to_string()))?;

        let request = self
            .inner
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| map_sdk_error(e, key))?;

        Ok(request.uri().to_string())
    }
}

/// Builds an [`S3Client`] for each configure call
#[derive(Debug, Clone, Default)]
pub struct S3Connector {
    options: ConnectOptions,
}

impl S3Connector {
    pub fn new(options: ConnectOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl StoreConnector for S3Connector {
    async fn connect(&self, config: &StoreConfiguration) -> Result<Arc<dyn ObjectStore>> {
        let client = S3Client::new(config, &self.options).await?;
        tracing::debug!(
            bucket = %config.bucket,
            endpoint = ?self.options.endpoint,
            "Built S3 client"
        );
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::http::HttpResponse;
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::operation::head_object::HeadObjectError;
    use aws_sdk_s3::types::error::NotFound;
    use aws_sdk_s3::types::{Grantee as S3Grantee, Permission as S3Permission, Type};
    use aws_smithy_types::body::SdkBody;
    use bg_core::traits::ALL_USERS_URI;

    fn head_failure(err: HeadObjectError, status: u16) -> SdkError<HeadObjectError, HttpResponse> {
        let response = HttpResponse::new(status.try_into().unwrap(), SdkBody::empty());
        SdkError::service_error(err, response)
    }

    fn with_code(code: &str) -> ErrorMetadata {
        ErrorMetadata::builder().code(code).build()
    }

    fn s3_grant(grantee: S3Grantee, permission: S3Permission) -> aws_sdk_s3::types::Grant {
        aws_sdk_s3::types::Grant::builder()
            .grantee(grantee)
            .permission(permission)
            .build()
    }

    #[test]
    fn test_convert_all_users_grant() {
        let grantee = S3Grantee::builder()
            .r#type(Type::Group)
            .uri(ALL_USERS_URI)
            .build()
            .unwrap();
        let grant = convert_grant(&s3_grant(grantee, S3Permission::Read));

        assert_eq!(grant.grantee, Grantee::Group(ALL_USERS_URI.to_string()));
        assert_eq!(grant.permission, Permission::Read);
        assert!(grant.allows_public_read());
    }

    #[test]
    fn test_convert_owner_grant() {
        let grantee = S3Grantee::builder()
            .r#type(Type::CanonicalUser)
            .id("owner-id")
            .build()
            .unwrap();
        let grant = convert_grant(&s3_grant(grantee, S3Permission::FullControl));

        assert_eq!(grant.grantee, Grantee::CanonicalUser("owner-id".to_string()));
        assert!(!grant.allows_public_read());
    }

    #[test]
    fn test_convert_empty_grant() {
        let grant = convert_grant(&aws_sdk_s3::types::Grant::builder().build());
        assert_eq!(grant.grantee, Grantee::Unknown);
        assert!(!grant.allows_public_read());
    }

    #[test]
    fn test_to_timestamp() {
        let ts = to_timestamp(&DateTime::from_secs(1_700_000_000)).unwrap();
        assert_eq!(ts.as_second(), 1_700_000_000);
    }

    #[test]
    fn test_missing_key_maps_to_not_found() {
        let not_found = NotFound::builder().meta(with_code("NotFound")).build();
        let err = map_sdk_error(head_failure(HeadObjectError::NotFound(not_found), 404), "a/");
        assert!(matches!(err, Error::NotFound(ref key) if key == "a/"));

        let no_such_key = HeadObjectError::generic(with_code("NoSuchKey"));
        let err = map_sdk_error(head_failure(no_such_key, 404), "a/");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_other_failures_map_to_store() {
        let denied = HeadObjectError::generic(with_code("AccessDenied"));
        let err = map_sdk_error(head_failure(denied, 403), "a/");
        assert!(matches!(err, Error::Store(_)));
    }
}
