//! Single-file upload pipeline
//!
//! Sanitizes the name, makes sure the target folder exists, stages the
//! content on local disk, writes it to the bucket, resolves the access URL
//! and optionally attaches a thumbnail.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::namespace::NamespaceManager;
use crate::path::{join_key, normalize_folder, sanitize_filename};
use crate::thumbnail::{ThumbnailGenerator, is_media};
use crate::traits::{ObjectStore, Visibility};
use crate::visibility::{VisibilityResolver, url_ttl};

/// A file handed to the gateway for upload
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// Name as supplied by the client
    pub filename: String,
    /// File content
    pub data: Vec<u8>,
    /// Target folder, if any
    pub folder: Option<String>,
    /// Apply a public-read ACL
    pub make_public: bool,
    /// Lifetime of the presigned URL in seconds, for private uploads
    pub expires_in: Option<u64>,
}

/// Outcome of a successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    pub key: String,
    pub url: String,
    /// Base64-encoded preview for media uploads
    pub thumbnail: Option<String>,
    /// Normalized folder path, empty when uploaded to the bucket root
    pub folder: String,
    pub is_public: bool,
}

/// Composes the namespace, visibility and thumbnail components into one
/// upload
pub struct UploadOrchestrator<'a> {
    store: &'a dyn ObjectStore,
    resolver: VisibilityResolver<'a>,
    thumbnails: ThumbnailGenerator,
    staging_dir: Option<PathBuf>,
    default_ttl: Duration,
}

impl<'a> UploadOrchestrator<'a> {
    pub fn new(
        store: &'a dyn ObjectStore,
        resolver: VisibilityResolver<'a>,
        thumbnails: ThumbnailGenerator,
        default_ttl: Duration,
    ) -> Self {
        Self {
            store,
            resolver,
            thumbnails,
            staging_dir: None,
            default_ttl,
        }
    }

    /// Stage files under `dir` instead of the system temp directory
    pub fn staging_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.staging_dir = dir;
        self
    }

    pub async fn upload(&self, request: UploadRequest) -> Result<UploadResult> {
        if request.filename.is_empty() {
            return Err(Error::InvalidInput("No file selected".to_string()));
        }
        if request.data.is_empty() {
            return Err(Error::InvalidInput("Uploaded file is empty".to_string()));
        }
        let ttl = url_ttl(request.expires_in, self.default_ttl)?;

        let filename = sanitize_filename(&request.filename)?;
        let folder = normalize_folder(request.folder.as_deref().unwrap_or_default()).to_string();
        let key = join_key(&folder, &filename);
        let visibility = Visibility::from_public_flag(request.make_public);

        if !folder.is_empty() {
            NamespaceManager::new(self.store).ensure_folder(&folder).await?;
        }

        // Dropping the staged file removes it, on every exit path
        let staged = stage(self.staging_dir.as_deref(), &request.data)?;
        drop(request.data);
        debug!(key = %key, staged = %staged.path().display(), "Staged upload");

        let content_type = mime_guess::from_path(&filename)
            .first()
            .map(|m| m.essence_str().to_string());

        let payload = tokio::fs::read(staged.path()).await?;
        let size = payload.len() as u64;
        self.store
            .put_object(&key, payload, content_type.clone(), visibility)
            .await?;

        let resolved = self.resolver.for_upload(&key, visibility, ttl).await?;

        let thumbnail = match content_type.as_deref() {
            Some(ct) if is_media(ct) => self.thumbnail(staged.path()).await,
            _ => None,
        };

        info!(
            key = %key,
            size = %humansize::format_size(size, humansize::BINARY),
            public = visibility.is_public(),
            thumbnail = thumbnail.is_some(),
            "Uploaded object"
        );

        Ok(UploadResult {
            key,
            url: resolved.url,
            thumbnail,
            folder,
            is_public: visibility.is_public(),
        })
    }

    async fn thumbnail(&self, staged: &Path) -> Option<String> {
        let bytes = match tokio::fs::read(staged).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Could not re-read staged file for thumbnail");
                return None;
            }
        };

        let generator = self.thumbnails;
        match tokio::task::spawn_blocking(move || generator.generate(&bytes)).await {
            Ok(thumbnail) => thumbnail,
            Err(e) => {
                warn!(error = %e, "Thumbnail task failed");
                None
            }
        }
    }
}

/// Write content to a uniquely named file in the staging area
///
/// The name carries no part of the upload's filename, so it stays short no
/// matter how long the key is.
fn stage(dir: Option<&Path>, data: &[u8]) -> Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("bg-upload-");

    let mut file = match dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            builder.tempfile_in(dir)?
        }
        None => builder.tempfile()?,
    };
    file.write_all(data)?;
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::memory::MemoryStore;
    use crate::traits::MockObjectStore;
    use crate::visibility::{DEFAULT_PROVIDER_DOMAIN, DEFAULT_URL_TTL};

    fn orchestrator<'a>(store: &'a dyn ObjectStore, staging: &Path) -> UploadOrchestrator<'a> {
        let resolver = VisibilityResolver::new(store, "bucket", DEFAULT_PROVIDER_DOMAIN);
        UploadOrchestrator::new(
            store,
            resolver,
            ThumbnailGenerator::default(),
            DEFAULT_URL_TTL,
        )
        .staging_dir(Some(staging.to_path_buf()))
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    fn staging_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    fn request(filename: &str, data: &[u8]) -> UploadRequest {
        UploadRequest {
            filename: filename.to_string(),
            data: data.to_vec(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_upload_to_root() {
        let staging = tempfile::tempdir().unwrap();
        let store = MemoryStore::new("bucket");

        let result = orchestrator(&store, staging.path())
            .upload(request("notes.txt", b"hello"))
            .await
            .unwrap();

        assert_eq!(result.key, "notes.txt");
        assert_eq!(result.folder, "");
        assert!(result.thumbnail.is_none());
        assert!(!result.is_public);
        assert_eq!(store.get("notes.txt").await.unwrap(), b"hello");
        let head = store.head_object("notes.txt").await.unwrap();
        assert_eq!(head.content_type.as_deref(), Some("text/plain"));
        assert!(staging_is_empty(staging.path()));
    }

    #[tokio::test]
    async fn test_upload_creates_single_folder_marker() {
        let staging = tempfile::tempdir().unwrap();
        let store = MemoryStore::new("bucket");
        let uploader = orchestrator(&store, staging.path());

        let mut first = request("a.txt", b"1");
        first.folder = Some("/reports/2024/".into());
        let result = uploader.upload(first).await.unwrap();
        assert_eq!(result.key, "reports/2024/a.txt");
        assert_eq!(result.folder, "reports/2024");

        let mut second = request("b.txt", b"2");
        second.folder = Some("reports/2024".into());
        uploader.upload(second).await.unwrap();

        assert_eq!(
            store.keys().await,
            vec!["reports/2024/", "reports/2024/a.txt", "reports/2024/b.txt"]
        );
    }

    #[tokio::test]
    async fn test_upload_public_url() {
        let staging = tempfile::tempdir().unwrap();
        let store = MemoryStore::new("bucket");

        let mut req = request("cat.gif", b"GIF89a-not-really");
        req.make_public = true;
        let result = orchestrator(&store, staging.path())
            .upload(req)
            .await
            .unwrap();

        assert_eq!(result.url, "https://bucket.s3.amazonaws.com/cat.gif");
        assert!(result.is_public);
        // Misclassified media never fails the upload
        assert!(result.thumbnail.is_none());
    }

    #[tokio::test]
    async fn test_upload_image_gets_thumbnail() {
        let staging = tempfile::tempdir().unwrap();
        let store = MemoryStore::new("bucket");

        let result = orchestrator(&store, staging.path())
            .upload(request("photo.png", &png(300, 150)))
            .await
            .unwrap();

        assert!(result.thumbnail.is_some_and(|t| !t.is_empty()));
    }

    #[tokio::test]
    async fn test_upload_sanitizes_filename() {
        let staging = tempfile::tempdir().unwrap();
        let store = MemoryStore::new("bucket");

        let mut req = request("../../secret config.txt", b"x");
        req.folder = Some("safe".into());
        let result = orchestrator(&store, staging.path())
            .upload(req)
            .await
            .unwrap();
        assert_eq!(result.key, "safe/secret_config.txt");
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_input() {
        let staging = tempfile::tempdir().unwrap();
        let store = MemoryStore::new("bucket");
        let uploader = orchestrator(&store, staging.path());

        assert!(matches!(
            uploader.upload(request("a.txt", b"")).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            uploader.upload(request("", b"data")).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_store_failure_still_cleans_staging() {
        let staging = tempfile::tempdir().unwrap();
        let mut store = MockObjectStore::new();
        store
            .expect_put_object()
            .returning(|_, _, _, _| Err(Error::Store("AccessDenied".into())));
        store.expect_presign_get().never();

        let err = orchestrator(&store, staging.path())
            .upload(request("a.txt", b"data"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert!(staging_is_empty(staging.path()));
    }

    #[tokio::test]
    async fn test_upload_long_filename() {
        let staging = tempfile::tempdir().unwrap();
        let store = MemoryStore::new("bucket");
        let filename = format!("{}.txt", "a".repeat(246));

        let mut req = request(&filename, b"x");
        req.folder = Some("long".into());
        let result = orchestrator(&store, staging.path())
            .upload(req)
            .await
            .unwrap();

        assert_eq!(result.key, format!("long/{filename}"));
        assert_eq!(store.get(&result.key).await.unwrap(), b"x");
        assert!(staging_is_empty(staging.path()));
    }

    #[tokio::test]
    async fn test_concurrent_uploads_with_same_name() {
        let staging = tempfile::tempdir().unwrap();
        let store = MemoryStore::new("bucket");
        let uploader = orchestrator(&store, staging.path());

        let mut first = request("report.txt", b"first contents");
        first.folder = Some("left".into());
        let mut second = request("report.txt", b"second, longer contents");
        second.folder = Some("right".into());

        let (first, second) = tokio::join!(uploader.upload(first), uploader.upload(second));
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_eq!(first.key, "left/report.txt");
        assert_eq!(second.key, "right/report.txt");
        assert_eq!(store.get(&first.key).await.unwrap(), b"first contents");
        assert_eq!(
            store.get(&second.key).await.unwrap(),
            b"second, longer contents"
        );
        assert!(staging_is_empty(staging.path()));
    }
}
