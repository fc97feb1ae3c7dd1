//! ObjectStore trait definition
//!
//! This trait defines the primitive operations the gateway needs from a
//! remote bucket. It keeps the management layer decoupled from the specific
//! S3 SDK, and every implementation is bound to a single bucket.

use std::time::Duration;

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Maximum number of keys a single batch delete may carry (S3 limit)
pub const MAX_DELETE_BATCH: usize = 1000;

/// Group URI that represents anonymous access in an ACL grant
pub const ALL_USERS_URI: &str = "http://acs.amazonaws.com/groups/global/AllUsers";

/// Access level requested when writing an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Readable by anyone holding the URL
    Public,
    /// Bucket default; reachable only via presigned URLs
    #[default]
    Private,
}

impl Visibility {
    /// Map a caller's `make_public` flag to a visibility
    pub const fn from_public_flag(public: bool) -> Self {
        if public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }

    pub const fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }
}

/// Metadata for a stored object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object key
    pub key: String,

    /// Size in bytes
    pub size_bytes: i64,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    /// Content type, only known from metadata lookups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for a key
    pub fn new(key: impl Into<String>, size: i64) -> Self {
        Self {
            key: key.into(),
            size_bytes: size,
            last_modified: None,
            content_type: None,
        }
    }
}

/// One page of a prefix listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Objects on this page
    pub items: Vec<ObjectInfo>,

    /// Token for the next page; `None` when the listing is exhausted
    pub continuation_token: Option<String>,
}

/// Permission carried by an ACL grant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    Read,
    Write,
    ReadAcp,
    WriteAcp,
    FullControl,
    Other(String),
}

/// The principal an ACL grant applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grantee {
    /// A predefined group, identified by URI
    Group(String),
    /// A canonical user id
    CanonicalUser(String),
    /// Anything the adapter could not classify
    Unknown,
}

/// A single access control grant on an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub grantee: Grantee,
    pub permission: Permission,
}

impl Grant {
    pub fn new(grantee: Grantee, permission: Permission) -> Self {
        Self {
            grantee,
            permission,
        }
    }

    /// Whether this grant lets anonymous users read the object
    pub fn allows_public_read(&self) -> bool {
        matches!(&self.grantee, Grantee::Group(uri) if uri == ALL_USERS_URI)
            && matches!(self.permission, Permission::Read | Permission::FullControl)
    }
}

/// Trait for bucket-scoped storage operations
///
/// This trait is implemented by the S3 adapter and the in-memory store, and
/// can be mocked for testing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object, applying a public-read ACL when requested
    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: Option<String>,
        visibility: Visibility,
    ) -> Result<()>;

    /// Get object metadata; fails with `NotFound` if the key is absent
    async fn head_object(&self, key: &str) -> Result<ObjectInfo>;

    /// Get the ACL grants of an object
    async fn get_object_acl(&self, key: &str) -> Result<Vec<Grant>>;

    /// List one page of objects whose keys start with `prefix`
    async fn list_page(&self, prefix: &str, continuation_token: Option<String>)
    -> Result<ListPage>;

    /// Delete a single object
    async fn delete_object(&self, key: &str) -> Result<()>;

    /// Delete up to [`MAX_DELETE_BATCH`] objects in one quiet call
    async fn delete_objects(&self, keys: &[String]) -> Result<()>;

    /// Generate a time-limited read URL
    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String>;
}
