//! Object store capability.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use vtx_models::StoreUri;

use crate::error::StorageResult;

/// Validity of a presigned upload (PUT) URL.
pub const UPLOAD_URL_TTL: Duration = Duration::from_secs(30);

/// Validity of a presigned result download (GET) URL.
pub const RESULT_URL_TTL: Duration = Duration::from_secs(60);

/// Byte-object storage addressed by `store://bucket/key` references.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the whole object into a local file, creating parent directories.
    async fn download_file(&self, uri: &StoreUri, path: &Path) -> StorageResult<()>;

    /// Write a local file to the object.
    async fn upload_file(&self, path: &Path, uri: &StoreUri, content_type: &str)
        -> StorageResult<()>;

    /// Time-limited GET URL for the object.
    async fn presign_get(&self, uri: &StoreUri, expires_in: Duration) -> StorageResult<String>;

    /// Time-limited PUT URL bound to `content_type`.
    async fn presign_put(
        &self,
        uri: &StoreUri,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Cheap reachability check for readiness probes.
    async fn check_connectivity(&self) -> StorageResult<()>;
}
