//! Object storage seam used by the upload boundary and the worker.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StorageResult;

/// Content type for generated clips.
pub const CLIP_CONTENT_TYPE: &str = "video/mp4";

/// Durable blob storage with time-limited signed downloads.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a local file, streaming from disk.
    async fn put_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()>;

    async fn put_bytes(&self, data: Vec<u8>, key: &str, content_type: &str) -> StorageResult<()>;

    /// Download an object into a local file, creating parent directories.
    async fn get_to_file(&self, key: &str, path: &Path) -> StorageResult<()>;

    /// Delete an object. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// A URL granting GET access to `key` for `ttl`.
    async fn signed_download_url(&self, key: &str, ttl: Duration) -> StorageResult<String>;

    async fn check_connectivity(&self) -> StorageResult<()>;
}
