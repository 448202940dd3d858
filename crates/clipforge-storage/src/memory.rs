//! In-process object store for tests and local runs.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use crate::error::{Operation, StorageError, StorageResult};
use crate::object_store::ObjectStore;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: String,
}

/// `HashMap`-backed [`ObjectStore`]. Signed URLs use a `memory://` scheme.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, StoredObject>>,
    failing_prefix: Mutex<Option<String>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every upload to a key starting with `prefix` fail.
    pub fn fail_uploads_with_prefix(&self, prefix: impl Into<String>) {
        *self.lock_prefix() = Some(prefix.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().get(key).map(|o| o.data.clone())
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.lock().get(key).map(|o| o.content_type.clone())
    }

    /// Sorted keys.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredObject>> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_prefix(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.failing_prefix
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn insert(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<()> {
        if let Some(prefix) = self.lock_prefix().as_deref() {
            if key.starts_with(prefix) {
                return Err(StorageError::request(Operation::Put, key, "injected failure"));
            }
        }
        self.lock().insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()> {
        let data = tokio::fs::read(path).await?;
        self.insert(key, data, content_type)
    }

    async fn put_bytes(&self, data: Vec<u8>, key: &str, content_type: &str) -> StorageResult<()> {
        self.insert(key, data, content_type)
    }

    async fn get_to_file(&self, key: &str, path: &Path) -> StorageResult<()> {
        let data = self.get(key).ok_or_else(|| StorageError::not_found(key))?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, data).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.lock().remove(key);
        Ok(())
    }

    async fn signed_download_url(&self, key: &str, ttl: Duration) -> StorageResult<String> {
        if !self.contains(key) {
            return Err(StorageError::not_found(key));
        }
        let expires = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .saturating_add(ttl)
            .as_secs();
        Ok(format!("memory://{}?expires={}", key, expires))
    }

    async fn check_connectivity(&self) -> StorageResult<()> {
        Ok(())
    }
}
