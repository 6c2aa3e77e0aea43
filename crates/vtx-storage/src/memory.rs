//! In-process object store.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use vtx_models::StoreUri;

use crate::error::{StorageError, StorageResult};
use crate::object_store::ObjectStore;

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// `ObjectStore` backed by a map, with switchable transfer failures.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<StoreUri, StoredObject>>,
    fail_downloads: AtomicBool,
    fail_uploads: AtomicBool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object.
    pub fn put(&self, uri: &StoreUri, bytes: impl Into<Vec<u8>>, content_type: &str) {
        let mut objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects.insert(
            uri.clone(),
            StoredObject {
                bytes: bytes.into(),
                content_type: content_type.to_string(),
            },
        );
    }

    pub fn get(&self, uri: &StoreUri) -> Option<StoredObject> {
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects.get(uri).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every download fail.
    pub fn fail_downloads(&self, fail: bool) {
        self.fail_downloads.store(fail, Ordering::SeqCst);
    }

    /// Make every upload fail.
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn download_file(&self, uri: &StoreUri, path: &Path) -> StorageResult<()> {
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(StorageError::download_failed(format!("injected failure for {}", uri)));
        }
        let object = self
            .get(uri)
            .ok_or_else(|| StorageError::not_found(uri.to_string()))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, object.bytes).await?;
        Ok(())
    }

    async fn upload_file(
        &self,
        path: &Path,
        uri: &StoreUri,
        content_type: &str,
    ) -> StorageResult<()> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::upload_failed(format!("injected failure for {}", uri)));
        }
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;
        self.put(uri, bytes, content_type);
        Ok(())
    }

    async fn presign_get(&self, uri: &StoreUri, expires_in: Duration) -> StorageResult<String> {
        Ok(format!(
            "memory://{}/{}?method=GET&expires={}",
            uri.bucket(),
            uri.key(),
            expires_in.as_secs()
        ))
    }

    async fn presign_put(
        &self,
        uri: &StoreUri,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        Ok(format!(
            "memory://{}/{}?method=PUT&content-type={}&expires={}",
            uri.bucket(),
            uri.key(),
            content_type,
            expires_in.as_secs()
        ))
    }

    async fn check_connectivity(&self) -> StorageResult<()> {
        Ok(())
    }
}
