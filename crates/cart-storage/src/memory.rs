use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    Result, StorageError,
    store::{BlobStore, StoredBlob, validate_key},
};

/// In-memory blob store implementation.
///
/// Used by tests and as the default when no durable backend is configured.
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct InMemoryBlobStore {
    blobs: Arc<RwLock<HashMap<String, StoredBlob>>>,
    fail_on_save: Arc<AtomicBool>,
}

impl InMemoryBlobStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the store to fail every subsequent save.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.fail_on_save.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of stored blobs.
    pub async fn blob_count(&self) -> usize {
        self.blobs.read().await.len()
    }

    /// Clears all blobs.
    pub async fn clear(&self) {
        self.blobs.write().await.clear();
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn load(&self, key: &str) -> Result<Option<StoredBlob>> {
        validate_key(key)?;
        Ok(self.blobs.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, payload: serde_json::Value) -> Result<StoredBlob> {
        validate_key(key)?;

        if self.fail_on_save.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::other(
                "simulated storage failure",
            )));
        }

        let mut blobs = self.blobs.write().await;
        let blob = match blobs.get(key) {
            Some(existing) => existing.next(payload),
            None => StoredBlob::new(key, payload),
        };
        blobs.insert(key.to_string(), blob.clone());
        Ok(blob)
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(self.blobs.write().await.remove(key).is_some())
    }
}
