use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    Result,
    store::{BlobStore, StoredBlob, validate_key},
};

/// Blob store that keeps one JSON file per key inside a directory.
///
/// Writes go to a temporary sibling file that is renamed over the target,
/// so a crash mid-write leaves the previous document intact.
pub struct FileBlobStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileBlobStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        tracing::debug!(dir = %dir.display(), "opened file blob store");
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    async fn read_blob(&self, key: &str) -> Result<Option<StoredBlob>> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn load(&self, key: &str) -> Result<Option<StoredBlob>> {
        validate_key(key)?;
        self.read_blob(key).await
    }

    async fn save(&self, key: &str, payload: serde_json::Value) -> Result<StoredBlob> {
        validate_key(key)?;
        let _guard = self.write_lock.lock().await;

        let blob = match self.read_blob(key).await {
            Ok(Some(existing)) => existing.next(payload),
            Ok(None) => StoredBlob::new(key, payload),
            Err(e) => {
                tracing::warn!(key, error = %e, "unreadable blob replaced");
                StoredBlob::new(key, payload)
            }
        };

        let target = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.{}.tmp", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&blob)?).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        Ok(blob)
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        let _guard = self.write_lock.lock().await;

        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
