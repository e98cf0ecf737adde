use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, StorageError};

/// A persisted blob together with its bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBlob {
    /// The key the blob is stored under.
    pub key: String,

    /// The stored document.
    pub payload: serde_json::Value,

    /// Number of times the key has been written, starting at 1.
    pub revision: i64,

    /// When the blob was last written.
    pub updated_at: DateTime<Utc>,
}

impl StoredBlob {
    /// Creates the first revision of a blob.
    pub fn new(key: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            payload,
            revision: 1,
            updated_at: Utc::now(),
        }
    }

    /// Returns the next revision of this blob carrying a new payload.
    pub fn next(&self, payload: serde_json::Value) -> Self {
        Self {
            key: self.key.clone(),
            payload,
            revision: self.revision + 1,
            updated_at: Utc::now(),
        }
    }
}

/// Core trait for blob store implementations.
///
/// Each key holds exactly one document; saving replaces it wholesale
/// (last write wins). All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Loads the blob stored under `key`.
    ///
    /// Returns None if nothing has been saved under that key.
    async fn load(&self, key: &str) -> Result<Option<StoredBlob>>;

    /// Replaces the blob stored under `key`.
    ///
    /// Returns the stored blob with its new revision.
    async fn save(&self, key: &str, payload: serde_json::Value) -> Result<StoredBlob>;

    /// Removes the blob stored under `key`.
    ///
    /// Returns true if a blob was removed.
    async fn remove(&self, key: &str) -> Result<bool>;
}

/// Checks that a key is usable by every backend, including as a file name.
pub fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key.len() <= 128
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
