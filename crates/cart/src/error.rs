//! Cart error types.

use cart_storage::StorageError;
use thiserror::Error;

/// Errors that can occur when loading or persisting a cart.
///
/// Cart mutations themselves never fail; these only surface from
/// [`CartStore::try_open`](crate::CartStore::try_open) and
/// [`CartStore::clear_and_persist`](crate::CartStore::clear_and_persist).
#[derive(Debug, Error)]
pub enum CartError {
    /// The underlying blob store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The persisted blob could not be decoded.
    #[error("Persisted cart is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// The persisted blob was written by a newer layout.
    #[error("Unsupported cart layout version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

/// Result type for cart persistence operations.
pub type Result<T> = std::result::Result<T, CartError>;
