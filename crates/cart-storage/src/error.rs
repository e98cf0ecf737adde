use thiserror::Error;

/// Errors that can occur when reading or writing persisted blobs.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The key is empty or contains characters outside `[A-Za-z0-9_-]`.
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    /// A filesystem error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
