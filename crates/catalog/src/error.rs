use thiserror::Error;

/// Errors that can occur when reading or administering the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Input rejected before any remote call.
    #[error("{0}")]
    Validation(String),

    /// The product does not exist in the remote catalog.
    #[error("Product not found: {0}")]
    NotFound(String),

    /// The remote catalog was unreachable or returned an error.
    #[error("Catalog provider error: {0}")]
    Provider(String),
}

impl CatalogError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
