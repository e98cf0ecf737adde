//! Persistence for named state blobs.
//!
//! The cart is stored as a single JSON document under a fixed key. This crate
//! only knows about keys and JSON payloads; the cart crate owns the layout.

pub mod error;
pub mod file;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StorageError};
pub use file::FileBlobStore;
pub use memory::InMemoryBlobStore;
pub use postgres::PostgresBlobStore;
pub use store::{BlobStore, StoredBlob, validate_key};
