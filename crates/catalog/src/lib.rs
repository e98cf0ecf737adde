//! Remote product catalog access.
//!
//! [`CatalogClient`] pages through a [`CatalogSource`] with a fixed page size
//! and a hard page ceiling, and wraps the admin operations (create, update,
//! retire) with input validation.

pub mod admin;
pub mod client;
pub mod error;
pub mod product;
pub mod source;

pub use admin::{NewProduct, PatchOperation, ProductUpdate, ValidatedProduct};
pub use client::{CatalogClient, CatalogListing, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE};
pub use error::{CatalogError, Result};
pub use product::{CatalogCategory, CatalogProduct, ProductType};
pub use source::{CatalogPage, CatalogSource, InMemoryCatalogSource};
