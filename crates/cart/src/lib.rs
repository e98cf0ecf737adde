//! Shopping cart for the storefront.
//!
//! This crate provides:
//! - [`CartEntry`]: one unit of a product with an add-time snapshot
//! - [`CartStore`]: ordered entries, mutations and persistence
//! - [`DisplayRow`] and [`aggregate`]: per-product rows derived on read

pub mod display;
pub mod entry;
pub mod error;
pub mod store;

pub use display::{DisplayRow, aggregate};
pub use entry::CartEntry;
pub use error::{CartError, Result};
pub use store::{CartStore, LAYOUT_VERSION, MAX_UNITS_PER_PRODUCT};
