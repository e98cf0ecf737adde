//! Shared value types used across the storefront crates.

pub mod ids;
pub mod money;
pub mod product;

pub use ids::{EntryId, OrderId, ProductId};
pub use money::{MAX_PRICE_CENTS, Money, MoneyParseError};
pub use product::{Category, Product};
