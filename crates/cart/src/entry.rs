//! A single unit held in the cart.

use common::{Category, EntryId, Money, Product, ProductId, money};
use serde::{Deserialize, Serialize};

/// One physical unit of a product.
///
/// Carries a snapshot of the product taken when the unit was added. The
/// quantity of an entry is always one; a product's quantity is the number
/// of entries that reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub entry_id: EntryId,
    pub product_id: ProductId,
    pub name: String,
    #[serde(with = "money::decimal")]
    pub price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl CartEntry {
    /// Snapshots a product into a fresh entry.
    pub fn from_product(product: &Product) -> Self {
        Self {
            entry_id: EntryId::new(),
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            description: product.description.clone(),
            category: product.category,
            image_url: product.image_url.clone(),
        }
    }

    /// Returns another unit with the same snapshot and a new entry ID.
    pub fn duplicate(&self) -> Self {
        Self {
            entry_id: EntryId::new(),
            ..self.clone()
        }
    }

    /// Always 1.
    pub fn quantity(&self) -> u32 {
        1
    }
}
