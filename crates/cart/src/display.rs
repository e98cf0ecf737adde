//! Per-product display rows derived from cart entries.

use std::collections::HashMap;

use common::{Category, EntryId, Money, ProductId, money};
use serde::Serialize;

use crate::entry::CartEntry;

/// One row of the cart as shown to the shopper.
///
/// Never stored; rebuilt from the entries on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRow {
    pub product_id: ProductId,
    pub name: String,
    #[serde(with = "money::decimal")]
    pub unit_price: Money,
    pub quantity: u32,
    pub entry_ids: Vec<EntryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl DisplayRow {
    fn start(entry: &CartEntry) -> Self {
        Self {
            product_id: entry.product_id.clone(),
            name: entry.name.clone(),
            unit_price: entry.price,
            quantity: 0,
            entry_ids: Vec::new(),
            description: entry.description.clone(),
            category: entry.category,
            image_url: entry.image_url.clone(),
        }
    }

    /// Unit price times quantity.
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Groups entries by product in order of first appearance.
///
/// Snapshot fields come from the first entry of each group.
pub fn aggregate(entries: &[CartEntry]) -> Vec<DisplayRow> {
    let mut rows: Vec<DisplayRow> = Vec::new();
    let mut index: HashMap<&ProductId, usize> = HashMap::new();

    for entry in entries {
        let slot = *index.entry(&entry.product_id).or_insert_with(|| {
            rows.push(DisplayRow::start(entry));
            rows.len() - 1
        });
        let row = &mut rows[slot];
        row.quantity += 1;
        row.entry_ids.push(entry.entry_id);
    }

    rows
}
