//! The cart store: ordered entries plus persistence.

use std::sync::Arc;

use cart_storage::{BlobStore, StorageError};
use common::{EntryId, Money, Product, ProductId};
use serde::{Deserialize, Serialize};

use crate::display::{self, DisplayRow};
use crate::entry::CartEntry;
use crate::error::{CartError, Result};

/// Current persisted layout version.
pub const LAYOUT_VERSION: u32 = 1;

/// Upper bound for [`CartStore::update_quantity`].
pub const MAX_UNITS_PER_PRODUCT: usize = 999;

#[derive(Serialize)]
struct PersistedCartRef<'a> {
    version: u32,
    entries: &'a [CartEntry],
}

#[derive(Deserialize)]
struct PersistedCart {
    version: u32,
    entries: Vec<CartEntry>,
}

/// Shopping cart holding one entry per unit.
///
/// Entries are kept in insertion order, which is also the default display
/// order. Every mutation rewrites the full entry list to the blob store
/// before returning. A failed write is logged and counted but does not fail
/// the mutation; the in-memory cart stays authoritative.
pub struct CartStore {
    store: Arc<dyn BlobStore>,
    key: String,
    entries: Vec<CartEntry>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.key)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl CartStore {
    /// Restores the cart stored under `key`, or starts empty.
    ///
    /// A blob that cannot be decoded is logged and replaced by an empty cart
    /// on the next write. Storage failures are returned.
    #[tracing::instrument(skip(store))]
    pub async fn open(store: Arc<dyn BlobStore>, key: &str) -> Result<Self> {
        match Self::try_open(Arc::clone(&store), key).await {
            Ok(cart) => Ok(cart),
            Err(e @ (CartError::Corrupt(_) | CartError::UnsupportedVersion { .. })) => {
                tracing::warn!(key, error = %e, "discarding unreadable cart");
                Ok(Self::empty(store, key))
            }
            Err(e) => Err(e),
        }
    }

    /// Restores the cart stored under `key`, failing on an unreadable blob.
    pub async fn try_open(store: Arc<dyn BlobStore>, key: &str) -> Result<Self> {
        let entries = match store.load(key).await? {
            Some(blob) => {
                let persisted: PersistedCart = serde_json::from_value(blob.payload)?;
                if persisted.version != LAYOUT_VERSION {
                    return Err(CartError::UnsupportedVersion {
                        found: persisted.version,
                        expected: LAYOUT_VERSION,
                    });
                }
                persisted.entries
            }
            None => Vec::new(),
        };

        tracing::debug!(key, entries = entries.len(), "cart restored");
        Ok(Self {
            store,
            key: key.to_string(),
            entries,
        })
    }

    fn empty(store: Arc<dyn BlobStore>, key: &str) -> Self {
        Self {
            store,
            key: key.to_string(),
            entries: Vec::new(),
        }
    }

    // Mutations

    /// Appends one unit of `product`.
    #[tracing::instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_to_cart(&mut self, product: &Product) -> EntryId {
        let entry = CartEntry::from_product(product);
        let entry_id = entry.entry_id;
        self.entries.push(entry);

        tracing::debug!(%entry_id, "unit added");
        self.commit("add").await;
        entry_id
    }

    /// Removes the oldest unit of a product, or every unit when `remove_all`.
    ///
    /// Returns the number of entries removed; zero when the product is absent.
    #[tracing::instrument(skip(self))]
    pub async fn remove_from_cart(&mut self, product_id: &ProductId, remove_all: bool) -> usize {
        let before = self.entries.len();

        if remove_all {
            self.entries.retain(|e| &e.product_id != product_id);
        } else if let Some(pos) = self.entries.iter().position(|e| &e.product_id == product_id) {
            self.entries.remove(pos);
        }

        let removed = before - self.entries.len();
        if removed > 0 {
            self.commit("remove").await;
        }
        removed
    }

    /// Reconciles the number of units of a product to `new_quantity`.
    ///
    /// Growing clones the product's first entry, so the snapshot is never
    /// re-fetched. Shrinking keeps the oldest entries. A product that is not
    /// in the cart cannot grow, since there is nothing to clone. Requests
    /// above [`MAX_UNITS_PER_PRODUCT`] are clamped to it.
    ///
    /// Returns the resulting quantity.
    #[tracing::instrument(skip(self))]
    pub async fn update_quantity(&mut self, product_id: &ProductId, new_quantity: i64) -> usize {
        if new_quantity <= 0 {
            self.remove_from_cart(product_id, true).await;
            return 0;
        }

        let requested = usize::try_from(new_quantity).unwrap_or(usize::MAX);
        let target = requested.min(MAX_UNITS_PER_PRODUCT);
        if target < requested {
            tracing::warn!(requested, target, "quantity clamped");
        }
        let current = self.quantity_of(product_id);
        if target == current {
            return current;
        }

        if target > current {
            let Some(template) = self.entries.iter().find(|e| &e.product_id == product_id) else {
                tracing::debug!("no unit to clone, quantity unchanged");
                return 0;
            };
            let template = template.clone();
            self.entries
                .extend((0..target - current).map(|_| template.duplicate()));
        } else {
            let mut seen = 0;
            self.entries.retain(|e| {
                if &e.product_id != product_id {
                    return true;
                }
                seen += 1;
                seen <= target
            });
        }

        tracing::debug!(from = current, to = target, "quantity updated");
        self.commit("update_quantity").await;
        target
    }

    /// Empties the cart.
    #[tracing::instrument(skip(self))]
    pub async fn clear_cart(&mut self) {
        self.entries.clear();
        self.commit("clear").await;
    }

    /// Empties the cart and reports whether the empty cart reached storage.
    ///
    /// The in-memory cart is cleared even when the write fails.
    #[tracing::instrument(skip(self))]
    pub async fn clear_and_persist(&mut self) -> Result<()> {
        self.entries.clear();
        metrics::counter!("cart_mutations_total", "op" => "clear").increment(1);
        self.write().await
    }

    async fn commit(&self, op: &'static str) {
        metrics::counter!("cart_mutations_total", "op" => op).increment(1);

        if let Err(e) = self.write().await {
            metrics::counter!("cart_persist_failures_total").increment(1);
            tracing::warn!(key = %self.key, op, error = %e, "failed to persist cart");
        }
    }

    async fn write(&self) -> Result<()> {
        let payload = serde_json::to_value(PersistedCartRef {
            version: LAYOUT_VERSION,
            entries: &self.entries,
        })
        .map_err(StorageError::from)?;
        self.store.save(&self.key, payload).await?;
        Ok(())
    }

    // Queries

    /// Returns the entries in insertion order.
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    /// Returns every entry ID in insertion order.
    pub fn entry_ids(&self) -> Vec<EntryId> {
        self.entries.iter().map(|e| e.entry_id).collect()
    }

    /// Returns the number of units of a product.
    pub fn quantity_of(&self, product_id: &ProductId) -> usize {
        self.entries
            .iter()
            .filter(|e| &e.product_id == product_id)
            .count()
    }

    /// Sum of every entry's price.
    pub fn get_total_value(&self) -> Money {
        self.entries.iter().map(|e| e.price).sum()
    }

    /// Total number of units.
    pub fn get_item_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Groups entries into display rows by first appearance.
    pub fn get_display_cart(&self) -> Vec<DisplayRow> {
        display::aggregate(&self.entries)
    }

    /// Sum of display-row subtotals.
    pub fn display_total(&self) -> Money {
        self.get_display_cart().iter().map(DisplayRow::subtotal).sum()
    }
}

#[cfg(test)]
mod tests {
    use cart_storage::InMemoryBlobStore;

    use super::*;

    const KEY: &str = "tmn-cart";

    fn product(id: &str, cents: i64) -> Product {
        Product::new(id, format!("Product {id}"), Money::from_cents(cents))
    }

    async fn open_cart() -> (CartStore, InMemoryBlobStore) {
        let blobs = InMemoryBlobStore::new();
        let cart = CartStore::open(Arc::new(blobs.clone()), KEY).await.unwrap();
        (cart, blobs)
    }

    #[tokio::test]
    async fn new_cart_is_empty() {
        let (cart, _) = open_cart().await;
        assert!(cart.is_empty());
        assert_eq!(cart.get_item_count(), 0);
        assert_eq!(cart.get_total_value(), Money::zero());
        assert!(cart.get_display_cart().is_empty());
    }

    #[tokio::test]
    async fn add_appends_one_entry_per_call() {
        let (mut cart, _) = open_cart().await;
        let a = product("A", 1000);

        let first = cart.add_to_cart(&a).await;
        let second = cart.add_to_cart(&a).await;

        assert_ne!(first, second);
        assert_eq!(cart.get_item_count(), 2);
        assert_eq!(cart.quantity_of(&a.id), 2);
    }

    #[tokio::test]
    async fn remove_one_takes_oldest() {
        let (mut cart, _) = open_cart().await;
        let a = product("A", 1000);
        let first = cart.add_to_cart(&a).await;
        let second = cart.add_to_cart(&a).await;

        let removed = cart.remove_from_cart(&a.id, false).await;

        assert_eq!(removed, 1);
        assert_eq!(cart.entry_ids(), vec![second]);
        assert!(!cart.entry_ids().contains(&first));
    }

    #[tokio::test]
    async fn remove_all_drops_every_unit() {
        let (mut cart, _) = open_cart().await;
        let a = product("A", 1000);
        let b = product("B", 500);
        cart.add_to_cart(&a).await;
        cart.add_to_cart(&b).await;
        cart.add_to_cart(&a).await;

        assert_eq!(cart.remove_from_cart(&a.id, true).await, 2);
        assert_eq!(cart.get_item_count(), 1);
        assert!(cart.get_display_cart().iter().all(|r| r.product_id != a.id));
    }

    #[tokio::test]
    async fn remove_missing_product_is_noop() {
        let (mut cart, _) = open_cart().await;
        cart.add_to_cart(&product("A", 1000)).await;

        assert_eq!(cart.remove_from_cart(&ProductId::new("missing"), false).await, 0);
        assert_eq!(cart.remove_from_cart(&ProductId::new("missing"), true).await, 0);
        assert_eq!(cart.get_item_count(), 1);
    }

    #[tokio::test]
    async fn update_quantity_grows_by_cloning_snapshot() {
        let (mut cart, _) = open_cart().await;
        let a = product("A", 1000);
        cart.add_to_cart(&a).await;

        assert_eq!(cart.update_quantity(&a.id, 3).await, 3);

        assert_eq!(cart.quantity_of(&a.id), 3);
        assert!(cart.entries().iter().all(|e| e.price.cents() == 1000));
        assert_eq!(cart.get_total_value().cents(), 3000);
    }

    #[tokio::test]
    async fn update_quantity_shrinks_keeping_oldest() {
        let (mut cart, _) = open_cart().await;
        let a = product("A", 1000);
        let first = cart.add_to_cart(&a).await;
        let second = cart.add_to_cart(&a).await;
        cart.add_to_cart(&a).await;

        cart.update_quantity(&a.id, 2).await;

        assert_eq!(cart.entry_ids(), vec![first, second]);
    }

    #[tokio::test]
    async fn update_quantity_zero_or_negative_removes_all() {
        let (mut cart, _) = open_cart().await;
        let a = product("A", 1000);
        cart.add_to_cart(&a).await;
        cart.add_to_cart(&a).await;

        assert_eq!(cart.update_quantity(&a.id, -4).await, 0);
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn update_quantity_same_is_noop() {
        let (mut cart, blobs) = open_cart().await;
        let a = product("A", 1000);
        cart.add_to_cart(&a).await;
        let before = blobs.load(KEY).await.unwrap().unwrap().revision;

        cart.update_quantity(&a.id, 1).await;

        let after = blobs.load(KEY).await.unwrap().unwrap().revision;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn update_quantity_cannot_grow_absent_product() {
        let (mut cart, _) = open_cart().await;
        assert_eq!(cart.update_quantity(&ProductId::new("ghost"), 2).await, 0);
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn update_quantity_interleaves_after_other_products() {
        let (mut cart, _) = open_cart().await;
        let a = product("A", 100);
        let b = product("B", 200);
        cart.add_to_cart(&a).await;
        cart.add_to_cart(&b).await;

        cart.update_quantity(&a.id, 2).await;

        let ids: Vec<&str> = cart.entries().iter().map(|e| e.product_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "A"]);
        let rows = cart.get_display_cart();
        assert_eq!(rows[0].product_id.as_str(), "A");
        assert_eq!(rows[0].quantity, 2);
    }

    #[tokio::test]
    async fn mutations_persist_immediately() {
        let (mut cart, blobs) = open_cart().await;
        cart.add_to_cart(&product("A", 1000)).await;

        let blob = blobs.load(KEY).await.unwrap().unwrap();
        assert_eq!(blob.payload["version"], 1);
        assert_eq!(blob.payload["entries"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn persist_failure_does_not_fail_mutation() {
        let (mut cart, blobs) = open_cart().await;
        blobs.set_fail_on_save(true);

        cart.add_to_cart(&product("A", 1000)).await;

        assert_eq!(cart.get_item_count(), 1);
        assert!(blobs.load(KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_and_persist_reports_failure_but_clears() {
        let (mut cart, blobs) = open_cart().await;
        cart.add_to_cart(&product("A", 1000)).await;
        blobs.set_fail_on_save(true);

        let result = cart.clear_and_persist().await;

        assert!(matches!(result, Err(CartError::Storage(_))));
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn corrupt_blob_starts_empty() {
        let blobs = InMemoryBlobStore::new();
        blobs
            .save(KEY, serde_json::json!({"version": 1, "entries": "nope"}))
            .await
            .unwrap();

        let strict = CartStore::try_open(Arc::new(blobs.clone()), KEY).await;
        assert!(matches!(strict, Err(CartError::Corrupt(_))));

        let cart = CartStore::open(Arc::new(blobs), KEY).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn newer_layout_is_rejected() {
        let blobs = InMemoryBlobStore::new();
        blobs
            .save(KEY, serde_json::json!({"version": 2, "entries": []}))
            .await
            .unwrap();

        let strict = CartStore::try_open(Arc::new(blobs), KEY).await;
        assert!(matches!(
            strict,
            Err(CartError::UnsupportedVersion { found: 2, expected: 1 })
        ));
    }

    #[tokio::test]
    async fn display_total_matches_total_value() {
        let (mut cart, _) = open_cart().await;
        cart.add_to_cart(&product("p1", 999)).await;
        cart.add_to_cart(&product("p2", 450)).await;
        cart.add_to_cart(&product("p1", 999)).await;

        assert_eq!(cart.display_total(), cart.get_total_value());
        assert_eq!(cart.get_total_value().cents(), 2448);
    }
    #[tokio::test]
    async fn update_quantity_clamps_huge_requests() {
        let (mut cart, blobs) = open_cart().await;
        let a = product("A", 1000);
        cart.add_to_cart(&a).await;

        let quantity = cart.update_quantity(&a.id, i64::MAX).await;

        assert_eq!(quantity, MAX_UNITS_PER_PRODUCT);
        assert_eq!(cart.quantity_of(&a.id), MAX_UNITS_PER_PRODUCT);
        assert_eq!(cart.get_total_value().cents(), 1000 * MAX_UNITS_PER_PRODUCT as i64);

        let reopened = CartStore::open(Arc::new(blobs), KEY).await.unwrap();
        assert_eq!(reopened.get_item_count(), MAX_UNITS_PER_PRODUCT);
    }

    #[tokio::test]
    async fn oversized_prices_never_overflow_totals() {
        let too_big = serde_json::from_str::<Product>(r#"{"id":"B","name":"Big","price":1e17}"#);
        assert!(too_big.is_err());

        let (mut cart, _) = open_cart().await;
        let big = Product::new("B", "Big", Money::from_cents(i64::MAX));
        cart.add_to_cart(&big).await;
        cart.add_to_cart(&big).await;

        assert_eq!(cart.get_total_value().cents(), i64::MAX);
        assert_eq!(cart.display_total().cents(), i64::MAX);
        assert!(!cart.get_display_cart()[0].subtotal().is_negative());
    }
}
