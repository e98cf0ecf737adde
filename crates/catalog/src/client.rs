//! Catalog client: full listing with bounded pagination, plus admin operations.

use common::{Money, Product, ProductId};
use serde::Serialize;

use crate::admin::{NewProduct, ProductUpdate, no_inventory_name};
use crate::error::Result;
use crate::product::CatalogProduct;
use crate::source::CatalogSource;

/// Provider maximum page size.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Hard ceiling on pages fetched by one listing.
pub const DEFAULT_MAX_PAGES: u32 = 100;

/// Result of listing the whole catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogListing {
    pub products: Vec<Product>,
    pub total_count: usize,
}

/// Client over a [`CatalogSource`].
pub struct CatalogClient<S: CatalogSource> {
    source: S,
    page_size: u32,
    max_pages: u32,
    default_price: Money,
}

impl<S: CatalogSource> CatalogClient<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            default_price: Money::from_cents(1000),
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Price given to products the catalog lists without one.
    pub fn with_default_price(mut self, price: Money) -> Self {
        self.default_price = price;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetches every page of raw catalog records.
    ///
    /// Stops on an empty page, a short page, or once the accumulated count
    /// reaches the reported total. Never fetches more than `max_pages`.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_all(&self) -> Result<Vec<CatalogProduct>> {
        let mut all = Vec::new();
        let mut page = 1;

        loop {
            if page > self.max_pages {
                tracing::warn!(
                    max_pages = self.max_pages,
                    fetched = all.len(),
                    "page limit reached, stopping pagination"
                );
                break;
            }

            let batch = self.source.fetch_page(page, self.page_size).await?;
            metrics::counter!("catalog_pages_fetched_total").increment(1);

            let received = batch.products.len();
            if received == 0 {
                tracing::debug!(page, "empty page, stopping pagination");
                break;
            }
            all.extend(batch.products);
            tracing::debug!(page, received, total = all.len(), "fetched catalog page");

            if received < self.page_size as usize {
                break;
            }
            if batch
                .total_items
                .is_some_and(|total| total > 0 && all.len() as u64 >= total)
            {
                break;
            }
            page += 1;
        }

        tracing::info!(count = all.len(), "catalog fetch complete");
        Ok(all)
    }

    /// Lists the whole catalog as purchasable products.
    pub async fn list_products(&self) -> Result<CatalogListing> {
        let products: Vec<Product> = self
            .fetch_all()
            .await?
            .iter()
            .map(|p| p.to_product(self.default_price))
            .collect();

        Ok(CatalogListing {
            total_count: products.len(),
            products,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: &ProductId) -> Result<CatalogProduct> {
        self.source.get_product(id).await
    }

    /// Validates and creates a product.
    #[tracing::instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, product: &NewProduct) -> Result<CatalogProduct> {
        let validated = product.validate()?;
        let created = self.source.create_product(&validated).await?;
        tracing::info!(product_id = %created.id, "catalog product created");
        Ok(created)
    }

    /// Replaces the provided fields of a product.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_product(&self, id: &ProductId, update: &ProductUpdate) -> Result<()> {
        let ops = update.to_patch()?;
        self.source.update_product(id, &ops).await?;
        tracing::info!(product_id = %id, fields = ops.len(), "catalog product updated");
        Ok(())
    }

    /// Marks a product out of stock by suffixing its name.
    ///
    /// The catalog has no delete; this is how products are retired.
    #[tracing::instrument(skip(self))]
    pub async fn mark_no_inventory(&self, id: &ProductId) -> Result<()> {
        let current = self.source.get_product(id).await?;
        let name = if current.name.is_empty() {
            "Unnamed Product"
        } else {
            current.name.as_str()
        };
        self.update_product(id, &ProductUpdate::rename(no_inventory_name(name)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use crate::source::InMemoryCatalogSource;

    fn products(n: usize) -> Vec<CatalogProduct> {
        (0..n)
            .map(|i| CatalogProduct::new(format!("PROD-{i}"), format!("Item {i}")))
            .collect()
    }

    #[tokio::test]
    async fn lists_single_short_page() {
        let source = InMemoryCatalogSource::with_products(products(7));
        let client = CatalogClient::new(source.clone());

        let listing = client.list_products().await.unwrap();

        assert_eq!(listing.total_count, 7);
        assert_eq!(source.pages_served(), 1);
    }

    #[tokio::test]
    async fn stops_when_total_reached_on_full_page() {
        let source = InMemoryCatalogSource::with_products(products(40));
        let client = CatalogClient::new(source.clone());

        let listing = client.list_products().await.unwrap();

        assert_eq!(listing.total_count, 40);
        assert_eq!(source.pages_served(), 2);
    }

    #[tokio::test]
    async fn fetches_trailing_empty_page_without_total() {
        let source = InMemoryCatalogSource::with_products(products(40));
        source.set_reported_total(None).await;
        let client = CatalogClient::new(source.clone());

        let listing = client.list_products().await.unwrap();

        assert_eq!(listing.total_count, 40);
        assert_eq!(source.pages_served(), 3);
    }

    #[tokio::test]
    async fn caps_pages_for_misbehaving_provider() {
        let source = InMemoryCatalogSource::with_products(products(20));
        source.set_reported_total(Some(1_000_000)).await;
        source.set_repeat_last_page(true);
        let client = CatalogClient::new(source.clone());

        let listing = client.list_products().await.unwrap();

        assert_eq!(source.pages_served(), 100);
        assert_eq!(listing.total_count, 2000);
    }

    #[tokio::test]
    async fn applies_default_price() {
        let mut priced = products(2);
        priced[1].price = Some(Money::from_cents(2500));
        let client = CatalogClient::new(InMemoryCatalogSource::with_products(priced));

        let listing = client.list_products().await.unwrap();

        assert_eq!(listing.products[0].price, Money::from_cents(1000));
        assert_eq!(listing.products[1].price, Money::from_cents(2500));
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let source = InMemoryCatalogSource::with_products(products(3));
        source.set_fail(true);
        let client = CatalogClient::new(source);

        let result = client.list_products().await;
        assert!(matches!(result, Err(CatalogError::Provider(_))));
    }

    #[tokio::test]
    async fn mark_no_inventory_is_idempotent() {
        let source = InMemoryCatalogSource::with_products(products(1));
        let client = CatalogClient::new(source.clone());
        let id = ProductId::new("PROD-0");

        client.mark_no_inventory(&id).await.unwrap();
        client.mark_no_inventory(&id).await.unwrap();

        let product = client.get_product(&id).await.unwrap();
        assert_eq!(product.name, "Item 0 | no inventory");
    }

    #[tokio::test]
    async fn mark_no_inventory_on_missing_product() {
        let client = CatalogClient::new(InMemoryCatalogSource::new());
        let result = client.mark_no_inventory(&ProductId::new("nope")).await;
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn invalid_create_never_reaches_source() {
        let source = InMemoryCatalogSource::new();
        let client = CatalogClient::new(source.clone());

        let result = client
            .create_product(&NewProduct::new("", "desc", "https://cdn.example.com/a.png"))
            .await;

        assert!(matches!(result, Err(CatalogError::Validation(_))));
        assert!(source.products().await.is_empty());
    }
}
