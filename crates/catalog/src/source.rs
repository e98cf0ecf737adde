//! The remote catalog seam and an in-memory implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use common::ProductId;
use tokio::sync::RwLock;

use crate::admin::{PatchOperation, ValidatedProduct};
use crate::error::{CatalogError, Result};
use crate::product::CatalogProduct;

/// One page of catalog results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogPage {
    pub products: Vec<CatalogProduct>,
    /// Total number of products, when the provider reports it.
    pub total_items: Option<u64>,
}

/// Remote product catalog.
///
/// Pages are 1-based.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<CatalogPage>;

    async fn get_product(&self, id: &ProductId) -> Result<CatalogProduct>;

    async fn create_product(&self, product: &ValidatedProduct) -> Result<CatalogProduct>;

    /// Applies JSON-patch operations to an existing product.
    async fn update_product(&self, id: &ProductId, ops: &[PatchOperation]) -> Result<()>;
}

#[async_trait]
impl<T: CatalogSource + ?Sized> CatalogSource for Arc<T> {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<CatalogPage> {
        (**self).fetch_page(page, page_size).await
    }

    async fn get_product(&self, id: &ProductId) -> Result<CatalogProduct> {
        (**self).get_product(id).await
    }

    async fn create_product(&self, product: &ValidatedProduct) -> Result<CatalogProduct> {
        (**self).create_product(product).await
    }

    async fn update_product(&self, id: &ProductId, ops: &[PatchOperation]) -> Result<()> {
        (**self).update_product(id, ops).await
    }
}

/// In-memory catalog for tests and local development.
///
/// Can be told to misreport its total or fail every call, to exercise the
/// pagination guards.
#[derive(Clone, Default)]
pub struct InMemoryCatalogSource {
    products: Arc<RwLock<Vec<CatalogProduct>>>,
    reported_total: Arc<RwLock<Option<Option<u64>>>>,
    repeat_last_page: Arc<AtomicBool>,
    fail: Arc<AtomicBool>,
    pages_served: Arc<AtomicUsize>,
}

impl InMemoryCatalogSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<CatalogProduct>) -> Self {
        Self {
            products: Arc::new(RwLock::new(products)),
            ..Self::default()
        }
    }

    /// Overrides the `total_items` reported on every page.
    pub async fn set_reported_total(&self, total: Option<u64>) {
        *self.reported_total.write().await = Some(total);
    }

    /// Serves a full page for every page number, as a broken provider might.
    pub fn set_repeat_last_page(&self, repeat: bool) {
        self.repeat_last_page.store(repeat, Ordering::SeqCst);
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn pages_served(&self) -> usize {
        self.pages_served.load(Ordering::SeqCst)
    }

    pub async fn products(&self) -> Vec<CatalogProduct> {
        self.products.read().await.clone()
    }

    fn check_fail(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CatalogError::provider("simulated catalog outage"));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalogSource {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<CatalogPage> {
        self.check_fail()?;
        self.pages_served.fetch_add(1, Ordering::SeqCst);

        let products = self.products.read().await;
        let size = page_size as usize;
        let start = if self.repeat_last_page.load(Ordering::SeqCst) {
            0
        } else {
            (page.saturating_sub(1) as usize).saturating_mul(size)
        };
        let slice: Vec<CatalogProduct> = products.iter().skip(start).take(size).cloned().collect();

        let total_items = match *self.reported_total.read().await {
            Some(reported) => reported,
            None => Some(products.len() as u64),
        };

        Ok(CatalogPage {
            products: slice,
            total_items,
        })
    }

    async fn get_product(&self, id: &ProductId) -> Result<CatalogProduct> {
        self.check_fail()?;
        self.products
            .read()
            .await
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    async fn create_product(&self, product: &ValidatedProduct) -> Result<CatalogProduct> {
        self.check_fail()?;
        let mut products = self.products.write().await;
        let created = CatalogProduct {
            id: ProductId::new(format!("PROD-{:04}", products.len() + 1)),
            name: product.name.clone(),
            description: Some(product.description.clone()),
            product_type: Some(product.product_type.as_str().to_string()),
            category: Some(product.category.as_str().to_string()),
            image_url: Some(product.image_url.clone()),
            home_url: Some(product.home_url.clone()),
            price: None,
        };
        products.push(created.clone());
        Ok(created)
    }

    async fn update_product(&self, id: &ProductId, ops: &[PatchOperation]) -> Result<()> {
        self.check_fail()?;
        let mut products = self.products.write().await;
        let product = products
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;

        for op in ops {
            let value = Some(op.value.clone());
            match op.path.as_str() {
                "/name" => product.name = op.value.clone(),
                "/description" => product.description = value,
                "/category" => product.category = value,
                "/image_url" => product.image_url = value,
                "/home_url" => product.home_url = value,
                other => {
                    return Err(CatalogError::validation(format!(
                        "Unsupported patch path: {other}"
                    )));
                }
            }
        }
        Ok(())
    }
}
