//! PayPal REST client.
//!
//! Implements [`PaymentProvider`] over the Orders v2 API and
//! [`CatalogSource`] over the Catalog Products v1 API.

use std::sync::Arc;

use async_trait::async_trait;
use catalog::{
    CatalogError, CatalogPage, CatalogProduct, CatalogSource, PatchOperation, ValidatedProduct,
};
use checkout::{
    CaptureResult, CheckoutError, CreatedOrder, OrderDetails, OrderRequest, PaymentProvider,
};
use common::{OrderId, ProductId};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use crate::auth::TokenCache;
use crate::config::PayPalConfig;
use crate::error::{PayPalError, Result};
use crate::wire::{OrderResponse, ProductList};

const ORDERS_PATH: &str = "/v2/checkout/orders";
const PRODUCTS_PATH: &str = "/v1/catalogs/products";
const REQUEST_ID_HEADER: &str = "PayPal-Request-Id";
const JSON_PATCH: &str = "application/json-patch+json";

/// PayPal REST API client.
///
/// Cheap to clone; clones share the HTTP connection pool and token cache.
#[derive(Clone)]
pub struct PayPalClient {
    inner: Arc<PayPalClientInner>,
}

struct PayPalClientInner {
    http: reqwest::Client,
    base: Url,
    tokens: TokenCache,
}

impl PayPalClient {
    /// Creates a client for the configured environment.
    pub fn new(config: &PayPalConfig) -> Result<Self> {
        let base = Url::parse(config.api_base())?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        tracing::info!(environment = %config.environment, base = %base, "PayPal client configured");

        Ok(Self {
            inner: Arc::new(PayPalClientInner {
                http,
                base,
                tokens: TokenCache::new(config.client_id.clone(), config.client_secret.clone()),
            }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }

    /// Builds an authorized request for `path` relative to the API base.
    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.inner.base.join(path)?;
        let token = self
            .inner
            .tokens
            .bearer(&self.inner.http, &self.inner.base)
            .await?;

        Ok(self
            .inner
            .http
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", token.expose_secret())))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        metrics::counter!("paypal_request_failures_total", "status" => status.as_u16().to_string())
            .increment(1);
        if status == StatusCode::UNAUTHORIZED {
            self.inner.tokens.invalidate().await;
        }
        let body = response.text().await.unwrap_or_default();
        let err = PayPalError::from_response(status, &body);
        tracing::warn!(%status, error = %err, "PayPal request failed");
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| PayPalError::Decode(e.to_string()))
    }

    /// Creates an order. Each call carries a fresh idempotency key.
    #[instrument(skip(self, request))]
    pub async fn post_order(&self, request: &OrderRequest) -> Result<OrderResponse> {
        let request_id = Uuid::new_v4();
        let builder = self
            .request(Method::POST, ORDERS_PATH)
            .await?
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .json(request);

        let order: OrderResponse = self.send_json(builder).await?;
        tracing::info!(order_id = %order.id, status = %order.status, %request_id, "PayPal order created");
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn post_capture(&self, order_id: &str) -> Result<OrderResponse> {
        let path = format!("{ORDERS_PATH}/{order_id}/capture");
        let builder = self
            .request(Method::POST, &path)
            .await?
            .header(CONTENT_TYPE, "application/json")
            .body("{}");

        let order: OrderResponse = self.send_json(builder).await?;
        tracing::info!(order_id = %order.id, status = %order.status, "PayPal order captured");
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn show_order(&self, order_id: &str) -> Result<OrderResponse> {
        let path = format!("{ORDERS_PATH}/{order_id}");
        self.send_json(self.request(Method::GET, &path).await?).await
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self, page: u32, page_size: u32) -> Result<ProductList> {
        let builder = self.request(Method::GET, PRODUCTS_PATH).await?.query(&[
            ("page_size", page_size.to_string()),
            ("page", page.to_string()),
            ("total_required", "true".to_string()),
        ]);

        let list: ProductList = self.send_json(builder).await?;
        tracing::debug!(
            page,
            items = list.items.len(),
            total_items = ?list.total_items,
            total_pages = ?list.total_pages,
            "fetched product page"
        );
        Ok(list)
    }

    #[instrument(skip(self))]
    pub async fn show_product(&self, id: &str) -> Result<CatalogProduct> {
        let path = format!("{PRODUCTS_PATH}/{id}");
        self.send_json(self.request(Method::GET, &path).await?).await
    }

    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_catalog_product(&self, product: &ValidatedProduct) -> Result<CatalogProduct> {
        let builder = self
            .request(Method::POST, PRODUCTS_PATH)
            .await?
            .header(reqwest::header::ACCEPT_LANGUAGE, "en_US")
            .json(product);

        let created: CatalogProduct = self.send_json(builder).await?;
        tracing::info!(product_id = %created.id, "PayPal product created");
        Ok(created)
    }

    #[instrument(skip(self, ops), fields(ops = ops.len()))]
    pub async fn patch_product(&self, id: &str, ops: &[PatchOperation]) -> Result<()> {
        let path = format!("{PRODUCTS_PATH}/{id}");
        let body = serde_json::to_vec(ops).map_err(|e| PayPalError::Decode(e.to_string()))?;
        let builder = self
            .request(Method::PATCH, &path)
            .await?
            .header(CONTENT_TYPE, JSON_PATCH)
            .body(body);

        self.send(builder).await?;
        tracing::info!(product_id = id, "PayPal product updated");
        Ok(())
    }
}

#[async_trait]
impl PaymentProvider for PayPalClient {
    async fn create_order(&self, request: &OrderRequest) -> checkout::Result<CreatedOrder> {
        let order = self
            .post_order(request)
            .await
            .map_err(|e| CheckoutError::provider(format!("Failed to create PayPal order: {e}")))?;

        Ok(CreatedOrder {
            id: OrderId::new(order.id),
            status: order.status,
        })
    }

    async fn capture_order(&self, order_id: &OrderId) -> checkout::Result<CaptureResult> {
        let order = self
            .post_capture(order_id.as_str())
            .await
            .map_err(|e| CheckoutError::provider(format!("Failed to capture PayPal order: {e}")))?;
        Ok(order.into_capture())
    }

    async fn get_order(&self, order_id: &OrderId) -> checkout::Result<OrderDetails> {
        let order = self
            .show_order(order_id.as_str())
            .await
            .map_err(|e| CheckoutError::provider(format!("Failed to get PayPal order: {e}")))?;
        Ok(order.into_details()?)
    }
}

#[async_trait]
impl CatalogSource for PayPalClient {
    async fn fetch_page(&self, page: u32, page_size: u32) -> catalog::Result<CatalogPage> {
        let list = self.list_products(page, page_size).await?;
        Ok(CatalogPage {
            products: list.items,
            total_items: list.total_items,
        })
    }

    async fn get_product(&self, id: &ProductId) -> catalog::Result<CatalogProduct> {
        Ok(self.show_product(id.as_str()).await?)
    }

    async fn create_product(&self, product: &ValidatedProduct) -> catalog::Result<CatalogProduct> {
        self.create_catalog_product(product).await.map_err(|e| match e {
            PayPalError::NotFound(msg) => CatalogError::NotFound(msg),
            other => CatalogError::provider(format!("Failed to create PayPal product: {other}")),
        })
    }

    async fn update_product(&self, id: &ProductId, ops: &[PatchOperation]) -> catalog::Result<()> {
        Ok(self.patch_product(id.as_str(), ops).await?)
    }
}
