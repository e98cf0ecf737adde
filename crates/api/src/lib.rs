//! HTTP API server for the storefront.
//!
//! Exposes the cart, the catalog and the checkout orchestrator as REST
//! endpoints, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use cart::CartStore;
use catalog::{CatalogClient, CatalogSource, InMemoryCatalogSource};
use checkout::{CheckoutOrchestrator, InMemoryPaymentProvider, OrderContext, PaymentProvider};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub checkout: CheckoutOrchestrator,
    pub catalog: CatalogClient<Arc<dyn CatalogSource>>,
    pub metrics: PrometheusHandle,
}

impl AppState {
    pub fn new(
        cart: CartStore,
        provider: Arc<dyn PaymentProvider>,
        catalog: Arc<dyn CatalogSource>,
        context: OrderContext,
        metrics: PrometheusHandle,
    ) -> Self {
        Self {
            checkout: CheckoutOrchestrator::new(Arc::new(Mutex::new(cart)), provider, context),
            catalog: CatalogClient::new(catalog),
            metrics,
        }
    }

    /// The cart, shared with the checkout orchestrator.
    pub fn cart(&self) -> &Arc<Mutex<CartStore>> {
        self.checkout.cart()
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::check))
        .route("/metrics", get(routes::metrics::get))
        .route("/cart", get(routes::cart::get).delete(routes::cart::clear))
        .route("/cart/items", post(routes::cart::add_item))
        .route(
            "/cart/items/{product_id}",
            delete(routes::cart::remove_item).put(routes::cart::update_item),
        )
        .route(
            "/catalog/products",
            get(routes::catalog::list).post(routes::catalog::create),
        )
        .route(
            "/catalog/products/{id}",
            get(routes::catalog::get).patch(routes::catalog::update),
        )
        .route(
            "/catalog/products/{id}/no-inventory",
            post(routes::catalog::mark_no_inventory),
        )
        .route(
            "/checkout",
            get(routes::checkout::status).post(routes::checkout::begin),
        )
        .route("/checkout/approve", post(routes::checkout::approve))
        .route("/checkout/cancel", post(routes::checkout::cancel))
        .route("/checkout/abort", post(routes::checkout::abort))
        .route("/checkout/reset", post(routes::checkout::reset))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// In-memory services backing the default state.
pub struct DefaultServices {
    pub payments: InMemoryPaymentProvider,
    pub catalog: InMemoryCatalogSource,
}

/// Creates application state backed by the in-memory provider and catalog.
pub fn create_default_state(
    cart: CartStore,
    context: OrderContext,
    metrics: PrometheusHandle,
) -> (Arc<AppState>, DefaultServices) {
    let payments = InMemoryPaymentProvider::new();
    let catalog = InMemoryCatalogSource::new();

    let state = Arc::new(AppState::new(
        cart,
        Arc::new(payments.clone()),
        Arc::new(catalog.clone()),
        context,
        metrics,
    ));

    (state, DefaultServices { payments, catalog })
}
