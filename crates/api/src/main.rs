//! Storefront server entry point.

use std::sync::Arc;

use api::AppState;
use api::config::{Config, LogFormat, ProviderBackend, StorageBackend};
use cart::CartStore;
use cart_storage::{BlobStore, FileBlobStore, InMemoryBlobStore, PostgresBlobStore};
use catalog::{CatalogSource, InMemoryCatalogSource};
use checkout::{InMemoryPaymentProvider, PaymentProvider};
use paypal::PayPalClient;
use secrecy::ExposeSecret;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let json = config.log_format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true)))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

async fn open_storage(config: &Config) -> Arc<dyn BlobStore> {
    match &config.storage {
        StorageBackend::Memory => {
            tracing::warn!("cart storage is in memory; the cart will not survive a restart");
            Arc::new(InMemoryBlobStore::new())
        }
        StorageBackend::File(dir) => {
            tracing::info!(dir = %dir.display(), "using file cart storage");
            Arc::new(
                FileBlobStore::open(dir.clone())
                    .await
                    .expect("failed to open cart storage directory"),
            )
        }
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_ref()
                .expect("DATABASE_URL is checked by Config");
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(url.expose_secret())
                .await
                .expect("failed to connect to database");
            let store = PostgresBlobStore::new(pool);
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using PostgreSQL cart storage");
            Arc::new(store)
        }
    }
}

fn payment_services(config: &Config) -> (Arc<dyn PaymentProvider>, Arc<dyn CatalogSource>) {
    match (config.provider, &config.paypal) {
        (ProviderBackend::PayPal, Some(paypal)) => {
            let client = PayPalClient::new(paypal).expect("failed to build PayPal client");
            (Arc::new(client.clone()), Arc::new(client))
        }
        _ => {
            tracing::warn!("using in-memory payment provider and catalog");
            (
                Arc::new(InMemoryPaymentProvider::new()),
                Arc::new(InMemoryCatalogSource::new()),
            )
        }
    }
}

#[tokio::main]
async fn main() {
    // 1. Load configuration (.env first) and initialize tracing
    let config = Config::from_env().expect("invalid configuration");
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Restore the cart
    let storage = open_storage(&config).await;
    let cart = CartStore::open(storage, &config.cart_key)
        .await
        .expect("failed to load cart");
    tracing::info!(key = %config.cart_key, items = cart.get_item_count(), "cart restored");

    // 4. Build the application
    let (provider, catalog) = payment_services(&config);
    let state = Arc::new(AppState::new(
        cart,
        provider,
        catalog,
        config.order_context(),
        metrics_handle,
    ));
    let app = api::create_app(state);

    // 5. Start server
    let addr = config.addr();
    tracing::info!(%addr, provider = ?config.provider, "starting storefront server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
