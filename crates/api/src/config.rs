//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use checkout::OrderContext;
use paypal::{Environment, PayPalConfig};
use secrecy::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Where the cart blob is kept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Memory,
    File(PathBuf),
    Postgres,
}

/// Which payment provider and catalog to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderBackend {
    #[default]
    Memory,
    PayPal,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`, `PORT`: bind address (default `0.0.0.0:3000`)
/// - `RUST_LOG`: tracing filter directive (default `info`)
/// - `LOG_FORMAT`: `text` or `json`
/// - `CART_STORAGE`: `memory`, `file:<dir>` or `postgres` (needs `DATABASE_URL`)
/// - `CART_STORAGE_KEY`: blob key of the cart (default `tmn-cart`)
/// - `PAYMENT_PROVIDER`: `memory` or `paypal` (needs `PAYPAL_CLIENT_ID`,
///   `PAYPAL_CLIENT_SECRET`, optional `PAYPAL_ENVIRONMENT`)
/// - `APP_URL`, `BRAND_NAME`, `CURRENCY`: stamped onto every order
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub storage: StorageBackend,
    pub database_url: Option<SecretString>,
    pub cart_key: String,
    pub provider: ProviderBackend,
    pub paypal: Option<PayPalConfig>,
    pub app_url: String,
    pub brand_name: String,
    pub currency: String,
}

impl Config {
    /// Loads configuration from the environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let invalid = |key: &str, msg: String| ConfigError::InvalidEnvVar(key.to_string(), msg);

        let port = var("PORT", "3000")
            .parse::<u16>()
            .map_err(|e| invalid("PORT", e.to_string()))?;

        let log_format = match var("LOG_FORMAT", "text").to_ascii_lowercase().as_str() {
            "text" => LogFormat::Text,
            "json" => LogFormat::Json,
            other => return Err(invalid("LOG_FORMAT", format!("unknown format {other:?}"))),
        };

        let storage = parse_storage(&var("CART_STORAGE", "memory")).ok_or_else(|| {
            invalid(
                "CART_STORAGE",
                "expected memory, file:<dir> or postgres".to_string(),
            )
        })?;
        let database_url = lookup("DATABASE_URL").map(SecretString::from);
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string()));
        }

        let cart_key = var("CART_STORAGE_KEY", "tmn-cart");
        cart_storage::validate_key(&cart_key)
            .map_err(|e| invalid("CART_STORAGE_KEY", e.to_string()))?;

        let provider = match var("PAYMENT_PROVIDER", "memory").to_ascii_lowercase().as_str() {
            "memory" => ProviderBackend::Memory,
            "paypal" => ProviderBackend::PayPal,
            other => {
                return Err(invalid(
                    "PAYMENT_PROVIDER",
                    format!("unknown provider {other:?}"),
                ));
            }
        };

        let paypal = match provider {
            ProviderBackend::Memory => None,
            ProviderBackend::PayPal => {
                let required = |key: &str| {
                    lookup(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
                };
                let environment = Environment::parse(&var("PAYPAL_ENVIRONMENT", "sandbox"))
                    .ok_or_else(|| {
                        invalid("PAYPAL_ENVIRONMENT", "expected sandbox or live".to_string())
                    })?;
                let mut config = PayPalConfig::new(
                    required("PAYPAL_CLIENT_ID")?,
                    required("PAYPAL_CLIENT_SECRET")?,
                    environment,
                );
                if let Some(base_url) = lookup("PAYPAL_BASE_URL") {
                    config = config.with_base_url(base_url);
                }
                Some(config)
            }
        };

        Ok(Self {
            host: var("HOST", "0.0.0.0"),
            port,
            log_level: var("RUST_LOG", "info"),
            log_format,
            storage,
            database_url,
            cart_key,
            provider,
            paypal,
            app_url: var("APP_URL", "http://localhost:3000"),
            brand_name: var("BRAND_NAME", checkout::order::DEFAULT_BRAND_NAME),
            currency: var("CURRENCY", checkout::order::DEFAULT_CURRENCY).to_ascii_uppercase(),
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Storefront settings for order requests.
    pub fn order_context(&self) -> OrderContext {
        OrderContext::new(&self.app_url, self.brand_name.clone())
            .with_currency(self.currency.clone())
    }
}

fn parse_storage(value: &str) -> Option<StorageBackend> {
    match value {
        "memory" => Some(StorageBackend::Memory),
        "postgres" => Some(StorageBackend::Postgres),
        _ => value
            .strip_prefix("file:")
            .filter(|dir| !dir.is_empty())
            .map(|dir| StorageBackend::File(PathBuf::from(dir))),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            storage: StorageBackend::Memory,
            database_url: None,
            cart_key: "tmn-cart".to_string(),
            provider: ProviderBackend::Memory,
            paypal: None,
            app_url: "http://localhost:3000".to_string(),
            brand_name: checkout::order::DEFAULT_BRAND_NAME.to_string(),
            currency: checkout::order::DEFAULT_CURRENCY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = load(&[]).unwrap();
        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.cart_key, "tmn-cart");
        assert_eq!(config.provider, ProviderBackend::Memory);
        assert!(config.paypal.is_none());
        assert_eq!(config.currency, "USD");
    }

    #[test]
    fn test_addr_formatting() {
        let config = load(&[("HOST", "127.0.0.1"), ("PORT", "8080")]).unwrap();
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "PORT"));
    }

    #[test]
    fn test_file_storage() {
        let config = load(&[("CART_STORAGE", "file:/var/lib/storefront")]).unwrap();
        assert_eq!(
            config.storage,
            StorageBackend::File(PathBuf::from("/var/lib/storefront"))
        );
        assert!(load(&[("CART_STORAGE", "file:")]).is_err());
        assert!(load(&[("CART_STORAGE", "redis")]).is_err());
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let err = load(&[("CART_STORAGE", "postgres")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "DATABASE_URL"));

        let config = load(&[
            ("CART_STORAGE", "postgres"),
            ("DATABASE_URL", "postgres://localhost/storefront"),
        ])
        .unwrap();
        assert_eq!(config.storage, StorageBackend::Postgres);
    }

    #[test]
    fn test_invalid_cart_key() {
        assert!(load(&[("CART_STORAGE_KEY", "../etc/passwd")]).is_err());
    }

    #[test]
    fn test_paypal_requires_credentials() {
        let err = load(&[("PAYMENT_PROVIDER", "paypal"), ("PAYPAL_CLIENT_ID", "id")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "PAYPAL_CLIENT_SECRET"));

        let config = load(&[
            ("PAYMENT_PROVIDER", "paypal"),
            ("PAYPAL_CLIENT_ID", "id"),
            ("PAYPAL_CLIENT_SECRET", "secret"),
            ("PAYPAL_ENVIRONMENT", "live"),
        ])
        .unwrap();
        let paypal = config.paypal.unwrap();
        assert_eq!(paypal.environment, Environment::Live);
        assert_eq!(paypal.api_base(), "https://api-m.paypal.com");
    }

    #[test]
    fn test_order_context() {
        let config = load(&[
            ("APP_URL", "https://themiracle.love"),
            ("CURRENCY", "eur"),
        ])
        .unwrap();
        let context = config.order_context();
        assert_eq!(context.return_url, "https://themiracle.love/shop");
        assert_eq!(context.currency, "EUR");
        assert_eq!(context.brand_name, "The Miracle");
    }

    #[test]
    fn test_json_log_format() {
        let config = load(&[("LOG_FORMAT", "JSON")]).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
