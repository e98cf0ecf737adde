//! PayPal REST adapter.
//!
//! [`PayPalClient`] authenticates with OAuth2 client credentials, caches the
//! bearer token, and implements both [`checkout::PaymentProvider`] and
//! [`catalog::CatalogSource`].

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod wire;

pub use auth::{AccessToken, TOKEN_EXPIRY_MARGIN, TokenCache};
pub use client::PayPalClient;
pub use config::{Environment, LIVE_BASE_URL, PayPalConfig, SANDBOX_BASE_URL};
pub use error::{PayPalError, Result};
