//! OAuth2 client-credentials token handling.

use std::time::{Duration, Instant};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::instrument;
use url::Url;

use crate::error::{PayPalError, Result};

/// Tokens are refreshed this long before PayPal says they expire.
pub const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// A bearer token and the instant it stops being used.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: SecretString,
    pub refresh_at: Instant,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_in: Duration) -> Self {
        Self {
            value: SecretString::from(value.into()),
            refresh_at: Instant::now() + expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN),
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.refresh_at
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Token lifetime in seconds.
    expires_in: u64,
}

/// Caches the application token and refetches it once it expires.
///
/// Concurrent callers share a single refresh.
#[derive(Debug)]
pub struct TokenCache {
    client_id: String,
    client_secret: SecretString,
    token: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    pub fn new(client_id: String, client_secret: SecretString) -> Self {
        Self {
            client_id,
            client_secret,
            token: Mutex::new(None),
        }
    }

    /// Returns a valid bearer token, fetching a new one when needed.
    pub async fn bearer(&self, http: &reqwest::Client, base: &Url) -> Result<SecretString> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| !t.is_expired()) {
            return Ok(token.value.clone());
        }

        let token = self.fetch(http, base).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    /// Drops the cached token so the next call fetches a fresh one.
    pub async fn invalidate(&self) {
        self.token.lock().await.take();
    }

    #[instrument(skip(self, http, base), fields(client_id = %self.client_id))]
    async fn fetch(&self, http: &reqwest::Client, base: &Url) -> Result<AccessToken> {
        let url = base.join("/v1/oauth2/token")?;

        let response = http
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::ACCEPT_LANGUAGE, "en_US")
            .basic_auth(&self.client_id, Some(self.client_secret.expose_secret()))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = PayPalError::from_response(status, &body);
            tracing::warn!(%status, error = %err, "token request rejected");
            return Err(PayPalError::Token(err.to_string()));
        }

        let body: TokenResponse = response.json().await?;
        metrics::counter!("paypal_token_refreshes_total").increment(1);
        tracing::debug!(expires_in = body.expires_in, "fetched access token");

        Ok(AccessToken::new(
            body.access_token,
            Duration::from_secs(body.expires_in),
        ))
    }
}
