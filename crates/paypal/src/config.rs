//! PayPal client configuration.

use std::time::Duration;

use secrecy::SecretString;

pub const SANDBOX_BASE_URL: &str = "https://api-m.sandbox.paypal.com";
pub const LIVE_BASE_URL: &str = "https://api-m.paypal.com";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// PayPal deployment to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Sandbox,
    Live,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Sandbox => SANDBOX_BASE_URL,
            Environment::Live => LIVE_BASE_URL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Sandbox => "sandbox",
            Environment::Live => "live",
        }
    }

    /// Parses `sandbox` or `live`, ignoring case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Some(Environment::Sandbox),
            "live" | "production" => Some(Environment::Live),
            _ => None,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials and endpoint for the PayPal REST API.
#[derive(Debug, Clone)]
pub struct PayPalConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub environment: Environment,
    /// Overrides the environment's base URL, e.g. for a local stand-in.
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl PayPalConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        environment: Environment,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
            environment,
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The base URL requests are sent to.
    pub fn api_base(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_environment_base_urls() {
        assert_eq!(Environment::Sandbox.base_url(), "https://api-m.sandbox.paypal.com");
        assert_eq!(Environment::Live.base_url(), "https://api-m.paypal.com");
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("LIVE"), Some(Environment::Live));
        assert_eq!(Environment::parse(" sandbox "), Some(Environment::Sandbox));
        assert_eq!(Environment::parse("staging"), None);
    }

    #[test]
    fn test_base_url_override() {
        let config = PayPalConfig::new("id", "secret", Environment::Live);
        assert_eq!(config.api_base(), LIVE_BASE_URL);

        let config = config.with_base_url("http://127.0.0.1:9000");
        assert_eq!(config.api_base(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let config = PayPalConfig::new("id", "hunter2", Environment::Sandbox);
        assert!(!format!("{config:?}").contains("hunter2"));
        assert_eq!(config.client_secret.expose_secret(), "hunter2");
    }
}
