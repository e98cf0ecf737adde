//! PayPal adapter errors and their mapping onto checkout and catalog errors.

use catalog::CatalogError;
use checkout::CheckoutError;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors returned by the PayPal REST API client.
#[derive(Debug, Error)]
pub enum PayPalError {
    /// The request could not be sent or the response not read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured base URL or a path built from it is invalid.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The OAuth token request was rejected.
    #[error("Failed to get PayPal token: {0}")]
    Token(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Authentication failed: Invalid PayPal credentials")]
    Unauthorized,

    #[error("Access forbidden: Insufficient permissions")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unprocessable entity: {0}")]
    Unprocessable(String),

    /// Any other non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("Unexpected PayPal response: {0}")]
    Decode(String),
}

/// Error body returned by PayPal REST endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub issue: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ApiErrorBody {
    fn details_message(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .details
            .iter()
            .filter_map(|d| d.description.as_deref().or(d.issue.as_deref()))
            .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

impl PayPalError {
    /// Maps a non-success response to an error.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();

        match status {
            StatusCode::BAD_REQUEST => PayPalError::BadRequest(
                parsed
                    .details_message()
                    .or(parsed.message)
                    .unwrap_or_else(|| "The data sent to PayPal is invalid".to_string()),
            ),
            StatusCode::UNAUTHORIZED => PayPalError::Unauthorized,
            StatusCode::FORBIDDEN => PayPalError::Forbidden,
            StatusCode::NOT_FOUND => PayPalError::NotFound(
                parsed
                    .message
                    .unwrap_or_else(|| "The requested resource does not exist".to_string()),
            ),
            StatusCode::UNPROCESSABLE_ENTITY => PayPalError::Unprocessable(
                parsed
                    .details_message()
                    .or(parsed.message)
                    .unwrap_or_else(|| "PayPal cannot process this request".to_string()),
            ),
            _ => PayPalError::Api {
                status: status.as_u16(),
                message: parsed
                    .message
                    .or(parsed.name)
                    .unwrap_or_else(|| format!("PayPal API returned HTTP {status}")),
            },
        }
    }
}

impl From<PayPalError> for CheckoutError {
    fn from(err: PayPalError) -> Self {
        CheckoutError::Provider(err.to_string())
    }
}

impl From<PayPalError> for CatalogError {
    fn from(err: PayPalError) -> Self {
        match err {
            PayPalError::NotFound(msg) => CatalogError::NotFound(msg),
            other => CatalogError::Provider(other.to_string()),
        }
    }
}

/// Result type for PayPal operations.
pub type Result<T> = std::result::Result<T, PayPalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_joins_details() {
        let body = r#"{
            "name": "INVALID_REQUEST",
            "message": "Request is not well-formed",
            "details": [
                {"issue": "INVALID_PARAMETER_VALUE", "description": "Name is too long"},
                {"issue": "MISSING_REQUIRED_PARAMETER"}
            ]
        }"#;

        let err = PayPalError::from_response(StatusCode::BAD_REQUEST, body);
        assert_eq!(
            err.to_string(),
            "Bad request: Name is too long, MISSING_REQUIRED_PARAMETER"
        );
    }

    #[test]
    fn test_bad_request_falls_back_to_message() {
        let body = r#"{"message": "Request is not well-formed"}"#;
        let err = PayPalError::from_response(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.to_string(), "Bad request: Request is not well-formed");
    }

    #[test]
    fn test_fixed_messages() {
        assert_eq!(
            PayPalError::from_response(StatusCode::UNAUTHORIZED, "").to_string(),
            "Authentication failed: Invalid PayPal credentials"
        );
        assert_eq!(
            PayPalError::from_response(StatusCode::FORBIDDEN, "{}").to_string(),
            "Access forbidden: Insufficient permissions"
        );
    }

    #[test]
    fn test_other_status_uses_provider_message() {
        let body = r#"{"name": "INTERNAL_SERVER_ERROR", "message": "An internal server error occurred"}"#;
        let err = PayPalError::from_response(StatusCode::INTERNAL_SERVER_ERROR, body);
        assert!(matches!(err, PayPalError::Api { status: 500, .. }));
        assert_eq!(err.to_string(), "An internal server error occurred");

        let err = PayPalError::from_response(StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(err.to_string(), "PayPal API returned HTTP 502 Bad Gateway");
    }

    #[test]
    fn test_catalog_mapping_keeps_not_found() {
        let err: CatalogError = PayPalError::NotFound("PROD-1".to_string()).into();
        assert!(matches!(err, CatalogError::NotFound(id) if id == "PROD-1"));

        let err: CatalogError = PayPalError::Forbidden.into();
        assert!(matches!(err, CatalogError::Provider(_)));
    }

    #[test]
    fn test_checkout_mapping_is_provider_failure() {
        let err: CheckoutError = PayPalError::Unauthorized.into();
        assert!(matches!(err, CheckoutError::Provider(m) if m.contains("Invalid PayPal credentials")));
    }
}
