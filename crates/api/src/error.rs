//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use catalog::CatalogError;
use checkout::CheckoutError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Checkout error.
    Checkout(CheckoutError),
    /// Catalog error.
    Catalog(CatalogError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Catalog(err) => catalog_error_to_response(err),
        };

        metrics::counter!("http_errors_total", "status" => status.as_u16().to_string())
            .increment(1);
        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match &err {
        CheckoutError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CheckoutError::Provider(_) => {
            tracing::warn!(error = %err, "payment provider failure");
            (StatusCode::BAD_GATEWAY, err.to_string())
        }
        CheckoutError::AlreadyInFlight { .. }
        | CheckoutError::InvalidState { .. }
        | CheckoutError::OrderMismatch { .. }
        | CheckoutError::Stale { .. } => (StatusCode::CONFLICT, err.to_string()),
    }
}

fn catalog_error_to_response(err: CatalogError) -> (StatusCode, String) {
    match &err {
        CatalogError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CatalogError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        CatalogError::Provider(_) => (StatusCode::BAD_GATEWAY, err.to_string()),
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Catalog(err)
    }
}
