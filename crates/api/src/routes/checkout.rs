//! Checkout endpoints driving the orchestrator.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use checkout::{CheckoutStatus, Settlement};
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct ApproveRequest {
    #[serde(default, alias = "orderID")]
    pub order_id: Option<String>,
}

#[derive(Deserialize)]
pub struct AbortRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Serialize)]
pub struct CheckoutStartedResponse {
    pub order_id: OrderId,
}

/// POST /checkout: creates a provider order from the current cart.
pub async fn begin(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<CheckoutStartedResponse>), ApiError> {
    let order_id = state.checkout.begin_checkout().await?;
    Ok((StatusCode::CREATED, Json(CheckoutStartedResponse { order_id })))
}

/// POST /checkout/approve: captures the approved order and clears the cart.
pub async fn approve(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ApproveRequest>,
) -> Result<Json<Settlement>, ApiError> {
    let order_id = req
        .order_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing orderID".to_string()))?;

    let settlement = state.checkout.approve(&OrderId::new(order_id)).await?;
    Ok(Json(settlement))
}

/// POST /checkout/cancel: the shopper backed out of the approval.
pub async fn cancel(State(state): State<Arc<AppState>>) -> Result<Json<CheckoutStatus>, ApiError> {
    state.checkout.cancel().await?;
    Ok(Json(state.checkout.status().await))
}

/// POST /checkout/abort: the provider's buyer flow reported an error.
pub async fn abort(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AbortRequest>,
) -> Result<Json<CheckoutStatus>, ApiError> {
    let reason = req
        .reason
        .unwrap_or_else(|| "Payment window reported an error".to_string());
    state.checkout.abort(&reason).await?;
    Ok(Json(state.checkout.status().await))
}

/// POST /checkout/reset
pub async fn reset(State(state): State<Arc<AppState>>) -> Result<Json<CheckoutStatus>, ApiError> {
    state.checkout.reset().await?;
    Ok(Json(state.checkout.status().await))
}

/// GET /checkout
pub async fn status(State(state): State<Arc<AppState>>) -> Json<CheckoutStatus> {
    Json(state.checkout.status().await)
}
