//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use checkout::CheckoutState;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub checkout: CheckoutState,
}

/// GET /health: returns service status and the current checkout state.
pub async fn check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        checkout: state.checkout.status().await.state,
    })
}
