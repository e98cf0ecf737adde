//! Catalog listing and admin endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use catalog::{CatalogListing, CatalogProduct, NewProduct, ProductUpdate};
use common::ProductId;

use crate::AppState;
use crate::error::ApiError;

/// GET /catalog/products: every product in the catalog, all pages.
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<CatalogListing>, ApiError> {
    Ok(Json(state.catalog.list_products().await?))
}

/// GET /catalog/products/{id}
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CatalogProduct>, ApiError> {
    Ok(Json(state.catalog.get_product(&ProductId::new(id)).await?))
}

/// POST /catalog/products
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(product): Json<NewProduct>,
) -> Result<(StatusCode, Json<CatalogProduct>), ApiError> {
    let created = state.catalog.create_product(&product).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /catalog/products/{id}
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<ProductUpdate>,
) -> Result<StatusCode, ApiError> {
    state
        .catalog
        .update_product(&ProductId::new(id), &update)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /catalog/products/{id}/no-inventory
pub async fn mark_no_inventory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .catalog
        .mark_no_inventory(&ProductId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
