//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use cart::{CartStore, DisplayRow, MAX_UNITS_PER_PRODUCT};
use common::{Category, EntryId, Product, ProductId};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

#[derive(Deserialize)]
pub struct RemoveParams {
    #[serde(default)]
    pub all: bool,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartResponse {
    pub rows: Vec<CartRowResponse>,
    pub item_count: usize,
    pub total: String,
}

#[derive(Serialize)]
pub struct CartRowResponse {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: String,
    pub quantity: u32,
    pub subtotal: String,
    pub entry_ids: Vec<EntryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Serialize)]
pub struct AddedResponse {
    pub entry_id: EntryId,
    pub cart: CartResponse,
}

#[derive(Serialize)]
pub struct QuantityResponse {
    pub quantity: usize,
    pub cart: CartResponse,
}

#[derive(Serialize)]
pub struct ChangedResponse {
    pub changed: usize,
    pub cart: CartResponse,
}

impl From<DisplayRow> for CartRowResponse {
    fn from(row: DisplayRow) -> Self {
        Self {
            subtotal: row.subtotal().to_decimal_string(),
            unit_price: row.unit_price.to_decimal_string(),
            product_id: row.product_id,
            name: row.name,
            quantity: row.quantity,
            entry_ids: row.entry_ids,
            description: row.description,
            category: row.category,
            image_url: row.image_url,
        }
    }
}

impl From<&CartStore> for CartResponse {
    fn from(cart: &CartStore) -> Self {
        Self {
            rows: cart
                .get_display_cart()
                .into_iter()
                .map(CartRowResponse::from)
                .collect(),
            item_count: cart.get_item_count(),
            total: cart.get_total_value().to_decimal_string(),
        }
    }
}

// -- Handlers --

/// GET /cart
pub async fn get(State(state): State<Arc<AppState>>) -> Json<CartResponse> {
    let cart = state.cart().lock().await;
    Json(CartResponse::from(&*cart))
}

/// POST /cart/items: adds one unit of the posted product.
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    Json(product): Json<Product>,
) -> Result<Json<AddedResponse>, ApiError> {
    if product.id.as_str().trim().is_empty() {
        return Err(ApiError::BadRequest("Product id is required".to_string()));
    }
    if product.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Product name is required".to_string()));
    }

    let mut cart = state.cart().lock().await;
    let entry_id = cart.add_to_cart(&product).await;

    Ok(Json(AddedResponse {
        entry_id,
        cart: CartResponse::from(&*cart),
    }))
}

/// PUT /cart/items/{product_id}: sets the number of units of a product.
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<QuantityResponse>, ApiError> {
    if req.quantity > MAX_UNITS_PER_PRODUCT as i64 {
        return Err(ApiError::BadRequest(format!(
            "Quantity must be at most {MAX_UNITS_PER_PRODUCT}"
        )));
    }

    let mut cart = state.cart().lock().await;
    let quantity = cart
        .update_quantity(&ProductId::new(product_id), req.quantity)
        .await;

    Ok(Json(QuantityResponse {
        quantity,
        cart: CartResponse::from(&*cart),
    }))
}

/// DELETE /cart/items/{product_id}?all=bool: removes one unit, or every unit.
pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
    Query(params): Query<RemoveParams>,
) -> Json<ChangedResponse> {
    let mut cart = state.cart().lock().await;
    let changed = cart
        .remove_from_cart(&ProductId::new(product_id), params.all)
        .await;

    Json(ChangedResponse {
        changed,
        cart: CartResponse::from(&*cart),
    })
}

/// DELETE /cart
pub async fn clear(State(state): State<Arc<AppState>>) -> Json<CartResponse> {
    let mut cart = state.cart().lock().await;
    cart.clear_cart().await;
    Json(CartResponse::from(&*cart))
}
