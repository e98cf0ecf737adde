//! Response bodies of the PayPal orders and catalog endpoints.
//!
//! Only the fields the storefront reads are modelled; everything else is
//! ignored on decode.

use catalog::CatalogProduct;
use checkout::{CaptureResult, OrderDetails};
use common::{Money, OrderId};
use serde::Deserialize;

use crate::error::{PayPalError, Result};

#[derive(Debug, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub purchase_units: Vec<PurchaseUnitResponse>,
    #[serde(default)]
    pub payer: Option<Payer>,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseUnitResponse {
    #[serde(default)]
    pub amount: Option<AmountResponse>,
    #[serde(default)]
    pub payments: Option<Payments>,
}

#[derive(Debug, Deserialize)]
pub struct AmountResponse {
    pub currency_code: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct Payments {
    #[serde(default)]
    pub captures: Vec<Capture>,
}

#[derive(Debug, Deserialize)]
pub struct Capture {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct Payer {
    #[serde(default)]
    pub email_address: Option<String>,
}

impl OrderResponse {
    pub fn into_capture(self) -> CaptureResult {
        let capture_ids = self
            .purchase_units
            .iter()
            .filter_map(|u| u.payments.as_ref())
            .flat_map(|p| p.captures.iter().map(|c| c.id.clone()))
            .collect();

        CaptureResult {
            order_id: OrderId::new(self.id),
            status: self.status,
            capture_ids,
            payer_email: self.payer.and_then(|p| p.email_address),
        }
    }

    pub fn into_details(self) -> Result<OrderDetails> {
        let total = match self.purchase_units.first().and_then(|u| u.amount.as_ref()) {
            Some(amount) => Some(Money::parse_decimal(&amount.value).map_err(|e| {
                PayPalError::Decode(format!("order {} amount: {e}", self.id))
            })?),
            None => None,
        };

        Ok(OrderDetails {
            id: OrderId::new(self.id),
            status: self.status,
            total,
        })
    }
}

/// `GET /v1/catalogs/products` response.
#[derive(Debug, Deserialize)]
pub struct ProductList {
    #[serde(default)]
    pub items: Vec<CatalogProduct>,
    #[serde(default)]
    pub total_items: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u64>,
}
