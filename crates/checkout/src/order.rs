//! Order request sent to the payment provider.
//!
//! Every cart entry becomes its own line item with quantity `"1"`; units of
//! the same product are never merged into one multi-quantity item.

use cart::CartEntry;
use common::{Category, Money};
use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};

pub const INTENT_CAPTURE: &str = "CAPTURE";
pub const USER_ACTION_PAY_NOW: &str = "PAY_NOW";
pub const DEFAULT_BRAND_NAME: &str = "The Miracle";
pub const DEFAULT_CURRENCY: &str = "USD";

/// Storefront settings stamped onto every order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderContext {
    pub brand_name: String,
    pub return_url: String,
    pub cancel_url: String,
    pub currency: String,
}

impl OrderContext {
    /// Return and cancel both land on the shop page of `app_url`.
    pub fn new(app_url: &str, brand_name: impl Into<String>) -> Self {
        let shop = format!("{}/shop", app_url.trim_end_matches('/'));
        Self {
            brand_name: brand_name.into(),
            return_url: shop.clone(),
            cancel_url: shop,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }
}

impl Default for OrderContext {
    fn default() -> Self {
        Self::new("http://localhost:3000", DEFAULT_BRAND_NAME)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountValue {
    pub currency_code: String,
    pub value: String,
}

impl AmountValue {
    pub fn new(currency: &str, amount: Money) -> Self {
        Self {
            currency_code: currency.to_string(),
            value: amount.to_decimal_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountBreakdown {
    pub item_total: AmountValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAmount {
    pub currency_code: String,
    pub value: String,
    pub breakdown: AmountBreakdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: String,
    pub category: Category,
    pub unit_amount: AmountValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseUnit {
    pub amount: OrderAmount,
    pub items: Vec<LineItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationContext {
    pub brand_name: String,
    pub user_action: String,
    pub return_url: String,
    pub cancel_url: String,
}

/// Body of an order-creation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub intent: String,
    pub purchase_units: Vec<PurchaseUnit>,
    pub application_context: ApplicationContext,
}

impl OrderRequest {
    /// Serializes cart entries into a single-unit order.
    pub fn from_entries(entries: &[CartEntry], context: &OrderContext) -> Self {
        let currency = context.currency.as_str();
        let items: Vec<LineItem> = entries
            .iter()
            .map(|entry| LineItem {
                name: entry.name.clone(),
                quantity: "1".to_string(),
                category: entry.category.unwrap_or(Category::Digital),
                unit_amount: AmountValue::new(currency, entry.price),
            })
            .collect();
        let total: Money = entries.iter().map(|e| e.price).sum();
        let total = AmountValue::new(currency, total);

        Self {
            intent: INTENT_CAPTURE.to_string(),
            purchase_units: vec![PurchaseUnit {
                amount: OrderAmount {
                    currency_code: total.currency_code.clone(),
                    value: total.value.clone(),
                    breakdown: AmountBreakdown { item_total: total },
                },
                items,
            }],
            application_context: ApplicationContext {
                brand_name: context.brand_name.clone(),
                user_action: USER_ACTION_PAY_NOW.to_string(),
                return_url: context.return_url.clone(),
                cancel_url: context.cancel_url.clone(),
            },
        }
    }

    /// Total number of units across purchase units.
    pub fn unit_count(&self) -> usize {
        self.purchase_units.iter().map(|u| u.items.len()).sum()
    }

    /// Checks the request is well formed and returns its total.
    ///
    /// Rejects missing items or totals, unparseable amounts, mixed
    /// currencies, and totals that differ from the sum of the items.
    pub fn validate(&self) -> Result<Money> {
        let unit = match self.purchase_units.as_slice() {
            [unit] => unit,
            [] => return Err(CheckoutError::validation("Missing items or total")),
            _ => {
                return Err(CheckoutError::validation(
                    "Exactly one purchase unit is supported",
                ));
            }
        };

        if unit.items.is_empty() || unit.amount.value.trim().is_empty() {
            return Err(CheckoutError::validation("Missing items or total"));
        }

        let currency = unit.amount.currency_code.as_str();
        let total = parse_amount("order total", &unit.amount.value)?;
        let item_total = &unit.amount.breakdown.item_total;
        if item_total.currency_code != currency
            || parse_amount("item total", &item_total.value)? != total
        {
            return Err(CheckoutError::validation(
                "Item total does not match order total",
            ));
        }

        let mut sum = Money::zero();
        for item in &unit.items {
            if item.name.trim().is_empty() {
                return Err(CheckoutError::validation("Line item name is required"));
            }
            let quantity: u32 = item
                .quantity
                .parse()
                .ok()
                .filter(|q| *q > 0)
                .ok_or_else(|| {
                    CheckoutError::validation(format!(
                        "Invalid quantity {:?} for {}",
                        item.quantity, item.name
                    ))
                })?;
            if item.unit_amount.currency_code != currency {
                return Err(CheckoutError::validation(format!(
                    "Currency mismatch for {}",
                    item.name
                )));
            }
            let price = parse_amount(&item.name, &item.unit_amount.value)?;
            sum += price.multiply(quantity);
        }

        if sum != total {
            return Err(CheckoutError::validation(format!(
                "Order total {} does not equal item sum {}",
                total.to_decimal_string(),
                sum.to_decimal_string()
            )));
        }

        Ok(total)
    }
}

fn parse_amount(label: &str, value: &str) -> Result<Money> {
    let amount = Money::parse_decimal(value)
        .map_err(|e| CheckoutError::validation(format!("Invalid amount for {label}: {e}")))?;
    if amount.is_negative() {
        return Err(CheckoutError::validation(format!(
            "Negative amount for {label}"
        )));
    }
    Ok(amount)
}
