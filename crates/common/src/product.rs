//! Catalog product as seen by the storefront.

use serde::{Deserialize, Serialize};

use crate::ids::ProductId;
use crate::money::{self, Money};

/// Goods category, used by the payment provider to classify line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "DIGITAL_GOODS")]
    Digital,
    #[serde(rename = "PHYSICAL_GOODS")]
    Physical,
}

impl Category {
    /// Returns the provider wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Digital => "DIGITAL_GOODS",
            Category::Physical => "PHYSICAL_GOODS",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A purchasable product.
///
/// Read-only to the cart: adding a product copies these fields into the
/// cart entry, and later catalog changes do not reach existing entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(with = "money::decimal")]
    pub price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Product {
    /// Creates a product with only the required fields set.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Money) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            description: None,
            category: None,
            image_url: None,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the category.
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Sets the image URL.
    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_price_is_a_plain_number_on_the_wire() {
        let product = Product::new("p1", "Sticker", Money::from_cents(999))
            .with_category(Category::Physical);
        let json = serde_json::to_value(&product).unwrap();

        assert_eq!(json["price"], serde_json::json!(9.99));
        assert_eq!(json["category"], "PHYSICAL_GOODS");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn product_deserializes_optional_fields() {
        let product: Product = serde_json::from_str(
            r#"{"id":"p2","name":"E-book","price":4.5,"category":"DIGITAL_GOODS","image_url":"https://cdn.example.com/b.png"}"#,
        )
        .unwrap();

        assert_eq!(product.price.cents(), 450);
        assert_eq!(product.category, Some(Category::Digital));
        assert_eq!(product.description, None);
    }

    #[test]
    fn negative_price_is_rejected() {
        let result: Result<Product, _> =
            serde_json::from_str(r#"{"id":"p3","name":"Broken","price":-1.0}"#);
        assert!(result.is_err());
    }
}
