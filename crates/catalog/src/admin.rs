//! Catalog administration inputs and their validation.

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};
use crate::product::{CatalogCategory, ProductType};

pub const MAX_NAME_CHARS: usize = 127;
pub const MAX_DESCRIPTION_CHARS: usize = 256;

/// Suffix appended to product names that are out of stock.
pub const NO_INVENTORY_SUFFIX: &str = " | no inventory";

/// Default landing page for new products.
pub const DEFAULT_HOME_URL: &str = "https://themiracle.love";

/// Request to create a catalog product, as entered by an admin.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub image_url: String,
    #[serde(default = "default_home_url")]
    pub home_url: String,
    #[serde(rename = "type", default = "default_type")]
    pub product_type: String,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_home_url() -> String {
    DEFAULT_HOME_URL.to_string()
}

fn default_type() -> String {
    ProductType::Service.as_str().to_string()
}

fn default_category() -> String {
    CatalogCategory::Software.as_str().to_string()
}

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedProduct {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub category: CatalogCategory,
    pub image_url: String,
    pub home_url: String,
}

impl NewProduct {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            image_url: image_url.into(),
            home_url: default_home_url(),
            product_type: default_type(),
            category: default_category(),
        }
    }

    pub fn with_type(mut self, product_type: impl Into<String>) -> Self {
        self.product_type = product_type.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_home_url(mut self, home_url: impl Into<String>) -> Self {
        self.home_url = home_url.into();
        self
    }

    /// Trims, sanitizes and checks every field.
    pub fn validate(&self) -> Result<ValidatedProduct> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CatalogError::validation("Product name is required"));
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(CatalogError::validation(format!(
                "Product name must be {MAX_NAME_CHARS} characters or less"
            )));
        }
        let name = sanitize(name, NAME_EXTRA);
        if name.is_empty() {
            return Err(CatalogError::validation(
                "Product name contains only invalid characters",
            ));
        }

        let description = self.description.trim();
        if description.is_empty() {
            return Err(CatalogError::validation("Product description is required"));
        }
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(CatalogError::validation(format!(
                "Product description must be {MAX_DESCRIPTION_CHARS} characters or less"
            )));
        }
        let description = sanitize(description, DESCRIPTION_EXTRA);
        if description.is_empty() {
            return Err(CatalogError::validation(
                "Product description contains only invalid characters",
            ));
        }

        let image_url = validate_https_url("Image URL", &self.image_url)?;
        let home_url = validate_https_url("Home URL", &self.home_url)?;

        let product_type = ProductType::parse(&self.product_type).ok_or_else(|| {
            CatalogError::validation(format!(
                "Invalid product type: {}. Must be one of: {}",
                self.product_type,
                join(ProductType::ALL.iter().map(|t| t.as_str()))
            ))
        })?;
        let category = CatalogCategory::parse(&self.category).ok_or_else(|| {
            CatalogError::validation(format!(
                "Invalid category: {}. Must be one of: {}",
                self.category,
                join(CatalogCategory::ALL.iter().map(|c| c.as_str()))
            ))
        })?;

        Ok(ValidatedProduct {
            name,
            description,
            product_type,
            category,
            image_url,
            home_url,
        })
    }
}

/// Partial update to an existing catalog product.
///
/// The product type cannot be changed after creation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub home_url: Option<String>,
}

/// One JSON-patch operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: String,
    pub path: String,
    pub value: String,
}

impl PatchOperation {
    pub fn replace(path: &str, value: impl Into<String>) -> Self {
        Self {
            op: "replace".to_string(),
            path: path.to_string(),
            value: value.into(),
        }
    }
}

impl ProductUpdate {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Builds `replace` operations for the provided fields.
    pub fn to_patch(&self) -> Result<Vec<PatchOperation>> {
        let fields = [
            ("/name", &self.name),
            ("/description", &self.description),
            ("/category", &self.category),
            ("/image_url", &self.image_url),
            ("/home_url", &self.home_url),
        ];

        let ops: Vec<PatchOperation> = fields
            .into_iter()
            .filter_map(|(path, value)| value.as_ref().map(|v| PatchOperation::replace(path, v)))
            .collect();

        if ops.is_empty() {
            return Err(CatalogError::validation("No valid updates provided"));
        }
        Ok(ops)
    }
}

/// Returns the name a product should carry once marked out of stock.
pub fn no_inventory_name(name: &str) -> String {
    if name.contains(NO_INVENTORY_SUFFIX.trim_start()) {
        name.to_string()
    } else {
        format!("{name}{NO_INVENTORY_SUFFIX}")
    }
}

const NAME_EXTRA: &str = "-.,'!?()&";
const DESCRIPTION_EXTRA: &str = "-.,'!?()&$%";

/// Keeps ASCII word characters, whitespace and the allowed punctuation.
fn sanitize(value: &str, extra: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace() || extra.contains(*c))
        .collect()
}

fn validate_https_url(label: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if !value.starts_with("https://") {
        return Err(CatalogError::validation(format!(
            "{label} is required and must use HTTPS protocol"
        )));
    }
    url::Url::parse(value)
        .map_err(|e| CatalogError::validation(format!("Invalid URL format provided: {e}")))?;
    Ok(value.to_string())
}

fn join<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values.collect::<Vec<_>>().join(", ")
}
