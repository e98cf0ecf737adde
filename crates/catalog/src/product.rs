//! Catalog product records and their classification enums.

use common::{Category, Money, Product, ProductId, money};
use serde::{Deserialize, Serialize};

/// Kind of product as the catalog classifies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    Physical,
    Digital,
    Service,
}

impl ProductType {
    pub const ALL: [ProductType; 3] = [Self::Physical, Self::Digital, Self::Service];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Physical => "PHYSICAL",
            Self::Digital => "DIGITAL",
            Self::Service => "SERVICE",
        }
    }

    /// Parses a wire name, returning None for anything unrecognised.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }

    /// Line-item category used when a unit of this type is ordered.
    pub fn goods_category(&self) -> Category {
        match self {
            Self::Physical => Category::Physical,
            Self::Digital | Self::Service => Category::Digital,
        }
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog category accepted when creating products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CatalogCategory {
    Software,
    DigitalMediaBooksMoviesMusic,
    BooksPeriodicalsAndNewspapers,
    Entertainment,
    Music,
    Games,
    EducationAndTextbooks,
    ArtAndCrafts,
    Collectibles,
    ClothingShoesAndAccessories,
    ElectronicsAndComputers,
    ToysAndHobbies,
    Other,
}

impl CatalogCategory {
    pub const ALL: [CatalogCategory; 13] = [
        Self::Software,
        Self::DigitalMediaBooksMoviesMusic,
        Self::BooksPeriodicalsAndNewspapers,
        Self::Entertainment,
        Self::Music,
        Self::Games,
        Self::EducationAndTextbooks,
        Self::ArtAndCrafts,
        Self::Collectibles,
        Self::ClothingShoesAndAccessories,
        Self::ElectronicsAndComputers,
        Self::ToysAndHobbies,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Software => "SOFTWARE",
            Self::DigitalMediaBooksMoviesMusic => "DIGITAL_MEDIA_BOOKS_MOVIES_MUSIC",
            Self::BooksPeriodicalsAndNewspapers => "BOOKS_PERIODICALS_AND_NEWSPAPERS",
            Self::Entertainment => "ENTERTAINMENT",
            Self::Music => "MUSIC",
            Self::Games => "GAMES",
            Self::EducationAndTextbooks => "EDUCATION_AND_TEXTBOOKS",
            Self::ArtAndCrafts => "ART_AND_CRAFTS",
            Self::Collectibles => "COLLECTIBLES",
            Self::ClothingShoesAndAccessories => "CLOTHING_SHOES_AND_ACCESSORIES",
            Self::ElectronicsAndComputers => "ELECTRONICS_AND_COMPUTERS",
            Self::ToysAndHobbies => "TOYS_AND_HOBBIES",
            Self::Other => "OTHER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

impl std::fmt::Display for CatalogCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A product as returned by the remote catalog.
///
/// `product_type` and `category` are kept as strings because the provider
/// knows more values than this storefront creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_url: Option<String>,
    #[serde(default, with = "optional_price", skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
}

impl CatalogProduct {
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            product_type: None,
            category: None,
            image_url: None,
            home_url: None,
            price: None,
        }
    }

    pub fn with_type(mut self, product_type: ProductType) -> Self {
        self.product_type = Some(product_type.as_str().to_string());
        self
    }

    pub fn with_price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Converts to a purchasable product, filling a missing price.
    pub fn to_product(&self, default_price: Money) -> Product {
        Product {
            id: self.id.clone(),
            name: self.name.clone(),
            price: self.price.unwrap_or(default_price),
            description: self.description.clone(),
            category: self
                .product_type
                .as_deref()
                .and_then(ProductType::parse)
                .map(|t| t.goods_category()),
            image_url: self.image_url.clone(),
        }
    }
}

mod optional_price {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{Money, money};

    pub fn serialize<S: Serializer>(price: &Option<Money>, serializer: S) -> Result<S::Ok, S::Error> {
        match price {
            Some(m) => money::decimal::serialize(m, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Money>, D::Error> {
        #[derive(Deserialize)]
        struct Wrapped(#[serde(with = "money::decimal")] Money);

        Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(m)| m))
    }
}
