//! Product Aggregate
//!
//! Vendor products are owned by the backend; the web layer only reads them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::value_objects::{Money, QuantityBounds, QuantityError};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: Option<String>,
    price: Decimal,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default = "available")]
    is_available: bool,
    #[serde(default)]
    stock_quantity: u32,
    #[serde(default = "one")]
    min_order_quantity: u32,
    #[serde(default = "ten")]
    max_order_quantity: u32,
    #[serde(default)]
    preparation_time: Option<u32>,
    #[serde(default)]
    tags: Vec<String>,
    vendor: Reference,
}

fn available() -> bool { true }
fn one() -> u32 { 1 }
fn ten() -> u32 { 10 }

/// A reference to another backend document: a bare id, or the populated document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    Id(String),
    Populated {
        #[serde(alias = "_id")]
        id: String,
        #[serde(default, alias = "businessName", alias = "fullName", alias = "title")]
        name: Option<String>,
    },
}

impl Reference {
    pub fn id(&self) -> &str {
        match self { Self::Id(id) => id, Self::Populated { id, .. } => id }
    }
    pub fn display_name(&self) -> &str {
        match self { Self::Populated { name: Some(name), .. } => name, _ => self.id() }
    }
}

impl From<&str> for Reference { fn from(id: &str) -> Self { Self::Id(id.to_string()) } }
impl From<String> for Reference { fn from(id: String) -> Self { Self::Id(id) } }

impl Product {
    /// A listing with default ordering limits: min 1, max 10, untracked stock.
    pub fn listing(id: impl Into<String>, vendor: impl Into<Reference>, name: impl Into<String>, price: Decimal) -> Self {
        let bounds = QuantityBounds::default();
        Self {
            id: id.into(), name: name.into(), description: String::new(), category: None, price,
            images: vec![], is_available: true, stock_quantity: bounds.stock,
            min_order_quantity: bounds.min, max_order_quantity: bounds.max,
            preparation_time: None, tags: vec![], vendor: vendor.into(),
        }
    }

    pub fn with_bounds(mut self, min: u32, max: u32, stock: u32) -> Self {
        let bounds = QuantityBounds::new(min, max, stock);
        self.min_order_quantity = bounds.min;
        self.max_order_quantity = bounds.max;
        self.stock_quantity = bounds.stock;
        self
    }

    pub fn unavailable(mut self) -> Self { self.is_available = false; self }

    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn description(&self) -> &str { &self.description }
    pub fn category(&self) -> Option<&str> { self.category.as_deref() }
    pub fn price(&self) -> Decimal { self.price }
    /// Backend prices carry no currency; the caller supplies the configured one.
    pub fn unit_price(&self, currency: &str) -> Money { Money::new(self.price, currency) }
    pub fn images(&self) -> &[String] { &self.images }
    pub fn is_available(&self) -> bool { self.is_available }
    pub fn preparation_time(&self) -> Option<u32> { self.preparation_time }
    pub fn tags(&self) -> &[String] { &self.tags }
    pub fn vendor(&self) -> &Reference { &self.vendor }
    pub fn vendor_id(&self) -> &str { self.vendor.id() }

    pub fn bounds(&self) -> QuantityBounds {
        QuantityBounds::new(self.min_order_quantity, self.max_order_quantity, self.stock_quantity)
    }

    pub fn clamp_quantity(&self, quantity: u32) -> u32 { self.bounds().clamp(quantity) }

    /// Checks a requested quantity before it reaches the cart.
    pub fn validate_quantity(&self, quantity: u32) -> Result<(), ProductError> {
        if !self.is_available { return Err(ProductError::Unavailable); }
        self.bounds().check(quantity).map_err(ProductError::Quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum ProductError { Unavailable, Quantity(QuantityError) }
impl std::error::Error for ProductError {}
impl std::fmt::Display for ProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self { Self::Unavailable => write!(f, "Product is currently unavailable"), Self::Quantity(e) => write!(f, "{e}") }
    }
}
