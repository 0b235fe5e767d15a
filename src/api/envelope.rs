//! Backend response envelope
//!
//! Every backend body is shaped like:
//! ```json
//! { "success": true, "order": { ... } }
//! { "success": false, "message": "Product out of stock" }
//! { "success": false, "errors": ["quantity is required", { "msg": "invalid booking" }] }
//! ```
//! [`Envelope::into_result`] is the only place the `success` flag is read.

use serde::Deserialize;
use crate::domain::aggregates::{Booking, PaymentSession, Product, VendorOrder};
use crate::error::{MarketplaceError, Result};

pub const DEFAULT_FAILURE_MESSAGE: &str = "Request was not successful";

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
    #[serde(flatten)]
    pub data: T,
}

/// A field-level validation error, either a bare string or an object with a message.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Text(String),
    Field {
        #[serde(alias = "msg")]
        message: String,
    },
}

impl ErrorDetail {
    pub fn message(&self) -> &str {
        match self { Self::Text(m) => m, Self::Field { message } => message }
    }
}

impl<T> Envelope<T> {
    /// Succeeds only on an explicit `"success": true`.
    pub fn into_result(self) -> Result<T> {
        match self.success {
            Some(true) => Ok(self.data),
            _ => Err(self.failure()),
        }
    }

    /// Listing endpoints omit the flag; only an explicit `false` is a failure.
    pub fn into_listing(self) -> Result<T> {
        match self.success {
            Some(false) => Err(self.failure()),
            _ => Ok(self.data),
        }
    }

    fn failure(self) -> MarketplaceError {
        if !self.errors.is_empty() {
            let joined = self.errors.iter().map(ErrorDetail::message).collect::<Vec<_>>().join(", ");
            return MarketplaceError::Backend(joined);
        }
        match self.message.filter(|m| !m.trim().is_empty()) {
            Some(message) => MarketplaceError::Backend(message),
            None => MarketplaceError::Rejected,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderPayload { #[serde(default)] pub order: Option<VendorOrder> }

#[derive(Debug, Deserialize)]
pub struct OrdersPayload { #[serde(default)] pub orders: Vec<VendorOrder> }

#[derive(Debug, Deserialize)]
pub struct ProductPayload { #[serde(default)] pub product: Option<Product> }

#[derive(Debug, Deserialize)]
pub struct BookingsPayload { #[serde(default)] pub bookings: Vec<Booking> }

#[derive(Debug, Deserialize)]
pub struct PaymentPayload {
    #[serde(default, rename = "paymentData")]
    pub payment_data: Option<PaymentSession>,
}

impl OrderPayload {
    pub fn require(self) -> Result<VendorOrder> {
        self.order.ok_or_else(|| MarketplaceError::InvalidResponse("Missing order data".to_string()))
    }
}

impl ProductPayload {
    pub fn require(self) -> Result<Product> {
        self.product.ok_or_else(|| MarketplaceError::InvalidResponse("Missing product data".to_string()))
    }
}

impl PaymentPayload {
    pub fn require(self) -> Result<PaymentSession> {
        self.payment_data.ok_or_else(|| MarketplaceError::InvalidResponse("Missing payment data".to_string()))
    }
}
