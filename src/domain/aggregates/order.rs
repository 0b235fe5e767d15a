//! Vendor Order Aggregate
//!
//! Orders are created and transitioned by the backend. The client holds
//! snapshots and submits requests; it never decides payment outcomes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use crate::domain::aggregates::cart::Cart;
use crate::domain::aggregates::product::Reference;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorOrder {
    #[serde(alias = "_id")]
    id: String,
    #[serde(deserialize_with = "string_or_number")]
    order_number: String,
    #[serde(default)]
    user: Option<Reference>,
    vendor: Reference,
    #[serde(default, alias = "bookingId")]
    booking: Option<Reference>,
    #[serde(default)]
    items: Vec<OrderItem>,
    #[serde(default)]
    subtotal: Decimal,
    #[serde(default)]
    service_fee: Decimal,
    #[serde(default)]
    delivery_fee: Decimal,
    #[serde(alias = "total")]
    total_amount: Decimal,
    #[serde(default)]
    status: OrderStatus,
    #[serde(default)]
    payment_status: PaymentStatus,
    #[serde(default)]
    delivery_address: Option<String>,
    #[serde(default)]
    delivery_instructions: Option<String>,
    #[serde(default)]
    payment_reference: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(alias = "productId")]
    pub product: Reference,
    #[serde(default)]
    pub name: Option<String>,
    pub quantity: u32,
    pub price: Decimal,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal { self.price * Decimal::from(self.quantity) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus { #[default] Pending, Confirmed, Preparing, OutForDelivery, Delivered, Cancelled }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus { #[default] Pending, Paid, Failed, Refunded }

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [Self::Pending, Self::Confirmed, Self::Preparing, Self::OutForDelivery, Self::Delivered, Self::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending", Self::Confirmed => "confirmed", Self::Preparing => "preparing",
            Self::OutForDelivery => "out_for_delivery", Self::Delivered => "delivered", Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool { matches!(self, Self::Delivered | Self::Cancelled) }

    /// Admin status updates move forward one step at a time; any open order can be cancelled.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (current, Cancelled) => !current.is_terminal(),
            (Pending, Confirmed) | (Confirmed, Preparing) | (Preparing, OutForDelivery) | (OutForDelivery, Delivered) => true,
            _ => false,
        }
    }
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [Self::Pending, Self::Paid, Self::Failed, Self::Refunded];

    pub fn as_str(&self) -> &'static str {
        match self { Self::Pending => "pending", Self::Paid => "paid", Self::Failed => "failed", Self::Refunded => "refunded" }
    }
}

impl VendorOrder {
    pub fn id(&self) -> &str { &self.id }
    pub fn order_number(&self) -> &str { &self.order_number }
    pub fn user(&self) -> Option<&Reference> { self.user.as_ref() }
    pub fn vendor(&self) -> &Reference { &self.vendor }
    pub fn booking(&self) -> Option<&Reference> { self.booking.as_ref() }
    pub fn items(&self) -> &[OrderItem] { &self.items }
    pub fn subtotal(&self) -> Decimal { self.subtotal }
    pub fn service_fee(&self) -> Decimal { self.service_fee }
    pub fn delivery_fee(&self) -> Decimal { self.delivery_fee }
    pub fn total_amount(&self) -> Decimal { self.total_amount }
    pub fn total(&self, currency: &str) -> Money { Money::new(self.total_amount, currency) }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn payment_status(&self) -> PaymentStatus { self.payment_status }
    pub fn is_paid(&self) -> bool { self.payment_status == PaymentStatus::Paid }
    pub fn delivery_address(&self) -> Option<&str> { self.delivery_address.as_deref() }
    pub fn delivery_instructions(&self) -> Option<&str> { self.delivery_instructions.as_deref() }
    pub fn payment_reference(&self) -> Option<&str> { self.payment_reference.as_deref() }
    pub fn created_at(&self) -> Option<DateTime<Utc>> { self.created_at }
    pub fn updated_at(&self) -> Option<DateTime<Utc>> { self.updated_at }

    /// Server-side constructor used by the in-process backend.
    pub(crate) fn placed(id: String, order_number: String, user: Option<String>, request: &NewVendorOrder, items: Vec<OrderItem>, fees: (Decimal, Decimal)) -> Self {
        let subtotal: Decimal = items.iter().map(OrderItem::line_total).sum();
        let (service_fee, delivery_fee) = fees;
        let now = Utc::now();
        Self {
            id, order_number, user: user.map(Reference::from), vendor: Reference::from(request.vendor_id.as_str()),
            booking: request.booking_id.as_deref().map(Reference::from), items, subtotal, service_fee, delivery_fee,
            total_amount: subtotal + service_fee + delivery_fee, status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending, delivery_address: Some(request.delivery_address.clone()),
            delivery_instructions: request.delivery_instructions.clone(), payment_reference: None,
            created_at: Some(now), updated_at: Some(now),
        }
    }

    pub(crate) fn attach_payment_reference(&mut self, reference: &str) {
        self.payment_reference = Some(reference.to_string());
        self.touch();
    }

    /// Server-side settlement after the gateway confirms the reference.
    pub(crate) fn settle_payment(&mut self) {
        self.payment_status = PaymentStatus::Paid;
        if self.status == OrderStatus::Pending { self.status = OrderStatus::Confirmed; }
        self.touch();
    }

    pub(crate) fn apply_status(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) { return Err(OrderError::InvalidTransition { from: self.status, to: next }); }
        self.status = next;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) { self.updated_at = Some(Utc::now()); }
}

/// Order submission body for `POST /vendor-orders`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVendorOrder {
    pub vendor_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    pub items: Vec<NewOrderItem>,
    pub delivery_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_instructions: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_id: String,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}

impl NewVendorOrder {
    /// Snapshot of a single-vendor cart.
    pub fn from_cart(cart: &Cart, booking_id: Option<String>, delivery_address: String, delivery_instructions: Option<String>) -> Result<Self, OrderError> {
        let vendor_id = match cart.vendor_ids().as_slice() {
            [] => return Err(OrderError::NoItems),
            [vendor] => vendor.to_string(),
            _ => return Err(OrderError::MixedVendors),
        };
        let items = cart.items().iter().map(|i| NewOrderItem {
            product_id: i.product_id().to_string(), quantity: i.quantity, special_instructions: i.special_instructions.clone(),
        }).collect();
        Ok(Self { vendor_id, booking_id, items, delivery_address, delivery_instructions })
    }
}

/// Gateway session relayed to the browser as a redirect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSession {
    pub authorization_url: String,
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_code: Option<String>,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw { Text(String), Number(u64) }
    Ok(match Raw::deserialize(deserializer)? { Raw::Text(s) => s, Raw::Number(n) => n.to_string() })
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum OrderError { NoItems, MixedVendors, InvalidTransition { from: OrderStatus, to: OrderStatus } }
impl std::error::Error for OrderError {}
impl std::fmt::Display for OrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoItems => write!(f, "Your cart is empty"),
            Self::MixedVendors => write!(f, "Orders can only contain products from one vendor"),
            Self::InvalidTransition { from, to } => write!(f, "Cannot move order from {} to {}", from.as_str(), to.as_str()),
        }
    }
}
