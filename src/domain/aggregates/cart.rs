//! Cart Aggregate
//!
//! The cart is ephemeral session state. It is never written anywhere; the
//! backend first sees its contents when an order is submitted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use crate::domain::aggregates::product::Product;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    id: String,
    items: Vec<CartItem>,
    subtotal: Money,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
    pub special_instructions: Option<String>,
}

impl CartItem {
    pub fn product_id(&self) -> &str { self.product.id() }
    pub fn line_total(&self, currency: &str) -> Money { self.product.unit_price(currency).multiply(self.quantity) }
}

impl Cart {
    pub fn new(currency: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(), items: vec![], subtotal: Money::zero(currency),
            currency: currency.to_string(), created_at: Utc::now(), updated_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn currency(&self) -> &str { &self.currency }
    /// Last time the contents changed.
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn get(&self, product_id: &str) -> Option<&CartItem> { self.items.iter().find(|i| i.product_id() == product_id) }

    /// Adds a product, or replaces the quantity of an existing entry.
    ///
    /// Quantity is clamped to `[1, max_order_quantity]` and to stock. A new
    /// instructions value replaces the old one; `None` keeps what was there.
    pub fn add_to_cart(&mut self, product: Product, quantity: u32, instructions: Option<String>) {
        let quantity = product.clamp_quantity(quantity);
        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id() == product.id()) {
            existing.quantity = quantity;
            if instructions.is_some() { existing.special_instructions = instructions; }
            existing.product = product;
        } else {
            self.items.push(CartItem { product, quantity, special_instructions: instructions });
        }
        self.recalculate();
    }

    pub fn remove_from_cart(&mut self, product_id: &str) {
        self.items.retain(|i| i.product_id() != product_id);
        self.recalculate();
    }

    /// Returns `false` when no entry matches; the cart is left untouched.
    pub fn update_cart_item(&mut self, product_id: &str, quantity: u32, instructions: Option<String>) -> bool {
        let Some(item) = self.items.iter_mut().find(|i| i.product_id() == product_id) else { return false };
        item.quantity = item.product.clamp_quantity(quantity);
        if instructions.is_some() { item.special_instructions = instructions; }
        self.recalculate();
        true
    }

    pub fn clear_cart(&mut self) { self.items.clear(); self.recalculate(); }

    pub fn cart_total(&self) -> Money { self.subtotal.clone() }

    pub fn cart_item_count(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }

    /// Distinct vendors in insertion order.
    pub fn vendor_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for item in &self.items {
            let id = item.product.vendor_id();
            if !ids.contains(&id) { ids.push(id); }
        }
        ids
    }

    fn recalculate(&mut self) {
        let amount = self.items.iter().map(|i| i.line_total(&self.currency).amount()).sum();
        self.subtotal = Money::new(amount, &self.currency);
        self.updated_at = Utc::now();
    }
}

impl Default for Cart { fn default() -> Self { Self::new(crate::domain::value_objects::DEFAULT_CURRENCY) } }
