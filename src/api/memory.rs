//! In-process backend
//!
//! Plays the backend and the payment gateway for tests and local development
//! (`MARKETPLACE_BACKEND=memory`). Nothing survives a restart.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use crate::api::VendorApi;
use crate::domain::aggregates::{Booking, NewVendorOrder, OrderItem, OrderStatus, PaymentSession, Product, Reference, VendorOrder};
use crate::error::{MarketplaceError, Result};

pub const FIRST_ORDER_NUMBER: u64 = 1001;
const GATEWAY_CHECKOUT_URL: &str = "https://checkout.gateway.test";

#[derive(Default)]
struct BackendState {
    products: HashMap<String, Product>,
    orders: Vec<VendorOrder>,
    bookings: Vec<Booking>,
    /// reference -> order id
    sessions: HashMap<String, String>,
    /// references the gateway reports as completed
    completed: HashSet<String>,
    next_order_number: u64,
    service_fee: Decimal,
    delivery_fee: Decimal,
    verify_route_missing: bool,
}

#[derive(Clone)]
pub struct InMemoryVendorApi {
    state: Arc<RwLock<BackendState>>,
    user_id: String,
}

impl Default for InMemoryVendorApi {
    fn default() -> Self { Self::new() }
}

impl InMemoryVendorApi {
    pub fn new() -> Self { Self::with_fees(Decimal::ZERO, Decimal::ZERO) }

    pub fn with_fees(service_fee: Decimal, delivery_fee: Decimal) -> Self {
        let state = BackendState { next_order_number: FIRST_ORDER_NUMBER, service_fee, delivery_fee, ..Default::default() };
        Self { state: Arc::new(RwLock::new(state)), user_id: "guest".to_string() }
    }

    pub async fn add_product(&self, product: Product) {
        self.state.write().await.products.insert(product.id().to_string(), product);
    }

    pub async fn add_booking(&self, booking: Booking) {
        self.state.write().await.bookings.push(booking);
    }

    /// The guest finished paying on the gateway's hosted page.
    pub async fn complete_gateway_payment(&self, reference: &str) {
        self.state.write().await.completed.insert(reference.to_string());
    }

    /// Makes the verification route answer like an unregistered endpoint.
    pub async fn remove_verify_route(&self) {
        self.state.write().await.verify_route_missing = true;
    }

    pub async fn order(&self, order_id: &str) -> Option<VendorOrder> {
        self.state.read().await.orders.iter().find(|o| o.id() == order_id).cloned()
    }
}

#[async_trait]
impl VendorApi for InMemoryVendorApi {
    async fn fetch_product(&self, product_id: &str) -> Result<Product> {
        self.state.read().await.products.get(product_id).cloned()
            .ok_or_else(|| MarketplaceError::NotFound(format!("Product {product_id} not found")))
    }

    async fn create_order(&self, request: &NewVendorOrder) -> Result<VendorOrder> {
        let mut state = self.state.write().await;
        let mut errors = Vec::new();
        let mut items = Vec::with_capacity(request.items.len());
        if request.items.is_empty() { errors.push("Order must contain at least one item".to_string()); }
        if request.delivery_address.trim().is_empty() { errors.push("Delivery address is required".to_string()); }
        for line in &request.items {
            let Some(product) = state.products.get(&line.product_id) else {
                errors.push(format!("Product {} not found", line.product_id));
                continue;
            };
            if product.vendor_id() != request.vendor_id {
                errors.push(format!("{} is not sold by this vendor", product.name()));
            }
            if let Err(e) = product.validate_quantity(line.quantity) {
                errors.push(format!("{}: {e}", product.name()));
            }
            items.push(OrderItem {
                product: Reference::Populated { id: product.id().to_string(), name: Some(product.name().to_string()) },
                name: Some(product.name().to_string()), quantity: line.quantity, price: product.price(),
                special_instructions: line.special_instructions.clone(),
            });
        }
        if !errors.is_empty() { return Err(MarketplaceError::Backend(errors.join(", "))); }

        let order_number = state.next_order_number;
        state.next_order_number += 1;
        let order = VendorOrder::placed(
            Uuid::now_v7().to_string(), order_number.to_string(), Some(self.user_id.clone()),
            request, items, (state.service_fee, state.delivery_fee),
        );
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn initialize_payment(&self, order_id: &str, email: &str) -> Result<PaymentSession> {
        let mut state = self.state.write().await;
        if email.trim().is_empty() { return Err(MarketplaceError::Backend("Email is required".to_string())); }
        let reference = format!("VO-{}", Uuid::new_v4().simple());
        let order = state.orders.iter_mut().find(|o| o.id() == order_id)
            .ok_or_else(|| MarketplaceError::NotFound(format!("Order {order_id} not found")))?;
        if order.is_paid() { return Err(MarketplaceError::Backend("Order has already been paid".to_string())); }
        order.attach_payment_reference(&reference);
        state.sessions.insert(reference.clone(), order_id.to_string());
        Ok(PaymentSession { authorization_url: format!("{GATEWAY_CHECKOUT_URL}/{reference}"), reference, access_code: None })
    }

    async fn verify_payment(&self, reference: &str) -> Result<VendorOrder> {
        let mut state = self.state.write().await;
        if state.verify_route_missing { return Err(MarketplaceError::EndpointMissing); }
        let order_id = state.sessions.get(reference).cloned()
            .ok_or_else(|| MarketplaceError::Backend("Transaction reference not found".to_string()))?;
        if !state.completed.contains(reference) {
            return Err(MarketplaceError::Backend("Payment was not completed".to_string()));
        }
        let order = state.orders.iter_mut().find(|o| o.id() == order_id)
            .ok_or_else(|| MarketplaceError::NotFound(format!("Order {order_id} not found")))?;
        if !order.is_paid() { order.settle_payment(); }
        Ok(order.clone())
    }

    async fn my_orders(&self) -> Result<Vec<VendorOrder>> {
        let state = self.state.read().await;
        Ok(state.orders.iter().filter(|o| o.user().map(Reference::id) == Some(self.user_id.as_str())).cloned().collect())
    }

    async fn all_orders(&self) -> Result<Vec<VendorOrder>> {
        Ok(self.state.read().await.orders.clone())
    }

    async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Result<VendorOrder> {
        let mut state = self.state.write().await;
        let order = state.orders.iter_mut().find(|o| o.id() == order_id)
            .ok_or_else(|| MarketplaceError::NotFound(format!("Order {order_id} not found")))?;
        order.apply_status(status).map_err(|e| MarketplaceError::Backend(e.to_string()))?;
        Ok(order.clone())
    }

    async fn bookings(&self) -> Result<Vec<Booking>> {
        Ok(self.state.read().await.bookings.clone())
    }
}
