//! Backend API port and its adapters.

pub mod envelope;
pub mod http;
pub mod memory;

use async_trait::async_trait;
use crate::domain::aggregates::{Booking, NewVendorOrder, OrderStatus, PaymentSession, Product, VendorOrder};
use crate::error::Result;

pub use http::HttpVendorApi;
pub use memory::InMemoryVendorApi;

/// Calls the web layer makes against the marketplace backend.
///
/// Implementations normalize every backend answer into [`Result`]; callers
/// never inspect a `success` flag themselves.
#[async_trait]
pub trait VendorApi: Send + Sync {
    async fn fetch_product(&self, product_id: &str) -> Result<Product>;

    async fn create_order(&self, order: &NewVendorOrder) -> Result<VendorOrder>;

    async fn initialize_payment(&self, order_id: &str, email: &str) -> Result<PaymentSession>;

    /// A missing verification route surfaces as [`crate::MarketplaceError::EndpointMissing`].
    async fn verify_payment(&self, reference: &str) -> Result<VendorOrder>;

    async fn my_orders(&self) -> Result<Vec<VendorOrder>>;

    async fn all_orders(&self) -> Result<Vec<VendorOrder>>;

    async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Result<VendorOrder>;

    async fn bookings(&self) -> Result<Vec<Booking>>;
}
