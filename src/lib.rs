//! Rental Marketplace Web
//!
//! Guest and admin web layer for a short-term rental platform with an
//! on-site vendor marketplace.
//!
//! ## Features
//! - Session carts for vendor products
//! - Vendor order checkout with gateway-hosted payment and verification
//! - Admin dashboard and transaction aggregates
//! - Typed client for the marketplace backend

pub mod api;
pub mod checkout;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod error;
pub mod web;

pub use api::{HttpVendorApi, InMemoryVendorApi, VendorApi};
pub use checkout::{CheckoutForm, CheckoutState, OrderLifecycle, PaymentOutcome, PaymentReturn};
pub use config::{ApiConfig, AppConfig, BackendKind};
pub use domain::aggregates::{Booking, Cart, CartItem, OrderStatus, PaymentSession, PaymentStatus, Product, VendorOrder};
pub use domain::value_objects::Money;
pub use error::{MarketplaceError, Result};
