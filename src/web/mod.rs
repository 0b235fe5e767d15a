//! HTTP surface: cart, checkout, payment return and admin views.

pub mod admin;
pub mod cart;
pub mod checkout;
pub mod session;

use axum::{http::StatusCode, response::{IntoResponse, Response}, routing::{get, patch, post, put}, Json, Router};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::api::VendorApi;
use crate::checkout::OrderLifecycle;
use crate::domain::events::FailureCause;
use crate::error::MarketplaceError;

pub use session::CartSessions;

pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn VendorApi>,
    pub carts: CartSessions,
    pub currency: String,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(api: Arc<dyn VendorApi>, currency: &str) -> Self {
        Self { api, carts: CartSessions::new(currency), currency: currency.to_string(), shutdown: CancellationToken::new() }
    }

    /// Ties in-flight checkout calls to process shutdown.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Cancelled when the server shuts down; a backend answer landing after that is discarded.
    pub(crate) fn request_token(&self) -> CancellationToken { self.shutdown.child_token() }

    pub(crate) fn lifecycle(&self) -> OrderLifecycle {
        OrderLifecycle::new(self.api.clone()).with_currency(&self.currency)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "rental-marketplace-web"})) }))
        .route("/api/cart/:session", get(cart::get_cart).delete(cart::clear_cart))
        .route("/api/cart/:session/items", post(cart::add_item))
        .route("/api/cart/:session/items/:product_id", put(cart::update_item).delete(cart::remove_item))
        .route("/api/cart/:session/orders", post(checkout::submit_order))
        .route("/api/vendor-orders/mine", get(checkout::my_orders))
        .route("/api/vendor-orders/:order_id/payment", post(checkout::initialize_payment))
        .route("/vendor/payment/success", get(checkout::payment_return))
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/transactions", get(admin::transactions))
        .route("/admin/vendor-orders", get(admin::vendor_orders))
        .route("/admin/vendor-orders/:order_id/status", patch(admin::update_status))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Error body: `{ "success": false, "message": "..." }`
#[derive(Debug)]
pub struct ApiError { status: StatusCode, message: String }

impl ApiError {
    /// `fallback` replaces messages that would leak transport details.
    pub fn from_error(err: MarketplaceError, fallback: &str) -> Self {
        let status = match err.cause() {
            FailureCause::Validation | FailureCause::MissingReference => StatusCode::UNPROCESSABLE_ENTITY,
            FailureCause::Backend if matches!(err, MarketplaceError::NotFound(_)) => StatusCode::NOT_FOUND,
            FailureCause::Backend => StatusCode::BAD_REQUEST,
            FailureCause::EndpointMissing => StatusCode::SERVICE_UNAVAILABLE,
            FailureCause::Cancelled => StatusCode::REQUEST_TIMEOUT,
            FailureCause::Unexpected => StatusCode::BAD_GATEWAY,
        };
        if status == StatusCode::BAD_GATEWAY { tracing::error!(error = %err, "backend call failed"); }
        Self { status, message: err.user_message(fallback) }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self { status: StatusCode::UNPROCESSABLE_ENTITY, message: message.into() }
    }
}

impl From<MarketplaceError> for ApiError {
    fn from(err: MarketplaceError) -> Self { Self::from_error(err, GENERIC_FAILURE_MESSAGE) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "success": false, "message": self.message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
