use axum::{extract::{Path, Query, State}, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use crate::checkout::{CheckoutForm, PaymentOutcome, PaymentRequest, PaymentReturn};
use crate::domain::events::Phase;
use crate::domain::aggregates::{Cart, VendorOrder};
use crate::web::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct OrderView { pub success: bool, pub order: VendorOrder }

#[derive(Debug, Serialize)]
pub struct OrdersView { pub orders: Vec<VendorOrder> }

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRedirect { pub success: bool, pub authorization_url: String, pub reference: String }

/// Turns the session cart into a vendor order; the cart empties only on success.
pub async fn submit_order(State(s): State<AppState>, Path(session): Path<String>, Json(form): Json<CheckoutForm>) -> ApiResult<(StatusCode, Json<OrderView>)> {
    let cancel = s.request_token();
    // An unknown session submits an empty cart, which the lifecycle rejects.
    let cart = s.carts.peek(&session).await.unwrap_or_else(|| Arc::new(Mutex::new(Cart::new(s.carts.currency()))));
    let mut cart = cart.lock().await;
    let mut lifecycle = s.lifecycle();
    let order = lifecycle.create_vendor_order(&mut cart, &form, &cancel).await
        .map_err(|e| ApiError::from_error(e, Phase::CreateOrder.fallback_message()))?;
    Ok((StatusCode::CREATED, Json(OrderView { success: true, order })))
}

/// The browser follows `authorizationUrl` with a full-page navigation.
pub async fn initialize_payment(State(s): State<AppState>, Path(order_id): Path<String>, Json(r): Json<PaymentRequest>) -> ApiResult<Json<PaymentRedirect>> {
    let cancel = s.request_token();
    let mut lifecycle = s.lifecycle();
    let session = lifecycle.initialize_vendor_payment(&order_id, &r.email, &cancel).await
        .map_err(|e| ApiError::from_error(e, Phase::InitializePayment.fallback_message()))?;
    Ok(Json(PaymentRedirect { success: true, authorization_url: session.authorization_url, reference: session.reference }))
}

/// Landing page after the gateway redirect. Always renders an outcome.
pub async fn payment_return(State(s): State<AppState>, Query(params): Query<PaymentReturn>) -> Json<PaymentOutcome> {
    let cancel = s.request_token();
    let mut lifecycle = s.lifecycle();
    let verified = lifecycle.verify_vendor_payment(&params, &cancel).await;
    let outcome = lifecycle.outcome().unwrap_or_else(|| {
        let message = verified.err().map(|e| e.user_message(Phase::VerifyPayment.fallback_message()));
        PaymentOutcome::failure(message.unwrap_or_else(|| Phase::VerifyPayment.fallback_message().to_string()))
    });
    Json(outcome)
}

pub async fn my_orders(State(s): State<AppState>) -> ApiResult<Json<OrdersView>> {
    let orders = s.api.my_orders().await?;
    Ok(Json(OrdersView { orders }))
}
