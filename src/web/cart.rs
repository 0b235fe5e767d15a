use axum::{extract::{Path, State}, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::{Cart, CartItem};
use crate::domain::value_objects::Money;
use crate::web::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView { pub cart_id: String, pub items: Vec<CartItem>, pub total: Money, pub item_count: u32 }

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self { cart_id: cart.id().to_string(), items: cart.items().to_vec(), total: cart.cart_total(), item_count: cart.cart_item_count() }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest { pub product_id: String, pub quantity: u32, #[serde(default)] pub special_instructions: Option<String> }

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartItemRequest { pub quantity: u32, #[serde(default)] pub special_instructions: Option<String> }

/// A session that never added anything reads as an empty cart without getting one.
async fn current_view(s: &AppState, session: &str) -> CartView {
    match s.carts.peek(session).await {
        Some(cart) => {
            let cart = cart.lock().await;
            CartView::from(&*cart)
        }
        None => CartView::from(&Cart::new(s.carts.currency())),
    }
}

pub async fn get_cart(State(s): State<AppState>, Path(session): Path<String>) -> Json<CartView> {
    Json(current_view(&s, &session).await)
}

pub async fn add_item(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<AddToCartRequest>) -> ApiResult<Json<CartView>> {
    let product = s.api.fetch_product(&r.product_id).await?;
    product.validate_quantity(r.quantity).map_err(|e| ApiError::validation(e.to_string()))?;
    let cart = s.carts.cart(&session).await;
    let mut cart = cart.lock().await;
    cart.add_to_cart(product, r.quantity, r.special_instructions);
    tracing::debug!(%session, product_id = %r.product_id, count = cart.cart_item_count(), "cart updated");
    Ok(Json(CartView::from(&*cart)))
}

/// Unknown products leave the cart as it was.
pub async fn update_item(State(s): State<AppState>, Path((session, product_id)): Path<(String, String)>, Json(r): Json<UpdateCartItemRequest>) -> ApiResult<Json<CartView>> {
    let Some(cart) = s.carts.peek(&session).await else { return Ok(Json(current_view(&s, &session).await)) };
    let mut cart = cart.lock().await;
    if let Some(item) = cart.get(&product_id) {
        item.product.validate_quantity(r.quantity).map_err(|e| ApiError::validation(e.to_string()))?;
    }
    cart.update_cart_item(&product_id, r.quantity, r.special_instructions);
    Ok(Json(CartView::from(&*cart)))
}

pub async fn remove_item(State(s): State<AppState>, Path((session, product_id)): Path<(String, String)>) -> Json<CartView> {
    let Some(cart) = s.carts.peek(&session).await else { return Json(current_view(&s, &session).await) };
    let mut cart = cart.lock().await;
    cart.remove_from_cart(&product_id);
    Json(CartView::from(&*cart))
}

/// Empties the cart and drops the session; the next request starts a fresh cart.
pub async fn clear_cart(State(s): State<AppState>, Path(session): Path<String>) -> StatusCode {
    if let Some(cart) = s.carts.peek(&session).await { cart.lock().await.clear_cart(); }
    s.carts.forget(&session).await;
    StatusCode::NO_CONTENT
}
