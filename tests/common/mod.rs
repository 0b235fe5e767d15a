#![allow(dead_code)]

use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use rental_marketplace_web::Product;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

pub const TEST_TOKEN: &str = "test-token";
pub const PRODUCT_A: &str = "product-a";
pub const VENDOR: &str = "vendor-1";
/// Payment initialization for these addresses fails with a bare `success: false`.
pub const DECLINED_DOMAIN: &str = "@declined.test";

/// 2×Product A fits: min 1, max 5, stock 10, price 1000.
pub fn product_a() -> Product {
    Product::listing(PRODUCT_A, VENDOR, "Product A", dec!(1000)).with_bounds(1, 5, 10)
}

#[derive(Clone, Default)]
struct FakeState {
    orders: Arc<Mutex<Vec<Value>>>,
    /// reference -> index into `orders`
    references: Arc<Mutex<HashMap<String, usize>>>,
}

type Reply = (StatusCode, Json<Value>);

async fn product(Path(id): Path<String>) -> Reply {
    if id != PRODUCT_A {
        return (StatusCode::NOT_FOUND, Json(json!({ "success": false, "message": "Product not found" })));
    }
    (StatusCode::OK, Json(json!({ "success": true, "product": {
        "_id": PRODUCT_A, "name": "Product A", "price": 1000, "stockQuantity": 10,
        "minOrderQuantity": 1, "maxOrderQuantity": 5, "isAvailable": true,
        "vendor": { "_id": VENDOR, "businessName": "Mama Put Kitchen" }
    }})))
}

async fn create_order(State(s): State<FakeState>, Json(body): Json<Value>) -> Reply {
    let mut errors = vec![];
    if body["deliveryAddress"].as_str().unwrap_or_default().is_empty() { errors.push("Delivery address is required"); }
    if body["bookingId"].is_null() { errors.push("Booking reference is required"); }
    if !errors.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "success": false, "errors": errors })));
    }
    let items: Vec<Value> = body["items"].as_array().cloned().unwrap_or_default();
    let total: u64 = items.iter().map(|i| i["quantity"].as_u64().unwrap_or(0) * 1000).sum();
    let mut orders = s.orders.lock().await;
    let number = 1001 + orders.len() as u64;
    let order = json!({
        "_id": format!("order-{number}"), "orderNumber": number, "user": "guest-1",
        "vendor": { "_id": body["vendorId"], "businessName": "Mama Put Kitchen" },
        "booking": body["bookingId"],
        "items": items.iter().map(|i| json!({
            "product": i["productId"], "name": "Product A", "quantity": i["quantity"], "price": 1000
        })).collect::<Vec<_>>(),
        "subtotal": total, "serviceFee": 0, "deliveryFee": 0, "totalAmount": total,
        "status": "pending", "paymentStatus": "pending",
        "deliveryAddress": body["deliveryAddress"], "createdAt": "2026-10-16T09:00:00Z"
    });
    orders.push(order.clone());
    (StatusCode::CREATED, Json(json!({ "success": true, "order": order })))
}

async fn initialize(State(s): State<FakeState>, Path(id): Path<String>, Json(body): Json<Value>) -> Reply {
    let orders = s.orders.lock().await;
    let Some(index) = orders.iter().position(|o| o["_id"] == id) else {
        return (StatusCode::NOT_FOUND, Json(json!({ "success": false, "message": "Order not found" })));
    };
    if body["email"].as_str().unwrap_or_default().is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "success": false, "message": "Email is required" })));
    }
    if body["email"].as_str().unwrap_or_default().ends_with(DECLINED_DOMAIN) {
        return (StatusCode::PAYMENT_REQUIRED, Json(json!({ "success": false })));
    }
    let reference = format!("ref-{id}");
    s.references.lock().await.insert(reference.clone(), index);
    (StatusCode::OK, Json(json!({ "success": true, "paymentData": {
        "authorization_url": format!("https://checkout.gateway.test/{reference}"),
        "access_code": "ac_123", "reference": reference
    }})))
}

async fn verify(State(s): State<FakeState>, Query(q): Query<HashMap<String, String>>) -> Reply {
    let reference = q.get("reference").cloned().unwrap_or_default();
    let Some(index) = s.references.lock().await.get(&reference).copied() else {
        return (StatusCode::OK, Json(json!({ "success": false, "message": "Transaction was not successful" })));
    };
    let mut orders = s.orders.lock().await;
    let order = &mut orders[index];
    order["paymentStatus"] = json!("paid");
    order["status"] = json!("confirmed");
    order["paymentReference"] = json!(reference);
    (StatusCode::OK, Json(json!({ "success": true, "message": "Payment verified", "order": order.clone() })))
}

async fn mine(State(s): State<FakeState>, headers: HeaderMap) -> Reply {
    let expected = format!("Bearer {TEST_TOKEN}");
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some(expected.as_str()) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "success": false, "message": "Not authorized" })));
    }
    let orders = s.orders.lock().await.clone();
    (StatusCode::OK, Json(json!({ "orders": orders })))
}

async fn all_orders(State(s): State<FakeState>) -> Reply {
    let orders = s.orders.lock().await.clone();
    (StatusCode::OK, Json(json!({ "success": true, "orders": orders })))
}

async fn bookings() -> Reply {
    (StatusCode::OK, Json(json!({ "bookings": [{
        "_id": "booking-1", "bookingReference": "BK-1", "property": { "_id": "h1", "title": "Lekki Loft" },
        "user": "guest-1", "totalPrice": 90000, "status": "confirmed", "paymentStatus": "paid",
        "checkIn": "2026-10-18T14:00:00.000Z", "checkOut": "2026-10-21T11:00:00.000Z",
        "createdAt": "2026-10-12T08:00:00Z"
    }]})))
}

/// Starts a stand-in backend on an ephemeral port and returns its API base URL.
pub async fn spawn_backend(with_verify_route: bool) -> String {
    let mut app = Router::new()
        .route("/api/vendor-products/:id", get(product))
        .route("/api/vendor-orders", post(create_order).get(all_orders))
        .route("/api/vendor-orders/mine", get(mine))
        .route("/api/vendor-orders/:id/payment/initialize", post(initialize))
        .route("/api/bookings", get(bookings));
    if with_verify_route {
        app = app.route("/api/vendor-orders/payment/verify", get(verify));
    }
    let app = app.with_state(FakeState::default());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}/api")
}
