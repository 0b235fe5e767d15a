mod common;

use common::{product_a, spawn_backend, DECLINED_DOMAIN, PRODUCT_A, TEST_TOKEN, VENDOR};
use rental_marketplace_web::checkout::{CheckoutForm, CheckoutState, OrderLifecycle, PaymentOutcome, PaymentReturn};
use rental_marketplace_web::domain::aggregates::{NewOrderItem, NewVendorOrder};
use rental_marketplace_web::{ApiConfig, Cart, HttpVendorApi, MarketplaceError, PaymentStatus, VendorApi};
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

async fn client(with_verify_route: bool) -> HttpVendorApi {
    let base_url = spawn_backend(with_verify_route).await;
    HttpVendorApi::new(&ApiConfig::new(base_url).with_timeout(5)).unwrap()
}

fn form() -> CheckoutForm {
    CheckoutForm { booking_id: Some("booking-1".into()), delivery_address: "Lekki Loft, Unit 3".into(), delivery_instructions: None }
}

#[tokio::test]
async fn test_end_to_end_checkout_over_http() {
    let api = client(true).await;
    let cancel = CancellationToken::new();

    let product = api.fetch_product(PRODUCT_A).await.unwrap();
    assert_eq!(product.vendor().display_name(), "Mama Put Kitchen");
    let mut cart = Cart::default();
    cart.add_to_cart(product, 2, None);
    assert_eq!(cart.cart_total().amount(), dec!(2000));

    let mut lifecycle = OrderLifecycle::new(Arc::new(api.clone()));
    let order = lifecycle.create_vendor_order(&mut cart, &form(), &cancel).await.unwrap();
    assert_eq!(order.order_number(), "1001");
    assert_eq!(order.payment_status(), PaymentStatus::Pending);
    assert!(cart.is_empty());

    let session = lifecycle.initialize_vendor_payment(order.id(), "guest@example.com", &cancel).await.unwrap();
    assert_eq!(session.authorization_url, format!("https://checkout.gateway.test/{}", session.reference));
    assert_eq!(session.access_code.as_deref(), Some("ac_123"));

    let back = PaymentReturn { reference: Some(session.reference.clone()), trxref: Some(session.reference.clone()) };
    let verified = lifecycle.verify_vendor_payment(&back, &cancel).await.unwrap();
    assert_eq!(verified.order_number(), "1001");
    assert_eq!(verified.payment_status(), PaymentStatus::Paid);
    assert_eq!(verified.payment_reference(), Some(session.reference.as_str()));
    assert!(lifecycle.outcome().unwrap().is_success());
}

#[tokio::test]
async fn test_verify_surfaces_backend_message() {
    let api = client(true).await;
    let err = api.verify_payment("ref-unknown").await.unwrap_err();
    assert!(matches!(err, MarketplaceError::Backend(_)));
    assert_eq!(err.to_string(), "Transaction was not successful");
}

#[tokio::test]
async fn test_verify_without_route_reports_missing_endpoint() {
    let api = client(false).await;
    let err = api.verify_payment("ref-order-1001").await.unwrap_err();
    assert!(matches!(err, MarketplaceError::EndpointMissing));
    assert!(err.to_string().contains("endpoint not found"));

    let mut lifecycle = OrderLifecycle::new(Arc::new(api));
    let back = PaymentReturn { reference: None, trxref: Some("ref-order-1001".into()) };
    assert!(lifecycle.verify_vendor_payment(&back, &CancellationToken::new()).await.is_err());
    match lifecycle.outcome().unwrap() {
        PaymentOutcome::Failure { message, .. } => assert!(message.contains("contact support")),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn test_bare_rejection_shows_phase_message() {
    let api = client(true).await;
    let cancel = CancellationToken::new();
    let mut cart = Cart::default();
    cart.add_to_cart(api.fetch_product(PRODUCT_A).await.unwrap(), 1, None);
    let mut lifecycle = OrderLifecycle::new(Arc::new(api));
    let order = lifecycle.create_vendor_order(&mut cart, &form(), &cancel).await.unwrap();

    let email = format!("guest{DECLINED_DOMAIN}");
    let err = lifecycle.initialize_vendor_payment(order.id(), &email, &cancel).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::Rejected));
    match lifecycle.state() {
        CheckoutState::Failed { message, .. } => assert_eq!(message, "Failed to initialize payment"),
        other => panic!("unexpected state {other:?}"),
    }
}

#[tokio::test]
async fn test_validation_errors_are_joined() {
    let api = client(true).await;
    let request = NewVendorOrder {
        vendor_id: VENDOR.into(), booking_id: None,
        items: vec![NewOrderItem { product_id: PRODUCT_A.into(), quantity: 1, special_instructions: None }],
        delivery_address: String::new(), delivery_instructions: None,
    };
    let message = api.create_order(&request).await.unwrap_err().to_string();
    assert!(message.contains("Delivery address is required"));
    assert!(message.contains("Booking reference is required"));
    assert!(message.contains(", "));
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let api = client(true).await;
    match api.fetch_product("nope").await.unwrap_err() {
        MarketplaceError::NotFound(message) => assert_eq!(message, "Product not found"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_token_is_forwarded() {
    let base_url = spawn_backend(true).await;
    let anonymous = HttpVendorApi::new(&ApiConfig::new(base_url.clone())).unwrap();
    assert_eq!(anonymous.my_orders().await.unwrap_err().to_string(), "Not authorized");
    let signed_in = HttpVendorApi::new(&ApiConfig::new(base_url).with_token(TEST_TOKEN)).unwrap();
    assert!(signed_in.my_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_listings_without_success_flag() {
    let api = client(true).await;
    let bookings = api.bookings().await.unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].nights(), 3);
    assert!(api.all_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_local_product_matches_backend_limits() {
    let api = client(true).await;
    let remote = api.fetch_product(PRODUCT_A).await.unwrap();
    assert_eq!(remote.bounds(), product_a().bounds());
    assert_eq!(remote.price(), product_a().price());
}
