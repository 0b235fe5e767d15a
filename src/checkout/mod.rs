//! Order lifecycle: create order → initialize payment → gateway redirect → verify.
//!
//! Each phase is one awaited backend call started by an explicit guest action.
//! All calls race a [`CancellationToken`]; once the token fires, whatever the
//! backend answers is dropped and neither the cart nor the lifecycle state moves.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use validator::Validate;
use crate::api::VendorApi;
use crate::domain::aggregates::{Cart, NewVendorOrder, OrderStatus, PaymentSession, PaymentStatus, VendorOrder};
use crate::domain::events::{CheckoutEvent, FailureCause, Phase};
use crate::domain::value_objects::{Money, DEFAULT_CURRENCY};
use crate::error::{MarketplaceError, Result};

pub const MARKETPLACE_PATH: &str = "/marketplace";
pub const MY_ORDERS_PATH: &str = "/vendor/orders";

/// Delivery details the guest fills in before submitting the cart.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutForm {
    #[serde(default)]
    pub booking_id: Option<String>,
    #[validate(length(min = 1, message = "Delivery address is required"))]
    pub delivery_address: String,
    #[serde(default)]
    pub delivery_instructions: Option<String>,
}

impl CheckoutForm {
    /// Trimmed copy; blank optional fields become `None`.
    pub fn normalized(&self) -> Self {
        let present = |v: &Option<String>| v.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string);
        Self {
            booking_id: present(&self.booking_id),
            delivery_address: self.delivery_address.trim().to_string(),
            delivery_instructions: present(&self.delivery_instructions),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PaymentRequest {
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
}

/// Query parameters the gateway appends when it sends the guest back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentReturn {
    pub reference: Option<String>,
    pub trxref: Option<String>,
}

impl PaymentReturn {
    /// `reference` wins over `trxref`; blank values count as absent.
    pub fn reference(&self) -> Option<&str> {
        [&self.reference, &self.trxref].into_iter().flatten().map(|s| s.trim()).find(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CheckoutState {
    Idle,
    OrderCreated { order: Box<VendorOrder> },
    PaymentInitialized { order_id: String, session: PaymentSession },
    Verified { order: Box<VendorOrder> },
    Failed { phase: Phase, cause: FailureCause, message: String },
}

/// What the payment return page renders.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentOutcome {
    #[serde(rename_all = "camelCase")]
    Success {
        order_id: String,
        order_number: String,
        amount: Money,
        vendor: String,
        order_status: OrderStatus,
        payment_status: PaymentStatus,
    },
    Failure { message: String, actions: Vec<OutcomeAction> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeAction { pub label: &'static str, pub href: &'static str }

impl PaymentOutcome {
    /// `currency` is the configured display currency; order totals arrive without one.
    pub fn success(order: &VendorOrder, currency: &str) -> Self {
        Self::Success {
            order_id: order.id().to_string(),
            order_number: order.order_number().to_string(),
            amount: order.total(currency),
            vendor: order.vendor().display_name().to_string(),
            order_status: order.status(),
            payment_status: order.payment_status(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
            actions: vec![
                OutcomeAction { label: "Back to marketplace", href: MARKETPLACE_PATH },
                OutcomeAction { label: "View my orders", href: MY_ORDERS_PATH },
            ],
        }
    }

    pub fn is_success(&self) -> bool { matches!(self, Self::Success { .. }) }
}

pub struct OrderLifecycle {
    api: Arc<dyn VendorApi>,
    currency: String,
    state: CheckoutState,
    events: Vec<CheckoutEvent>,
}

impl OrderLifecycle {
    pub fn new(api: Arc<dyn VendorApi>) -> Self {
        Self { api, currency: DEFAULT_CURRENCY.to_string(), state: CheckoutState::Idle, events: vec![] }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn state(&self) -> &CheckoutState { &self.state }

    pub fn take_events(&mut self) -> Vec<CheckoutEvent> { std::mem::take(&mut self.events) }

    /// Submits the cart. The cart is cleared only once the backend has accepted the order.
    pub async fn create_vendor_order(&mut self, cart: &mut Cart, form: &CheckoutForm, cancel: &CancellationToken) -> Result<VendorOrder> {
        let phase = Phase::CreateOrder;
        let form = form.normalized();
        let request = match form.validate().map_err(MarketplaceError::from).and_then(|_| {
            Ok(NewVendorOrder::from_cart(cart, form.booking_id.clone(), form.delivery_address.clone(), form.delivery_instructions.clone())?)
        }) {
            Ok(request) => request,
            Err(e) => return Err(self.fail(phase, None, e)),
        };

        let result = guarded(cancel, self.api.create_order(&request)).await;
        let order = match result {
            Ok(order) => order,
            Err(e) => return Err(self.fail(phase, None, e)),
        };

        cart.clear_cart();
        tracing::info!(order_id = order.id(), order_number = order.order_number(), total = %order.total_amount(), "vendor order created");
        self.events.push(CheckoutEvent::OrderCreated {
            order_id: order.id().to_string(), order_number: order.order_number().to_string(), total: order.total_amount(),
        });
        self.state = CheckoutState::OrderCreated { order: Box::new(order.clone()) };
        Ok(order)
    }

    /// Returns the session whose `authorization_url` the guest is redirected to.
    pub async fn initialize_vendor_payment(&mut self, order_id: &str, email: &str, cancel: &CancellationToken) -> Result<PaymentSession> {
        let phase = Phase::InitializePayment;
        let request = PaymentRequest { email: email.trim().to_string() };
        if order_id.trim().is_empty() {
            return Err(self.fail(phase, None, MarketplaceError::Validation("Order id is required".to_string())));
        }
        if let Err(e) = request.validate() {
            return Err(self.fail(phase, None, e.into()));
        }

        let result = guarded(cancel, self.api.initialize_payment(order_id, &request.email)).await;
        let session = match result {
            Ok(session) => session,
            Err(e) => return Err(self.fail(phase, None, e)),
        };

        tracing::info!(order_id, reference = %session.reference, "payment session initialized");
        self.events.push(CheckoutEvent::PaymentInitialized { order_id: order_id.to_string(), reference: session.reference.clone() });
        self.state = CheckoutState::PaymentInitialized { order_id: order_id.to_string(), session: session.clone() };
        Ok(session)
    }

    /// Confirms the payment with the backend after the gateway redirect.
    ///
    /// Without a `reference`/`trxref` no call is made. The returned order is
    /// exactly what the backend reported.
    pub async fn verify_vendor_payment(&mut self, params: &PaymentReturn, cancel: &CancellationToken) -> Result<VendorOrder> {
        let phase = Phase::VerifyPayment;
        let Some(reference) = params.reference().map(str::to_string) else {
            return Err(self.fail(phase, None, MarketplaceError::MissingReference));
        };

        let result = guarded(cancel, self.api.verify_payment(&reference)).await;
        let order = match result {
            Ok(order) => order,
            Err(e) => return Err(self.fail(phase, Some(&reference), e)),
        };

        tracing::info!(order_id = order.id(), %reference, payment_status = order.payment_status().as_str(), "payment verified");
        self.events.push(CheckoutEvent::PaymentVerified { order_id: order.id().to_string(), reference });
        self.state = CheckoutState::Verified { order: Box::new(order.clone()) };
        Ok(order)
    }

    /// The terminal view, once verification has either succeeded or failed.
    pub fn outcome(&self) -> Option<PaymentOutcome> {
        match &self.state {
            CheckoutState::Verified { order } => Some(PaymentOutcome::success(order, &self.currency)),
            CheckoutState::Failed { message, .. } => Some(PaymentOutcome::failure(message.clone())),
            _ => None,
        }
    }

    fn fail(&mut self, phase: Phase, reference: Option<&str>, err: MarketplaceError) -> MarketplaceError {
        let cause = err.cause();
        match cause {
            FailureCause::Cancelled => {
                tracing::debug!(?phase, "checkout call abandoned");
                self.events.push(CheckoutEvent::Abandoned { phase });
                return err;
            }
            FailureCause::Validation => {
                tracing::debug!(?phase, error = %err, "checkout input rejected");
                return err;
            }
            FailureCause::Unexpected => tracing::error!(?phase, cause = cause.as_str(), reference, error = %err, "checkout failed"),
            _ => tracing::warn!(?phase, cause = cause.as_str(), reference, error = %err, "checkout failed"),
        }
        let message = err.user_message(phase.fallback_message());
        if phase == Phase::VerifyPayment {
            self.events.push(CheckoutEvent::VerificationFailed { reference: reference.map(str::to_string), cause, message: message.clone() });
        }
        self.state = CheckoutState::Failed { phase, cause, message };
        err
    }
}

/// Runs `call` unless `cancel` fires first. A result that lands after cancellation is discarded.
async fn guarded<T>(cancel: &CancellationToken, call: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(MarketplaceError::Cancelled),
        result = call => if cancel.is_cancelled() { Err(MarketplaceError::Cancelled) } else { result },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryVendorApi;
    use crate::domain::aggregates::{Booking, Product};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    /// Does the backend's work right away but answers only after `delay`.
    struct SlowBackend { inner: InMemoryVendorApi, delay: Duration }

    impl SlowBackend {
        async fn late<T>(&self, answer: T) -> T {
            tokio::time::sleep(self.delay).await;
            answer
        }
    }

    #[async_trait]
    impl VendorApi for SlowBackend {
        async fn fetch_product(&self, id: &str) -> Result<Product> { self.late(self.inner.fetch_product(id).await).await }
        async fn create_order(&self, o: &NewVendorOrder) -> Result<VendorOrder> { self.late(self.inner.create_order(o).await).await }
        async fn initialize_payment(&self, id: &str, email: &str) -> Result<PaymentSession> { self.late(self.inner.initialize_payment(id, email).await).await }
        async fn verify_payment(&self, reference: &str) -> Result<VendorOrder> { self.late(self.inner.verify_payment(reference).await).await }
        async fn my_orders(&self) -> Result<Vec<VendorOrder>> { self.inner.my_orders().await }
        async fn all_orders(&self) -> Result<Vec<VendorOrder>> { self.inner.all_orders().await }
        async fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<VendorOrder> { self.inner.update_order_status(id, status).await }
        async fn bookings(&self) -> Result<Vec<Booking>> { self.inner.bookings().await }
    }

    fn cancel_after(ms: u64) -> CancellationToken {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            trigger.cancel();
        });
        cancel
    }

    fn form() -> CheckoutForm {
        CheckoutForm { booking_id: Some("b1".into()), delivery_address: "Unit 3, Lekki Loft".into(), delivery_instructions: None }
    }

    async fn setup() -> (InMemoryVendorApi, OrderLifecycle, Cart) {
        let api = InMemoryVendorApi::new();
        let product = Product::listing("pa", "v1", "Product A", dec!(1000)).with_bounds(1, 5, 10);
        api.add_product(product.clone()).await;
        let mut cart = Cart::default();
        cart.add_to_cart(product, 2, None);
        let lifecycle = OrderLifecycle::new(Arc::new(api.clone()));
        (api, lifecycle, cart)
    }

    #[test]
    fn test_reference_precedence() {
        let both = PaymentReturn { reference: Some("r1".into()), trxref: Some("t1".into()) };
        assert_eq!(both.reference(), Some("r1"));
        let trx = PaymentReturn { reference: Some("  ".into()), trxref: Some("t1".into()) };
        assert_eq!(trx.reference(), Some("t1"));
        assert_eq!(PaymentReturn::default().reference(), None);
    }

    #[tokio::test]
    async fn test_missing_reference_fails_locally() {
        let (_api, mut lifecycle, _cart) = setup().await;
        let err = lifecycle.verify_vendor_payment(&PaymentReturn::default(), &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, MarketplaceError::MissingReference));
        match lifecycle.state() {
            CheckoutState::Failed { cause, .. } => assert_eq!(*cause, FailureCause::MissingReference),
            other => panic!("unexpected state {other:?}"),
        }
        assert!(!lifecycle.outcome().unwrap().is_success());
    }

    #[tokio::test]
    async fn test_invalid_form_keeps_cart() {
        let (_api, mut lifecycle, mut cart) = setup().await;
        let bad = CheckoutForm { delivery_address: String::new(), ..form() };
        let err = lifecycle.create_vendor_order(&mut cart, &bad, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "Delivery address is required");
        assert_eq!(cart.cart_item_count(), 2);
        assert!(matches!(lifecycle.state(), CheckoutState::Idle));
    }

    #[tokio::test]
    async fn test_blank_address_is_rejected_locally() {
        let (api, mut lifecycle, mut cart) = setup().await;
        let blank = CheckoutForm { delivery_address: "   ".into(), ..form() };
        let err = lifecycle.create_vendor_order(&mut cart, &blank, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, MarketplaceError::Validation(_)));
        assert_eq!(err.to_string(), "Delivery address is required");
        assert!(matches!(lifecycle.state(), CheckoutState::Idle));
        assert_eq!(cart.cart_item_count(), 2);
        assert!(api.all_orders().await.unwrap().is_empty());
    }

    #[test]
    fn test_form_normalization() {
        let raw = CheckoutForm { booking_id: Some(" ".into()), delivery_address: "  Unit 3 ".into(), delivery_instructions: Some(" gate 2 ".into()) };
        let form = raw.normalized();
        assert_eq!(form.booking_id, None);
        assert_eq!(form.delivery_address, "Unit 3");
        assert_eq!(form.delivery_instructions.as_deref(), Some("gate 2"));
    }

    #[tokio::test]
    async fn test_cancelled_submission_leaves_cart_alone() {
        let (_api, mut lifecycle, mut cart) = setup().await;
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = lifecycle.create_vendor_order(&mut cart, &form(), &cancel).await.unwrap_err();
        assert!(matches!(err, MarketplaceError::Cancelled));
        assert_eq!(cart.cart_item_count(), 2);
        assert!(matches!(lifecycle.state(), CheckoutState::Idle));
        assert_eq!(lifecycle.take_events(), vec![CheckoutEvent::Abandoned { phase: Phase::CreateOrder }]);
    }

    #[tokio::test]
    async fn test_answer_after_cancel_is_discarded() {
        let (api, _, mut cart) = setup().await;
        let mut lifecycle = OrderLifecycle::new(Arc::new(SlowBackend { inner: api.clone(), delay: Duration::from_millis(500) }));

        let err = lifecycle.create_vendor_order(&mut cart, &form(), &cancel_after(20)).await.unwrap_err();
        assert!(matches!(err, MarketplaceError::Cancelled));
        // the backend took the order, the guest never saw it
        assert_eq!(api.all_orders().await.unwrap().len(), 1);
        assert_eq!(cart.cart_item_count(), 2);
        assert!(matches!(lifecycle.state(), CheckoutState::Idle));
        assert_eq!(lifecycle.take_events(), vec![CheckoutEvent::Abandoned { phase: Phase::CreateOrder }]);
    }

    #[tokio::test]
    async fn test_verification_cancelled_in_flight_renders_nothing() {
        let (api, _, mut cart) = setup().await;
        let order = OrderLifecycle::new(Arc::new(api.clone())).create_vendor_order(&mut cart, &form(), &CancellationToken::new()).await.unwrap();
        let session = api.initialize_payment(order.id(), "guest@example.com").await.unwrap();
        api.complete_gateway_payment(&session.reference).await;

        let mut lifecycle = OrderLifecycle::new(Arc::new(SlowBackend { inner: api.clone(), delay: Duration::from_millis(500) }));
        let back = PaymentReturn { reference: Some(session.reference.clone()), trxref: None };
        let err = lifecycle.verify_vendor_payment(&back, &cancel_after(20)).await.unwrap_err();
        assert!(matches!(err, MarketplaceError::Cancelled));
        assert!(lifecycle.outcome().is_none());
        assert_eq!(lifecycle.take_events(), vec![CheckoutEvent::Abandoned { phase: Phase::VerifyPayment }]);
    }

    #[tokio::test]
    async fn test_success_outcome_uses_configured_currency() {
        let (api, _, mut cart) = setup().await;
        let mut lifecycle = OrderLifecycle::new(Arc::new(api.clone())).with_currency("GHS");
        let cancel = CancellationToken::new();
        let order = lifecycle.create_vendor_order(&mut cart, &form(), &cancel).await.unwrap();
        let session = lifecycle.initialize_vendor_payment(order.id(), "guest@example.com", &cancel).await.unwrap();
        api.complete_gateway_payment(&session.reference).await;
        let back = PaymentReturn { reference: Some(session.reference), trxref: None };
        lifecycle.verify_vendor_payment(&back, &cancel).await.unwrap();
        match lifecycle.outcome().unwrap() {
            PaymentOutcome::Success { amount, .. } => assert_eq!(amount, Money::new(dec!(2000), "GHS")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_email_is_rejected_before_network() {
        let (_api, mut lifecycle, mut cart) = setup().await;
        let order = lifecycle.create_vendor_order(&mut cart, &form(), &CancellationToken::new()).await.unwrap();
        let err = lifecycle.initialize_vendor_payment(order.id(), "not-an-email", &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, MarketplaceError::Validation(_)));
        assert!(matches!(lifecycle.state(), CheckoutState::OrderCreated { .. }));
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let (api, mut lifecycle, mut cart) = setup().await;
        let cancel = CancellationToken::new();
        assert_eq!(cart.cart_total().amount(), dec!(2000));

        let order = lifecycle.create_vendor_order(&mut cart, &form(), &cancel).await.unwrap();
        assert_eq!(order.order_number(), "1001");
        assert!(cart.is_empty());

        let session = lifecycle.initialize_vendor_payment(order.id(), "guest@example.com", &cancel).await.unwrap();
        assert!(session.authorization_url.ends_with(&session.reference));

        api.complete_gateway_payment(&session.reference).await;
        let back = PaymentReturn { reference: None, trxref: Some(session.reference.clone()) };
        let verified = lifecycle.verify_vendor_payment(&back, &cancel).await.unwrap();
        assert_eq!(verified.order_number(), "1001");
        assert_eq!(verified.payment_status(), PaymentStatus::Paid);

        match lifecycle.outcome().unwrap() {
            PaymentOutcome::Success { order_number, amount, .. } => {
                assert_eq!(order_number, "1001");
                assert_eq!(amount.amount(), dec!(2000));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(lifecycle.take_events().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_verify_route_is_reported_as_support_issue() {
        let (api, mut lifecycle, mut cart) = setup().await;
        let cancel = CancellationToken::new();
        let order = lifecycle.create_vendor_order(&mut cart, &form(), &cancel).await.unwrap();
        let session = lifecycle.initialize_vendor_payment(order.id(), "guest@example.com", &cancel).await.unwrap();
        api.remove_verify_route().await;
        let back = PaymentReturn { reference: Some(session.reference.clone()), trxref: None };
        let err = lifecycle.verify_vendor_payment(&back, &cancel).await.unwrap_err();
        assert!(matches!(err, MarketplaceError::EndpointMissing));
        match lifecycle.outcome().unwrap() {
            PaymentOutcome::Failure { message, actions } => {
                assert!(message.contains("contact support"));
                assert_eq!(actions.len(), 2);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(api.order(order.id()).await.unwrap().payment_status(), PaymentStatus::Pending);
    }
}
