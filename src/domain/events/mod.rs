//! Checkout lifecycle events
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckoutEvent {
    OrderCreated { order_id: String, order_number: String, total: Decimal },
    PaymentInitialized { order_id: String, reference: String },
    PaymentVerified { order_id: String, reference: String },
    VerificationFailed { reference: Option<String>, cause: FailureCause, message: String },
    Abandoned { phase: Phase },
}

/// Which network phase of the checkout an event or failure belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase { CreateOrder, InitializePayment, VerifyPayment }

impl Phase {
    /// Shown when the failure carries no usable message of its own.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::CreateOrder => "Failed to create order",
            Self::InitializePayment => "Failed to initialize payment",
            Self::VerifyPayment => "Payment verification failed",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause { Validation, MissingReference, Backend, EndpointMissing, Unexpected, Cancelled }

impl FailureCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation", Self::MissingReference => "missing_reference", Self::Backend => "backend",
            Self::EndpointMissing => "endpoint_missing", Self::Unexpected => "unexpected", Self::Cancelled => "cancelled",
        }
    }
}
