//! Error types shared by the API client, the checkout controller and the web layer.

use thiserror::Error;
use crate::domain::events::FailureCause;

pub const ENDPOINT_MISSING_MESSAGE: &str =
    "Payment verification endpoint not found. Please contact support to confirm your payment.";

#[derive(Error, Debug)]
pub enum MarketplaceError {
    /// Rejected locally before any network call
    #[error("{0}")]
    Validation(String),

    #[error("No payment reference was provided")]
    MissingReference,

    /// The backend answered without success; carries its message
    #[error("{0}")]
    Backend(String),

    /// The backend declined without saying why
    #[error("{}", crate::api::envelope::DEFAULT_FAILURE_MESSAGE)]
    Rejected,

    #[error("{}", ENDPOINT_MISSING_MESSAGE)]
    EndpointMissing,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl MarketplaceError {
    pub fn cause(&self) -> FailureCause {
        match self {
            Self::Validation(_) => FailureCause::Validation,
            Self::MissingReference => FailureCause::MissingReference,
            Self::Backend(_) | Self::Rejected | Self::NotFound(_) => FailureCause::Backend,
            Self::EndpointMissing => FailureCause::EndpointMissing,
            Self::Cancelled => FailureCause::Cancelled,
            Self::Http(_) | Self::InvalidResponse(_) | Self::Serialization(_) | Self::Unexpected(_) => FailureCause::Unexpected,
        }
    }

    /// Text safe to show a guest. Transport and decoding details stay in the logs,
    /// and a rejection without a message shows the caller's `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match (self, self.cause()) {
            (Self::Rejected, _) | (_, FailureCause::Unexpected) => fallback.to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<crate::domain::aggregates::OrderError> for MarketplaceError {
    fn from(e: crate::domain::aggregates::OrderError) -> Self { Self::Validation(e.to_string()) }
}

impl From<crate::domain::aggregates::ProductError> for MarketplaceError {
    fn from(e: crate::domain::aggregates::ProductError) -> Self { Self::Validation(e.to_string()) }
}

impl From<validator::ValidationErrors> for MarketplaceError {
    fn from(e: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = e.field_errors().into_iter().flat_map(|(field, errors)| {
            errors.iter().map(move |err| match &err.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid"),
            })
        }).collect();
        messages.sort();
        Self::Validation(messages.join(", "))
    }
}

pub type Result<T> = std::result::Result<T, MarketplaceError>;
