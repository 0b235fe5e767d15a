//! HTTP adapter for the marketplace backend

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use crate::api::envelope::{BookingsPayload, Envelope, OrderPayload, OrdersPayload, PaymentPayload, ProductPayload};
use crate::api::VendorApi;
use crate::config::ApiConfig;
use crate::domain::aggregates::{Booking, NewVendorOrder, OrderStatus, PaymentSession, Product, VendorOrder};
use crate::error::{MarketplaceError, Result};

#[derive(Debug, Clone)]
pub struct HttpVendorApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpVendorApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, base_url: config.base_url.trim_end_matches('/').to_string(), token: config.token.clone() })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    fn url(&self, path: &str) -> String { format!("{}/{}", self.base_url, path.trim_start_matches('/')) }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, path: &str) -> Result<Envelope<T>> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        tracing::debug!(path, status = status.as_u16(), "backend response");

        if status == StatusCode::NOT_FOUND {
            let message = serde_json::from_str::<Envelope<serde_json::Value>>(&text).ok().and_then(|e| e.message);
            return Err(MarketplaceError::NotFound(message.unwrap_or_else(|| path.to_string())));
        }

        match serde_json::from_str::<Envelope<T>>(&text) {
            Ok(mut envelope) => {
                // An error status never counts as success, whatever the body says.
                if !status.is_success() { envelope.success = Some(false); }
                Ok(envelope)
            }
            Err(e) if status.is_success() => Err(MarketplaceError::Serialization(e)),
            Err(_) => Err(MarketplaceError::Unexpected(format!("{path} returned {status}"))),
        }
    }
}

#[async_trait]
impl VendorApi for HttpVendorApi {
    async fn fetch_product(&self, product_id: &str) -> Result<Product> {
        let path = format!("/vendor-products/{product_id}");
        self.send::<ProductPayload>(self.client.get(self.url(&path)), &path).await?.into_result()?.require()
    }

    async fn create_order(&self, order: &NewVendorOrder) -> Result<VendorOrder> {
        let path = "/vendor-orders";
        self.send::<OrderPayload>(self.client.post(self.url(path)).json(order), path).await?.into_result()?.require()
    }

    async fn initialize_payment(&self, order_id: &str, email: &str) -> Result<PaymentSession> {
        let path = format!("/vendor-orders/{order_id}/payment/initialize");
        let body = serde_json::json!({ "email": email });
        self.send::<PaymentPayload>(self.client.post(self.url(&path)).json(&body), &path).await?.into_result()?.require()
    }

    async fn verify_payment(&self, reference: &str) -> Result<VendorOrder> {
        let path = "/vendor-orders/payment/verify";
        let request = self.client.get(self.url(path)).query(&[("reference", reference)]);
        match self.send::<OrderPayload>(request, path).await {
            Err(MarketplaceError::NotFound(_)) => Err(MarketplaceError::EndpointMissing),
            other => other?.into_result()?.require(),
        }
    }

    async fn my_orders(&self) -> Result<Vec<VendorOrder>> {
        let path = "/vendor-orders/mine";
        Ok(self.send::<OrdersPayload>(self.client.get(self.url(path)), path).await?.into_listing()?.orders)
    }

    async fn all_orders(&self) -> Result<Vec<VendorOrder>> {
        let path = "/vendor-orders";
        Ok(self.send::<OrdersPayload>(self.client.get(self.url(path)), path).await?.into_listing()?.orders)
    }

    async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Result<VendorOrder> {
        let path = format!("/vendor-orders/{order_id}/status");
        let body = serde_json::json!({ "status": status });
        self.send::<OrderPayload>(self.client.patch(self.url(&path)).json(&body), &path).await?.into_result()?.require()
    }

    async fn bookings(&self) -> Result<Vec<Booking>> {
        let path = "/bookings";
        Ok(self.send::<BookingsPayload>(self.client.get(self.url(path)), path).await?.into_listing()?.bookings)
    }
}
