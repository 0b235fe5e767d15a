use axum::{extract::{Path, Query, State}, Json};
use chrono::Utc;
use serde::Deserialize;
use crate::dashboard::{DashboardSummary, TransactionSummary};
use crate::domain::aggregates::{OrderStatus, PaymentStatus};
use crate::web::checkout::{OrderView, OrdersView};
use crate::web::{ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter { pub status: Option<OrderStatus>, pub payment_status: Option<PaymentStatus>, pub vendor: Option<String> }

#[derive(Debug, Deserialize)]
pub struct StatusUpdate { pub status: OrderStatus }

pub async fn dashboard(State(s): State<AppState>) -> ApiResult<Json<DashboardSummary>> {
    let (orders, bookings) = tokio::try_join!(s.api.all_orders(), s.api.bookings())?;
    Ok(Json(DashboardSummary::build(&orders, &bookings, Utc::now())))
}

pub async fn transactions(State(s): State<AppState>) -> ApiResult<Json<TransactionSummary>> {
    let (orders, bookings) = tokio::try_join!(s.api.all_orders(), s.api.bookings())?;
    Ok(Json(TransactionSummary::build(&orders, &bookings, Utc::now())))
}

/// Filters are applied to the fetched list, not sent to the backend.
pub async fn vendor_orders(State(s): State<AppState>, Query(f): Query<OrderFilter>) -> ApiResult<Json<OrdersView>> {
    let orders = s.api.all_orders().await?.into_iter()
        .filter(|o| f.status.map_or(true, |st| o.status() == st))
        .filter(|o| f.payment_status.map_or(true, |ps| o.payment_status() == ps))
        .filter(|o| f.vendor.as_deref().map_or(true, |v| o.vendor().id() == v))
        .collect();
    Ok(Json(OrdersView { orders }))
}

pub async fn update_status(State(s): State<AppState>, Path(order_id): Path<String>, Json(r): Json<StatusUpdate>) -> ApiResult<Json<OrderView>> {
    let order = s.api.update_order_status(&order_id, r.status).await?;
    tracing::info!(%order_id, status = r.status.as_str(), "vendor order status updated");
    Ok(Json(OrderView { success: true, order }))
}
