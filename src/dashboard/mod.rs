//! Admin dashboard aggregates.
//!
//! Every function here is a pure reduction over lists already fetched from the
//! backend. Nothing is cached and nothing is written back.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use crate::domain::aggregates::{Booking, BookingStatus, OrderStatus, PaymentStatus, VendorOrder};

pub const RECENT_LIMIT: usize = 5;
pub const TOP_VENDOR_LIMIT: usize = 5;
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

/// Sum of totals over paid vendor orders.
pub fn order_revenue(orders: &[VendorOrder]) -> Decimal {
    orders.iter().filter(|o| o.is_paid()).map(VendorOrder::total_amount).sum()
}

/// Sum of totals over vendor orders still awaiting payment, cancelled ones excluded.
pub fn pending_order_amount(orders: &[VendorOrder]) -> Decimal {
    orders.iter()
        .filter(|o| o.payment_status() == PaymentStatus::Pending && o.status() != OrderStatus::Cancelled)
        .map(VendorOrder::total_amount)
        .sum()
}

pub fn booking_revenue(bookings: &[Booking]) -> Decimal {
    bookings.iter().filter(|b| b.is_paid()).map(|b| b.total_amount).sum()
}

/// Every status appears in the result, with zero when unused.
pub fn order_status_counts(orders: &[VendorOrder]) -> BTreeMap<&'static str, usize> {
    let mut counts: BTreeMap<_, _> = OrderStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    for order in orders { *counts.entry(order.status().as_str()).or_default() += 1; }
    counts
}

pub fn payment_status_counts(orders: &[VendorOrder]) -> BTreeMap<&'static str, usize> {
    let mut counts: BTreeMap<_, _> = PaymentStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    for order in orders { *counts.entry(order.payment_status().as_str()).or_default() += 1; }
    counts
}

pub fn booking_status_counts(bookings: &[Booking]) -> BTreeMap<&'static str, usize> {
    let mut counts: BTreeMap<_, _> = BookingStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    for booking in bookings { *counts.entry(booking.status.as_str()).or_default() += 1; }
    counts
}

/// Live bookings checking in within `[today, today + days)`.
pub fn upcoming_check_ins(bookings: &[Booking], today: NaiveDate, days: i64) -> usize {
    let end = today + Duration::days(days);
    bookings.iter()
        .filter(|b| matches!(b.status, BookingStatus::Pending | BookingStatus::Confirmed))
        .filter(|b| b.check_in >= today && b.check_in < end)
        .count()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorRevenue {
    pub vendor_id: String,
    pub vendor_name: String,
    pub revenue: Decimal,
    pub orders: usize,
}

/// Vendors ranked by paid revenue, highest first; ties keep first-seen order.
pub fn top_vendors(orders: &[VendorOrder], limit: usize) -> Vec<VendorRevenue> {
    let mut ranked: Vec<VendorRevenue> = Vec::new();
    for order in orders.iter().filter(|o| o.is_paid()) {
        let vendor = order.vendor();
        match ranked.iter_mut().find(|v| v.vendor_id == vendor.id()) {
            Some(entry) => { entry.revenue += order.total_amount(); entry.orders += 1; }
            None => ranked.push(VendorRevenue {
                vendor_id: vendor.id().to_string(), vendor_name: vendor.display_name().to_string(),
                revenue: order.total_amount(), orders: 1,
            }),
        }
    }
    ranked.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    ranked.truncate(limit);
    ranked
}

/// "just now", "5 minutes ago", "2 hours ago", "3 days ago", then the calendar date.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    let plural = |n: i64, unit: &str| if n == 1 { format!("1 {unit} ago") } else { format!("{n} {unit}s ago") };
    if elapsed < Duration::minutes(1) { return "just now".to_string(); }
    if elapsed < Duration::hours(1) { return plural(elapsed.num_minutes(), "minute"); }
    if elapsed < Duration::days(1) { return plural(elapsed.num_hours(), "hour"); }
    if elapsed < Duration::days(7) { return plural(elapsed.num_days(), "day"); }
    then.format("%b %-d, %Y").to_string()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    pub order_id: String,
    pub order_number: String,
    pub vendor: String,
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub placed: Option<String>,
}

/// Newest first; orders without a timestamp sort last.
pub fn recent_orders(orders: &[VendorOrder], limit: usize, now: DateTime<Utc>) -> Vec<RecentOrder> {
    let mut sorted: Vec<&VendorOrder> = orders.iter().collect();
    sorted.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    sorted.into_iter().take(limit).map(|o| RecentOrder {
        order_id: o.id().to_string(),
        order_number: o.order_number().to_string(),
        vendor: o.vendor().display_name().to_string(),
        total: o.total_amount(),
        status: o.status(),
        payment_status: o.payment_status(),
        placed: o.created_at().map(|t| time_ago(t, now)),
    }).collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_revenue: Decimal,
    pub booking_revenue: Decimal,
    pub vendor_order_revenue: Decimal,
    pub pending_vendor_order_amount: Decimal,
    pub total_bookings: usize,
    pub total_vendor_orders: usize,
    pub upcoming_check_ins: usize,
    pub booking_statuses: BTreeMap<&'static str, usize>,
    pub order_statuses: BTreeMap<&'static str, usize>,
    pub payment_statuses: BTreeMap<&'static str, usize>,
    pub top_vendors: Vec<VendorRevenue>,
    pub recent_orders: Vec<RecentOrder>,
}

impl DashboardSummary {
    pub fn build(orders: &[VendorOrder], bookings: &[Booking], now: DateTime<Utc>) -> Self {
        let booking_revenue = booking_revenue(bookings);
        let vendor_order_revenue = order_revenue(orders);
        Self {
            total_revenue: booking_revenue + vendor_order_revenue,
            booking_revenue,
            vendor_order_revenue,
            pending_vendor_order_amount: pending_order_amount(orders),
            total_bookings: bookings.len(),
            total_vendor_orders: orders.len(),
            upcoming_check_ins: upcoming_check_ins(bookings, now.date_naive(), UPCOMING_WINDOW_DAYS),
            booking_statuses: booking_status_counts(bookings),
            order_statuses: order_status_counts(orders),
            payment_statuses: payment_status_counts(orders),
            top_vendors: top_vendors(orders, TOP_VENDOR_LIMIT),
            recent_orders: recent_orders(orders, RECENT_LIMIT, now),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind { Booking, VendorOrder }

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub kind: TransactionKind,
    pub id: String,
    pub reference: String,
    pub description: String,
    pub amount: Decimal,
    pub payment_status: PaymentStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub when: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub total_revenue: Decimal,
    pub pending_amount: Decimal,
    pub refunded_amount: Decimal,
    pub failed_count: usize,
    pub payment_statuses: BTreeMap<&'static str, usize>,
    pub transactions: Vec<Transaction>,
}

impl TransactionSummary {
    /// Bookings and vendor orders merged into one ledger, newest first.
    pub fn build(orders: &[VendorOrder], bookings: &[Booking], now: DateTime<Utc>) -> Self {
        let mut transactions: Vec<Transaction> = bookings.iter().map(|b| Transaction {
            kind: TransactionKind::Booking,
            id: b.id.clone(),
            reference: b.booking_reference.clone().unwrap_or_else(|| b.id.clone()),
            description: b.property.display_name().to_string(),
            amount: b.total_amount,
            payment_status: b.payment_status,
            created_at: b.created_at,
            when: b.created_at.map(|t| time_ago(t, now)),
        }).chain(orders.iter().map(|o| Transaction {
            kind: TransactionKind::VendorOrder,
            id: o.id().to_string(),
            reference: o.payment_reference().unwrap_or(o.order_number()).to_string(),
            description: o.vendor().display_name().to_string(),
            amount: o.total_amount(),
            payment_status: o.payment_status(),
            created_at: o.created_at(),
            when: o.created_at().map(|t| time_ago(t, now)),
        })).collect();
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let sum_where = |status: PaymentStatus| -> Decimal {
            transactions.iter().filter(|t| t.payment_status == status).map(|t| t.amount).sum()
        };
        let mut payment_statuses: BTreeMap<_, _> = PaymentStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        for t in &transactions { *payment_statuses.entry(t.payment_status.as_str()).or_default() += 1; }

        Self {
            total_revenue: sum_where(PaymentStatus::Paid),
            pending_amount: sum_where(PaymentStatus::Pending),
            refunded_amount: sum_where(PaymentStatus::Refunded),
            failed_count: transactions.iter().filter(|t| t.payment_status == PaymentStatus::Failed).count(),
            payment_statuses,
            transactions,
        }
    }
}
