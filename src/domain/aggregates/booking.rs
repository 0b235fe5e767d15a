//! Property bookings, as listed on the admin pages.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use crate::domain::aggregates::order::PaymentStatus;
use crate::domain::aggregates::product::Reference;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub booking_reference: Option<String>,
    pub property: Reference,
    #[serde(default, alias = "user")]
    pub guest: Option<Reference>,
    #[serde(alias = "totalPrice")]
    pub total_amount: Decimal,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(deserialize_with = "calendar_date")]
    pub check_in: NaiveDate,
    #[serde(deserialize_with = "calendar_date")]
    pub check_out: NaiveDate,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus { #[default] Pending, Confirmed, CheckedIn, CheckedOut, Cancelled }

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [Self::Pending, Self::Confirmed, Self::CheckedIn, Self::CheckedOut, Self::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending", Self::Confirmed => "confirmed", Self::CheckedIn => "checked_in",
            Self::CheckedOut => "checked_out", Self::Cancelled => "cancelled",
        }
    }
}

impl Booking {
    pub fn nights(&self) -> i64 { (self.check_out - self.check_in).num_days().max(0) }
    pub fn is_paid(&self) -> bool { self.payment_status == PaymentStatus::Paid }
}

/// Accepts `2026-10-01` as well as a full RFC 3339 timestamp.
fn calendar_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    if let Ok(date) = NaiveDate::parse_from_str(&raw, "%Y-%m-%d") { return Ok(date); }
    DateTime::parse_from_rfc3339(&raw).map(|dt| dt.with_timezone(&Utc).date_naive()).map_err(serde::de::Error::custom)
}
