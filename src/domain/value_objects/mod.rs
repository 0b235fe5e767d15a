//! Value Objects for the marketplace

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_CURRENCY: &str = "NGN";

/// Money value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_string() } }
    pub fn ngn(amount: Decimal) -> Self { Self::new(amount, DEFAULT_CURRENCY) }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency { return Err(MoneyError::CurrencyMismatch); }
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }
    pub fn multiply(&self, qty: u32) -> Money { Money::new(self.amount * Decimal::from(qty), &self.currency) }
}

impl Default for Money { fn default() -> Self { Self::zero(DEFAULT_CURRENCY) } }

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.currency, self.amount.round_dp(2))
    }
}

#[derive(Debug, Clone)] pub enum MoneyError { CurrencyMismatch }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Currency mismatch") }
}

/// Order quantity limits a vendor places on a product.
///
/// `stock == 0` on an available product means the vendor does not track stock,
/// so only `max` applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityBounds { pub min: u32, pub max: u32, pub stock: u32 }

impl QuantityBounds {
    pub fn new(min: u32, max: u32, stock: u32) -> Self { Self { min: min.max(1), max: max.max(1), stock } }

    /// Upper limit once stock is taken into account.
    pub fn ceiling(&self) -> u32 {
        if self.stock == 0 { self.max } else { self.max.min(self.stock) }
    }

    /// Clamp to `[1, ceiling]`.
    pub fn clamp(&self, quantity: u32) -> u32 { quantity.clamp(1, self.ceiling().max(1)) }

    pub fn check(&self, quantity: u32) -> Result<(), QuantityError> {
        if quantity < self.min { return Err(QuantityError::BelowMinimum(self.min)); }
        if quantity > self.max { return Err(QuantityError::AboveMaximum(self.max)); }
        if self.stock > 0 && quantity > self.stock { return Err(QuantityError::ExceedsStock(self.stock)); }
        Ok(())
    }
}

impl Default for QuantityBounds { fn default() -> Self { Self::new(1, 10, 0) } }

#[derive(Debug, Clone, PartialEq, Eq)] pub enum QuantityError { BelowMinimum(u32), AboveMaximum(u32), ExceedsStock(u32) }
impl std::error::Error for QuantityError {}
impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BelowMinimum(n) => write!(f, "Minimum order quantity is {n}"),
            Self::AboveMaximum(n) => write!(f, "Maximum order quantity is {n}"),
            Self::ExceedsStock(n) => write!(f, "Only {n} left in stock"),
        }
    }
}
