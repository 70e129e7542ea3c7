//! Decimal money amounts.
//!
//! Amounts are kept in the currency's standard unit (rupees, not paise) and
//! always rounded to two decimal places for display.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// ISO 4217 currency codes accepted from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }
}

/// An amount of money in a single currency.
///
/// Arithmetic keeps the left-hand currency; the backend never mixes
/// currencies within one cart or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    #[serde(default)]
    pub currency: CurrencyCode,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: Decimal, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    /// Create an INR amount.
    #[must_use]
    pub const fn inr(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::INR)
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Format for display (e.g., "₹1299.00").
    #[must_use]
    pub fn display(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:.2}", self.currency.symbol(), self.amount.round_dp(2))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.amount + rhs.amount, self.currency)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self::new(self.amount * Decimal::from(rhs), self.currency)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        let mut iter = iter.peekable();
        let currency = iter.peek().map_or_else(CurrencyCode::default, |m| m.currency);
        iter.fold(Self::zero(currency), |acc, m| acc + m)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_decimals() {
        let price = Money::inr(Decimal::new(1299, 0));
        assert_eq!(price.to_string(), "₹1299.00");
        let price = Money::new(Decimal::new(19_995, 3), CurrencyCode::USD);
        assert_eq!(price.to_string(), "$20.00");
    }

    #[test]
    fn test_multiply_and_sum() {
        let unit = Money::inr(Decimal::new(2550, 2));
        let total: Money = [unit * 2, unit].into_iter().sum();
        assert_eq!(total.amount, Decimal::new(7650, 2));
    }

    #[test]
    fn test_sum_of_nothing_is_zero() {
        let total: Money = std::iter::empty().sum();
        assert!(total.is_zero());
        assert_eq!(total.currency, CurrencyCode::INR);
    }

    #[test]
    fn test_deserialize_string_amount() {
        let money: Money = serde_json::from_str(r#"{"amount":"499.50"}"#).unwrap();
        assert_eq!(money.amount, Decimal::new(49950, 2));
        assert_eq!(money.currency, CurrencyCode::INR);
    }
}
