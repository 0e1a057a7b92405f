//! Type-safe price representation using decimal arithmetic.
//!
//! The store sells in Saudi riyal only, so a price is a bare amount; the
//! currency is implied and only shows up when formatting for display.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency suffix used on every rendered price.
pub const CURRENCY_SUFFIX: &str = "ر.س";

/// Errors that can occur when parsing a [`Price`] from user input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input string is empty.
    #[error("price cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("price must be a number: {0}")]
    Invalid(String),
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
}

/// A price in Saudi riyal.
///
/// Serializes as the bare decimal amount, so it reads back whatever the
/// database or a stored cart snapshot holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Parse a price typed into a form field.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, not a number, or negative.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PriceError::Empty);
        }

        let amount = Decimal::from_str(s).map_err(|e| PriceError::Invalid(e.to_string()))?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }

        Ok(Self(amount))
    }

    /// The raw decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The amount without trailing zeros, e.g. `150` rather than `150.00`.
    #[must_use]
    pub fn plain(&self) -> String {
        self.0.normalize().to_string()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {CURRENCY_SUFFIX}", self.0.normalize())
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self::Output {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_drops_trailing_zeros() {
        let price = Price::parse("150.00").unwrap();
        assert_eq!(price.to_string(), "150 ر.س");
        assert_eq!(price.plain(), "150");
    }

    #[test]
    fn test_line_total() {
        let price = Price::parse("49.5").unwrap();
        assert_eq!((price * 3).plain(), "148.5");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(Price::parse("  "), Err(PriceError::Empty));
        assert!(matches!(Price::parse("abc"), Err(PriceError::Invalid(_))));
        assert_eq!(Price::parse("-5"), Err(PriceError::Negative));
    }

    #[test]
    fn test_deserializes_from_json_number() {
        let price: Price = serde_json::from_str("89.9").unwrap();
        assert_eq!(price.plain(), "89.9");
    }

    #[test]
    fn test_sum() {
        let total: Price = ["10", "20.5"]
            .iter()
            .map(|s| Price::parse(s).unwrap())
            .sum();
        assert_eq!(total.plain(), "30.5");
    }
}
