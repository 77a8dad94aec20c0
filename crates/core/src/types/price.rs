//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are never negative. The table backend has no decimal type, so a
//! price is stored as its decimal string (`"19.99"`), which keeps the exact
//! value instead of routing it through a float.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
    /// The input is not a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
}

/// A non-negative price in the store's currency.
///
/// ## Examples
///
/// ```
/// use abc_retail_core::Price;
/// use rust_decimal::Decimal;
///
/// let unit = Price::new(Decimal::new(1999, 2)).unwrap();
/// assert_eq!(unit.checked_mul(3).unwrap().to_string(), "59.97");
///
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units, or `None` if it exceeds the decimal range.
    #[must_use]
    pub fn checked_mul(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }
}


impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl std::str::FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = s
            .trim()
            .parse::<Decimal>()
            .map_err(|e| PriceError::Invalid(format!("{s}: {e}")))?;
        Self::new(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_rejected() {
        let err = Price::new(Decimal::new(-5, 1)).unwrap_err();
        assert_eq!(err, PriceError::Negative(Decimal::new(-5, 1)));
    }

    #[test]
    fn test_zero_accepted() {
        assert_eq!(Price::new(Decimal::ZERO).unwrap(), Price::ZERO);
    }

    #[test]
    fn test_parse() {
        let price: Price = "12.50".parse().unwrap();
        assert_eq!(price.amount(), Decimal::new(1250, 2));
        assert!("abc".parse::<Price>().is_err());
        assert!("-3".parse::<Price>().is_err());
    }

    #[test]
    fn test_serialized_as_decimal_string() {
        let price: Price = "19.99".parse().unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "\"19.99\"");
        let back: Price = serde_json::from_str("\"19.99\"").unwrap();
        assert_eq!(back, price);
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        assert!(serde_json::from_str::<Price>("\"-1.00\"").is_err());
    }

    #[test]
    fn test_multiply_by_quantity() {
        let price: Price = "2.25".parse().unwrap();
        assert_eq!(price.checked_mul(4).unwrap().amount(), Decimal::new(900, 2));
    }

    #[test]
    fn test_multiply_overflow_is_none() {
        let price = Price::new(Decimal::MAX).unwrap();
        assert_eq!(price.checked_mul(2), None);
        assert_eq!(price.checked_mul(1), Some(price));
    }
}
