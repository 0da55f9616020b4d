//! Money amounts for quotes, final prices, and deposits.
//!
//! The studio quotes in a single currency, so an amount is a non-negative
//! decimal with two places (`NUMERIC(10, 2)` in the database).

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("must be greater than or equal to 0")]
    Negative,
    /// The amount does not fit in `NUMERIC(10, 2)`.
    #[error("must be less than {max}")]
    TooLarge {
        /// Exclusive upper bound.
        max: Decimal,
    },
}

/// A non-negative amount in the studio's currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Upper bound (exclusive) imposed by `NUMERIC(10, 2)`.
    #[must_use]
    pub fn max() -> Decimal {
        Decimal::new(100_000_000, 0)
    }

    /// Create a price, rounding to cents.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for amounts below zero and
    /// [`PriceError::TooLarge`] for amounts that overflow the column.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount >= Self::max() {
            return Err(PriceError::TooLarge { max: Self::max() });
        }
        Ok(Self(amount.round_dp(2)))
    }

    /// Create a price from a whole number of cents.
    ///
    /// # Errors
    ///
    /// See [`Price::new`].
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative() {
        assert_eq!(Price::new(Decimal::new(-1, 2)), Err(PriceError::Negative));
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_rejects_overflow() {
        assert!(matches!(
            Price::new(Decimal::new(100_000_000, 0)),
            Err(PriceError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_display_two_places() {
        let price = Price::from_cents(125_050).unwrap();
        assert_eq!(price.to_string(), "$1250.50");
    }

    #[test]
    fn test_deserialize_from_string_amount() {
        let price: Price = serde_json::from_str("\"450.00\"").unwrap();
        assert_eq!(price.amount(), Decimal::new(45_000, 2));
        assert!(serde_json::from_str::<Price>("\"-5\"").is_err());
    }
}
