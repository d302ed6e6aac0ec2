//! Domain entities mirrored from persistent storage.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::error::DomainError;

/// Largest price the store accepts, in cents (`99,999,999.99`).
pub const MAX_PRICE_CENTS: i64 = 9_999_999_999;

/// A product row. The store assigns `id` and both timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Price,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A non-negative amount held in integer cents. Deserialization goes through
/// [`Price::from_cents`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Price(i64);

impl Price {
    pub const ZERO: Price = Price(0);

    pub fn from_cents(cents: i64) -> Result<Self, DomainError> {
        if cents < 0 {
            return Err(DomainError::validation("price must not be negative"));
        }
        if cents > MAX_PRICE_CENTS {
            return Err(DomainError::validation("price exceeds 99999999.99"));
        }
        Ok(Self(cents))
    }

    /// Convert a decimal amount, rounding to the nearest cent. A positive
    /// amount that rounds to zero is rejected rather than read as free.
    pub fn from_decimal(amount: f64) -> Result<Self, DomainError> {
        if !amount.is_finite() {
            return Err(DomainError::validation("price must be a finite number"));
        }
        if amount < 0.0 {
            return Err(DomainError::validation("price must not be negative"));
        }
        let cents = (amount * 100.0).round();
        if cents > MAX_PRICE_CENTS as f64 {
            return Err(DomainError::validation("price exceeds 99999999.99"));
        }
        if amount > 0.0 && cents == 0.0 {
            return Err(DomainError::validation("price must be zero or at least 0.01"));
        }
        Self::from_cents(cents as i64)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn as_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<i64> for Price {
    type Error = DomainError;

    fn try_from(cents: i64) -> Result<Self, Self::Error> {
        Self::from_cents(cents)
    }
}

impl From<Price> for i64 {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}
