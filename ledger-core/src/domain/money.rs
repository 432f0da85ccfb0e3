//! Money value type

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};

/// An amount in a single currency
///
/// Immutable value: every operation returns a new `Money`. Arithmetic across
/// differing currency codes fails with `CurrencyMismatch`. The amount itself
/// may be negative - non-negativity is a constraint of the account that
/// holds the balance, not of the value type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    /// ISO 4217 currency code, normalized to uppercase
    pub currency: String,
}

impl Money {
    /// Create a new amount, normalizing the currency code
    pub fn new(amount: Decimal, currency: &str) -> Self {
        Self {
            amount,
            currency: currency.trim().to_uppercase(),
        }
    }

    /// Zero in the given currency
    pub fn zero(currency: &str) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    pub fn is_zero(&self) -> bool {
        self.amount == Decimal::ZERO
    }

    /// Add two amounts of the same currency
    pub fn add(&self, other: &Money) -> Result<Money> {
        self.require_same_currency(other)?;
        Ok(Money {
            amount: self.amount + other.amount,
            currency: self.currency.clone(),
        })
    }

    /// Subtract an amount of the same currency
    ///
    /// The result may be negative; callers that need sufficiency must check
    /// `is_less_than` first.
    pub fn subtract(&self, other: &Money) -> Result<Money> {
        self.require_same_currency(other)?;
        Ok(Money {
            amount: self.amount - other.amount,
            currency: self.currency.clone(),
        })
    }

    /// Compare two amounts of the same currency
    pub fn is_less_than(&self, other: &Money) -> Result<bool> {
        self.require_same_currency(other)?;
        Ok(self.amount < other.amount)
    }

    fn require_same_currency(&self, other: &Money) -> Result<()> {
        if self.currency != other.currency {
            return Err(Error::CurrencyMismatch(
                self.currency.clone(),
                other.currency.clone(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}
