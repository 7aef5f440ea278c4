use crate::domain::cart::Cart;
use crate::error::{CheckoutError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// A non-negative monetary amount in currency units.
///
/// Wraps `rust_decimal::Decimal` so that sums of cart prices stay exact.
/// No rounding is ever applied; formatting for display is the caller's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(CheckoutError::InvalidAmount(format!(
                "amount must not be negative, got {value}"
            )))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Number of significant digits after the decimal point.
    pub fn fraction_digits(&self) -> u32 {
        self.0.normalize().scale()
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = CheckoutError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Computes the charge for a validated cart: the exact sum of its line prices.
pub fn cart_total(cart: &Cart) -> Result<Amount> {
    cart.lines().iter().try_fold(Amount::ZERO, |total, line| {
        total
            .checked_add(line.price)
            .ok_or_else(|| CheckoutError::InvalidCart("cart total overflows".to_string()))
    })
}
