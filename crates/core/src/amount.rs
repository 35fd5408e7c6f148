//! Amount - Non-negative 256-bit integer for token quantities
//!
//! Underlying balances, claim-token balances, borrows and reserves are all
//! `Amount`s. Every operation is checked and returns `MathError` instead of
//! wrapping.

use ethnum::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MathError;

/// A non-negative integer quantity of some token.
///
/// # Example
/// ```
/// use ironbank_core::Amount;
///
/// let a = Amount::new(100);
/// let b = Amount::new(30);
/// assert_eq!(a.checked_sub(b).unwrap(), Amount::new(70));
/// assert!(b.checked_sub(a).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(U256);

impl Amount {
    /// Zero amount constant
    pub const ZERO: Self = Self(U256::ZERO);

    /// Largest representable amount. Used as the "repay everything" sentinel.
    pub const MAX: Self = Self(U256::MAX);

    /// Create an amount from a primitive integer
    #[inline]
    pub const fn new(value: u128) -> Self {
        Self(U256::new(value))
    }

    /// Wrap a raw 256-bit value
    #[inline]
    pub const fn from_raw(value: U256) -> Self {
        Self(value)
    }

    /// Get the raw 256-bit value
    #[inline]
    pub const fn raw(&self) -> U256 {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == U256::ZERO
    }

    pub fn checked_add(self, other: Amount) -> Result<Amount, MathError> {
        self.0
            .checked_add(other.0)
            .map(Amount)
            .ok_or(MathError::Overflow)
    }

    pub fn checked_sub(self, other: Amount) -> Result<Amount, MathError> {
        self.0
            .checked_sub(other.0)
            .map(Amount)
            .ok_or(MathError::Underflow)
    }

    pub fn checked_mul(self, other: Amount) -> Result<Amount, MathError> {
        self.0
            .checked_mul(other.0)
            .map(Amount)
            .ok_or(MathError::Overflow)
    }

    /// Integer division, truncating toward zero
    pub fn checked_div(self, other: Amount) -> Result<Amount, MathError> {
        if other.is_zero() {
            return Err(MathError::DivisionByZero);
        }
        Ok(Amount(self.0 / other.0))
    }

    /// `self + a - b`, failing if either step leaves the valid range
    pub fn add_then_sub(self, a: Amount, b: Amount) -> Result<Amount, MathError> {
        self.checked_add(a)?.checked_sub(b)
    }

    /// Subtraction clamped at zero, for reporting shortfall/liquidity pairs
    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.checked_sub(other.0).unwrap_or(U256::ZERO))
    }

    /// Narrow to `u128` when the value fits
    pub fn to_u128(&self) -> Option<u128> {
        if self.0 > U256::new(u128::MAX) {
            None
        } else {
            Some(self.0.as_u128())
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        U256::from_str_radix(s.trim(), 10).map(Amount)
    }
}

impl TryFrom<String> for Amount {
    type Error = std::num::ParseIntError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.to_string()
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Amount::new(value)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount::new(value as u128)
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}
