//! Exp - Fixed-point fraction scaled by 1e18
//!
//! `Exp { mantissa: 5e17 }` is 0.5. Exchange rates, collateral factors, prices,
//! borrow indices and interest factors are all `Exp`s. Multiplication and
//! division truncate toward zero and fail instead of wrapping.

use ethnum::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::amount::Amount;
use crate::error::MathError;

/// Number of decimal places carried by a mantissa
pub const EXP_DECIMALS: u32 = 18;

/// 1e18, the mantissa of 1.0
pub const EXP_SCALE: U256 = U256::new(1_000_000_000_000_000_000);

fn pow10(exponent: u32) -> Result<U256, MathError> {
    let mut value = U256::ONE;
    for _ in 0..exponent {
        value = value.checked_mul(U256::new(10)).ok_or(MathError::Overflow)?;
    }
    Ok(value)
}

/// A scaled fixed-point value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Exp {
    mantissa: U256,
}

impl Exp {
    pub const ZERO: Self = Self { mantissa: U256::ZERO };
    pub const ONE: Self = Self { mantissa: EXP_SCALE };

    /// Wrap a raw mantissa (already scaled by 1e18)
    pub const fn from_mantissa(mantissa: U256) -> Self {
        Self { mantissa }
    }

    /// Wrap a raw mantissa given as a primitive
    pub const fn from_mantissa_u128(mantissa: u128) -> Self {
        Self {
            mantissa: U256::new(mantissa),
        }
    }

    pub const fn mantissa(&self) -> U256 {
        self.mantissa
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa == U256::ZERO
    }

    /// Integer value as an Exp (`n * 1e18`)
    pub fn from_integer(value: Amount) -> Result<Self, MathError> {
        let mantissa = value
            .raw()
            .checked_mul(EXP_SCALE)
            .ok_or(MathError::Overflow)?;
        Ok(Self { mantissa })
    }

    /// `num / denom` as an Exp
    pub fn from_ratio(num: Amount, denom: Amount) -> Result<Self, MathError> {
        if denom.is_zero() {
            return Err(MathError::DivisionByZero);
        }
        let scaled = num.raw().checked_mul(EXP_SCALE).ok_or(MathError::Overflow)?;
        Ok(Self {
            mantissa: scaled / denom.raw(),
        })
    }

    /// Convert a non-negative decimal such as `0.75` into a mantissa.
    ///
    /// Digits beyond 18 decimal places are rejected rather than rounded.
    pub fn from_decimal(value: Decimal) -> Result<Self, MathError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(MathError::InvalidDecimal);
        }
        let digits = U256::new(value.mantissa().unsigned_abs());
        let scale = value.scale();
        let mantissa = if scale <= EXP_DECIMALS {
            digits
                .checked_mul(pow10(EXP_DECIMALS - scale)?)
                .ok_or(MathError::Overflow)?
        } else {
            let divisor = pow10(scale - EXP_DECIMALS)?;
            if digits % divisor != U256::ZERO {
                return Err(MathError::InvalidDecimal);
            }
            digits / divisor
        };
        Ok(Self { mantissa })
    }

    /// Render as a decimal, if the mantissa fits in 96 bits
    pub fn to_decimal(&self) -> Option<Decimal> {
        if self.mantissa > U256::new(i128::MAX as u128) {
            return None;
        }
        Decimal::try_from_i128_with_scale(self.mantissa.as_u128() as i128, EXP_DECIMALS)
            .ok()
            .map(|d| d.normalize())
    }

    pub fn checked_add(self, other: Exp) -> Result<Exp, MathError> {
        self.mantissa
            .checked_add(other.mantissa)
            .map(Exp::from_mantissa)
            .ok_or(MathError::Overflow)
    }

    pub fn checked_sub(self, other: Exp) -> Result<Exp, MathError> {
        self.mantissa
            .checked_sub(other.mantissa)
            .map(Exp::from_mantissa)
            .ok_or(MathError::Underflow)
    }

    /// `self * other`, truncated to 18 decimals
    pub fn mul_exp(self, other: Exp) -> Result<Exp, MathError> {
        let product = self
            .mantissa
            .checked_mul(other.mantissa)
            .ok_or(MathError::Overflow)?;
        Ok(Exp::from_mantissa(product / EXP_SCALE))
    }

    /// `self / other`, truncated to 18 decimals
    pub fn div_exp(self, other: Exp) -> Result<Exp, MathError> {
        if other.is_zero() {
            return Err(MathError::DivisionByZero);
        }
        let scaled = self
            .mantissa
            .checked_mul(EXP_SCALE)
            .ok_or(MathError::Overflow)?;
        Ok(Exp::from_mantissa(scaled / other.mantissa))
    }

    /// `self * scalar`, keeping full precision
    pub fn mul_scalar(self, scalar: Amount) -> Result<Exp, MathError> {
        self.mantissa
            .checked_mul(scalar.raw())
            .map(Exp::from_mantissa)
            .ok_or(MathError::Overflow)
    }

    /// `self / scalar`
    pub fn div_scalar(self, scalar: Amount) -> Result<Exp, MathError> {
        if scalar.is_zero() {
            return Err(MathError::DivisionByZero);
        }
        Ok(Exp::from_mantissa(self.mantissa / scalar.raw()))
    }

    /// `truncate(self * scalar)`
    pub fn mul_scalar_truncate(self, scalar: Amount) -> Result<Amount, MathError> {
        Ok(self.mul_scalar(scalar)?.truncate())
    }

    /// `truncate(self * scalar) + addend`
    pub fn mul_scalar_truncate_add(self, scalar: Amount, addend: Amount) -> Result<Amount, MathError> {
        self.mul_scalar_truncate(scalar)?.checked_add(addend)
    }

    /// Integer part, dropping the fraction
    pub fn truncate(self) -> Amount {
        Amount::from_raw(self.mantissa / EXP_SCALE)
    }
}

/// `truncate(scalar / divisor)`, i.e. `scalar * 1e18 / divisor.mantissa`
pub fn div_scalar_by_exp_truncate(scalar: Amount, divisor: Exp) -> Result<Amount, MathError> {
    if divisor.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let scaled = scalar
        .raw()
        .checked_mul(EXP_SCALE)
        .ok_or(MathError::Overflow)?;
    Ok(Amount::from_raw(scaled / divisor.mantissa))
}

impl fmt::Display for Exp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_decimal() {
            Some(d) => write!(f, "{}", d),
            None => write!(f, "{}e-18", self.mantissa),
        }
    }
}

impl Default for Exp {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Serialized as the raw mantissa string so no precision is lost
impl TryFrom<String> for Exp {
    type Error = std::num::ParseIntError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        U256::from_str_radix(value.trim(), 10).map(Exp::from_mantissa)
    }
}

impl From<Exp> for String {
    fn from(exp: Exp) -> Self {
        exp.mantissa.to_string()
    }
}
