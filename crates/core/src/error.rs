//! Shared error types and the fault taxonomy

use serde::{Deserialize, Serialize};
use strum_macros::Display;
use thiserror::Error;

/// Failure of a fixed-point primitive.
///
/// Every arithmetic fault aborts the current operation; nothing wraps.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("arithmetic overflow")]
    Overflow,

    #[error("arithmetic underflow")]
    Underflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("decimal value is negative or has too much precision")]
    InvalidDecimal,
}

/// Coarse classification of every protocol failure.
///
/// Callers (UIs, liquidation bots) branch on this instead of matching
/// individual error variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A risk-engine check said no (unlisted, paused, cap, liquidity)
    PolicyRejection,
    /// Market accounting is not accrued to the current block
    Staleness,
    /// Overflow, underflow or division by zero
    ArithmeticFault,
    /// Nested call into a market that is mid-operation
    ReentrancyFault,
    /// Missing or zero oracle price
    PriceFault,
    /// Caller lacks the admin or guardian capability
    Unauthorized,
    /// Malformed request
    InvalidInput,
}

impl MathError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ArithmeticFault
    }
}
