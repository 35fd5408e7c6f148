//! Ledger errors

use ironbank_core::{AccountId, AssetId, ErrorKind, MarketId, MathError};
use ironbank_oracle::OracleError;
use ironbank_risk::RiskError;
use thiserror::Error;

/// Underlying token movement errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Insufficient {asset} balance for {account}: available {available}, required {required}")]
    InsufficientBalance {
        asset: AssetId,
        account: AccountId,
        available: String,
        required: String,
    },

    #[error("Token math error: {0}")]
    Math(#[from] MathError),
}

/// Errors that can occur in ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LendingError {
    #[error("Rejected by risk engine: {0}")]
    Risk(#[from] RiskError),

    #[error("Math error: {0}")]
    Math(#[from] MathError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Price error: {0}")]
    Price(#[from] OracleError),

    #[error("Market {market} is stale: accrued at {accrual_block}, current block {current_block}")]
    MarketStale {
        market: MarketId,
        accrual_block: u64,
        current_block: u64,
    },

    #[error("Re-entered {market}")]
    Reentered { market: MarketId },

    #[error("Unknown market: {market}")]
    UnknownMarket { market: MarketId },

    #[error("Market already exists: {market}")]
    MarketExists { market: MarketId },

    #[error("Insufficient cash in {market}: available {available}, required {required}")]
    InsufficientCash {
        market: MarketId,
        available: String,
        required: String,
    },

    #[error("Insufficient {market} tokens for {account}: available {available}, required {required}")]
    InsufficientTokens {
        market: MarketId,
        account: AccountId,
        available: String,
        required: String,
    },

    #[error("Insufficient reserves in {market}: available {available}, required {required}")]
    InsufficientReserves {
        market: MarketId,
        available: String,
        required: String,
    },

    #[error("Borrow rate {rate} per block exceeds ceiling {max}")]
    BorrowRateTooHigh { rate: String, max: String },

    #[error("Invalid reserve factor {factor} (max {max})")]
    InvalidReserveFactor { factor: String, max: String },

    #[error("Exactly one of redeem tokens and redeem amount must be non-zero")]
    InvalidRedeemInput,

    #[error("Liquidator cannot be the borrower")]
    LiquidatorIsBorrower,

    #[error("Invalid liquidation repay amount")]
    InvalidRepayAmount,

    #[error("Liquidation would seize {required} tokens but borrower holds {available}")]
    SeizeTooMuch { available: String, required: String },

    #[error("Cannot transfer to self")]
    SelfTransfer,

    #[error("Market {market} does not accept the native asset")]
    NativeNotSupported { market: MarketId },

    #[error("Flashloan not repaid: expected balance {expected}, got {actual}")]
    FlashloanNotRepaid { expected: String, actual: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl LendingError {
    /// Classify into the protocol failure taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            LendingError::Risk(err) => err.kind(),
            LendingError::Math(_) | LendingError::BorrowRateTooHigh { .. } => ErrorKind::ArithmeticFault,
            LendingError::Token(TokenError::Math(_)) => ErrorKind::ArithmeticFault,
            LendingError::Price(_) => ErrorKind::PriceFault,
            LendingError::MarketStale { .. } => ErrorKind::Staleness,
            LendingError::Reentered { .. } => ErrorKind::ReentrancyFault,
            LendingError::InsufficientCash { .. }
            | LendingError::InsufficientTokens { .. }
            | LendingError::InsufficientReserves { .. }
            | LendingError::SeizeTooMuch { .. }
            | LendingError::FlashloanNotRepaid { .. }
            | LendingError::Token(TokenError::InsufficientBalance { .. }) => ErrorKind::PolicyRejection,
            LendingError::UnknownMarket { .. }
            | LendingError::MarketExists { .. }
            | LendingError::InvalidReserveFactor { .. }
            | LendingError::InvalidRedeemInput
            | LendingError::LiquidatorIsBorrower
            | LendingError::InvalidRepayAmount
            | LendingError::SelfTransfer
            | LendingError::NativeNotSupported { .. }
            | LendingError::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }
}
