//! Oracle error types

use ironbank_core::{ErrorKind, MarketId};
use thiserror::Error;

/// Oracle-related errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// No price has been published for the market's underlying
    #[error("no price for {market}")]
    PriceNotFound { market: MarketId },

    /// A price exists but is zero, which is never a valid valuation
    #[error("zero price for {market}")]
    ZeroPrice { market: MarketId },

    /// Price file could not be loaded or saved
    #[error("price store error: {0}")]
    Store(String),
}

impl OracleError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::PriceFault
    }
}
