//! Risk engine errors

use ironbank_core::{AccountId, ErrorKind, MarketId, MathError, PauseAction};
use ironbank_oracle::OracleError;
use thiserror::Error;

use crate::registry::ListingState;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RiskError {
    #[error("market not listed: {market}")]
    MarketNotListed { market: MarketId },

    #[error("market already listed or delisted: {market}")]
    MarketAlreadyListed { market: MarketId },

    #[error("cannot move {market} out of {from} state")]
    InvalidListingTransition { market: MarketId, from: ListingState },

    #[error("{action} must be paused on {market} first")]
    MarketNotPaused { market: MarketId, action: PauseAction },

    #[error("market has collateral: {market}")]
    MarketHasCollateral { market: MarketId },

    #[error("{action} is paused")]
    ActionPaused {
        action: PauseAction,
        market: Option<MarketId>,
    },

    #[error("market supply cap reached: {market}")]
    SupplyCapReached { market: MarketId },

    #[error("market borrow cap reached: {market}")]
    BorrowCapReached { market: MarketId },

    #[error("insufficient liquidity: shortfall {shortfall}")]
    InsufficientLiquidity { shortfall: String },

    #[error("insufficient credit limit for {account} on {market}")]
    CreditLimitExceeded { account: AccountId, market: MarketId },

    #[error("nonzero borrow balance on {market}")]
    NonzeroBorrowBalance { market: MarketId },

    #[error("borrower has no shortfall: {borrower}")]
    InsufficientShortfall { borrower: AccountId },

    #[error("repay {repay} exceeds close limit {max_close}")]
    TooMuchRepay { repay: String, max_close: String },

    #[error("cannot liquidate credit account {borrower}")]
    CreditAccountLiquidation { borrower: AccountId },

    #[error("cannot repay on behalf of credit account {borrower}")]
    CreditAccountRepay { borrower: AccountId },

    #[error("comptroller mismatch between {borrowed} and {collateral}")]
    ComptrollerMismatch {
        borrowed: MarketId,
        collateral: MarketId,
    },

    #[error("flashloan not supported by {market}")]
    FlashloanNotSupported { market: MarketId },

    #[error("market is stale: {market}")]
    MarketStale { market: MarketId },

    #[error("invalid collateral factor {factor} (max {max})")]
    InvalidCollateralFactor { factor: String, max: String },

    #[error("invalid close factor {0}")]
    InvalidCloseFactor(String),

    #[error("invalid liquidation incentive {0}")]
    InvalidLiquidationIncentive(String),

    #[error("mint produced zero tokens")]
    MintTokensZero,

    #[error("redeem burned zero tokens")]
    RedeemTokensZero,

    #[error("unknown market: {market}")]
    UnknownMarket { market: MarketId },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{caller} is not authorized to {action}")]
    Unauthorized { caller: AccountId, action: String },

    #[error("price error: {0}")]
    Price(#[from] OracleError),

    #[error("math error: {0}")]
    Math(#[from] MathError),
}

impl RiskError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RiskError::MarketStale { .. } => ErrorKind::Staleness,
            RiskError::Price(_) => ErrorKind::PriceFault,
            RiskError::Math(_) => ErrorKind::ArithmeticFault,
            RiskError::Unauthorized { .. } => ErrorKind::Unauthorized,
            RiskError::InvalidCollateralFactor { .. }
            | RiskError::InvalidCloseFactor(_)
            | RiskError::InvalidLiquidationIncentive(_)
            | RiskError::MintTokensZero
            | RiskError::RedeemTokensZero
            | RiskError::UnknownMarket { .. }
            | RiskError::InvalidInput(_) => ErrorKind::InvalidInput,
            _ => ErrorKind::PolicyRejection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let market = MarketId::new("crETH");
        assert_eq!(
            RiskError::MarketNotListed { market: market.clone() }.kind(),
            ErrorKind::PolicyRejection
        );
        assert_eq!(RiskError::MarketStale { market: market.clone() }.kind(), ErrorKind::Staleness);
        assert_eq!(
            RiskError::from(OracleError::PriceNotFound { market }).kind(),
            ErrorKind::PriceFault
        );
        assert_eq!(RiskError::from(MathError::Overflow).kind(), ErrorKind::ArithmeticFault);
    }

    #[test]
    fn test_error_messages() {
        let err = RiskError::MarketAlreadyListed {
            market: MarketId::new("crUSDC"),
        };
        assert_eq!(err.to_string(), "market already listed or delisted: crUSDC");
    }
}
