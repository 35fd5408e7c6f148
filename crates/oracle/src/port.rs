//! Price oracle port

use ironbank_core::{Exp, MarketId};

use crate::error::OracleError;

/// Source of USD prices for each market's underlying asset.
///
/// Prices are `Exp` mantissas scaled so that `price * underlying_amount`
/// yields a value in the shared accounting unit. Implementations must report
/// an unset price as `PriceNotFound`; callers treat `ZeroPrice` the same way
/// (fail-closed).
pub trait PriceOracle: Send + Sync {
    /// Get the price of one unit of the market's underlying
    fn underlying_price(&self, market: &MarketId) -> Result<Exp, OracleError>;

    /// Get a price, rejecting zero
    fn nonzero_price(&self, market: &MarketId) -> Result<Exp, OracleError> {
        let price = self.underlying_price(market)?;
        if price.is_zero() {
            return Err(OracleError::ZeroPrice {
                market: market.clone(),
            });
        }
        Ok(price)
    }
}
