//! Liquidation seize calculator
//!
//! Converts a repaid amount of the borrowed asset into claim tokens of the
//! collateral market:
//!
//! ```text
//! seizeTokens = repayAmount * incentive * priceBorrowed
//!             / (priceCollateral * exchangeRateCollateral)
//! ```

use ironbank_core::{Amount, Exp, MarketId, MathError};
use ironbank_oracle::PriceOracle;

use crate::engine::Comptroller;
use crate::error::RiskError;
use crate::ledgers::MarketLedgers;

/// Collateral tokens owed to a liquidator for `repay_amount`.
///
/// A zero collateral price or exchange rate is a division by zero.
pub fn seize_tokens(
    repay_amount: Amount,
    incentive: Exp,
    price_borrowed: Exp,
    price_collateral: Exp,
    exchange_rate: Exp,
) -> Result<Amount, MathError> {
    let numerator = incentive.mul_exp(price_borrowed)?;
    let denominator = price_collateral.mul_exp(exchange_rate)?;
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let ratio = numerator.div_exp(denominator)?;
    ratio.mul_scalar_truncate(repay_amount)
}

impl Comptroller {
    /// Seize tokens for a liquidation repaying `repay_amount` in `borrowed`
    pub fn liquidate_calculate_seize_tokens(
        &self,
        borrowed: &MarketId,
        collateral: &MarketId,
        repay_amount: Amount,
        ledgers: &dyn MarketLedgers,
        oracle: &dyn PriceOracle,
    ) -> Result<Amount, RiskError> {
        let price_borrowed = oracle.nonzero_price(borrowed)?;
        let price_collateral = oracle.nonzero_price(collateral)?;
        let exchange_rate = ledgers.market_totals(collateral)?.exchange_rate;

        let tokens = seize_tokens(
            repay_amount,
            self.params.liquidation_incentive,
            price_borrowed,
            price_collateral,
            exchange_rate,
        )?;
        tracing::debug!(
            borrowed = %borrowed,
            collateral = %collateral,
            repay = %repay_amount,
            seize = %tokens,
            "Calculated seize tokens"
        );
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RiskConfig;
    use crate::ledgers::testing::FakeLedgers;
    use ironbank_core::{AccountId, ErrorKind};
    use ironbank_oracle::MockOracle;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn exp(d: Decimal) -> Exp {
        Exp::from_decimal(d).unwrap()
    }

    #[test]
    fn test_unit_prices_seize_repay() {
        for repay in [1u128, 7, 1_000, 123_456_789_000_000_000_000] {
            let tokens = seize_tokens(Amount::new(repay), Exp::ONE, Exp::ONE, Exp::ONE, Exp::ONE).unwrap();
            assert_eq!(tokens, Amount::new(repay));
        }
    }

    #[test]
    fn test_seize_with_incentive_and_rate() {
        // 100 repaid at $2, collateral at $1 with 0.02 exchange rate, 8% bonus
        // 100 * 1.08 * 2 / (1 * 0.02) = 10_800
        let tokens = seize_tokens(
            Amount::new(100),
            exp(dec!(1.08)),
            exp(dec!(2)),
            exp(dec!(1)),
            exp(dec!(0.02)),
        )
        .unwrap();
        assert_eq!(tokens, Amount::new(10_800));
    }

    #[test]
    fn test_seize_zero_exchange_rate() {
        assert_eq!(
            seize_tokens(Amount::new(1), Exp::ONE, Exp::ONE, Exp::ONE, Exp::ZERO),
            Err(MathError::DivisionByZero)
        );
    }

    #[test]
    fn test_seize_overflow() {
        let huge = Exp::from_mantissa(Amount::MAX.raw());
        assert_eq!(
            seize_tokens(Amount::new(1), huge, exp(dec!(2)), Exp::ONE, Exp::ONE),
            Err(MathError::Overflow)
        );
    }

    #[test]
    fn test_zero_price_is_price_error() {
        let comptroller = Comptroller::new(AccountId::new("admin"), &RiskConfig::default()).unwrap();
        let borrowed = MarketId::new("crETH");
        let collateral = MarketId::new("crUSDC");
        let mut ledgers = FakeLedgers::new();
        ledgers.add_market(&collateral, Exp::ONE);
        let oracle = MockOracle::with_prices([(borrowed.clone(), Exp::ONE), (collateral.clone(), Exp::ZERO)]);

        let err = comptroller
            .liquidate_calculate_seize_tokens(&borrowed, &collateral, Amount::new(10), &ledgers, &oracle)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PriceFault);

        oracle.set_price(collateral.clone(), Exp::ONE);
        let tokens = comptroller
            .liquidate_calculate_seize_tokens(&borrowed, &collateral, Amount::new(100), &ledgers, &oracle)
            .unwrap();
        assert_eq!(tokens, Amount::new(108));
    }
}
