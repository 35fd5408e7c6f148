//! Account liquidity
//!
//! Sums, over every market an account has entered, the collateral value
//! `tokens * exchange_rate * collateral_factor * price` against the borrow
//! value `borrow_balance * price`. A missing or zero price for any of those
//! markets aborts the whole computation.

use ironbank_core::{AccountId, Amount, MarketId};
use ironbank_oracle::PriceOracle;

use crate::engine::Comptroller;
use crate::error::RiskError;
use crate::ledgers::MarketLedgers;
use crate::registry::ListingState;

/// Excess collateral or shortfall, in the oracle's value unit.
///
/// At most one of the two is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Liquidity {
    pub liquidity: Amount,
    pub shortfall: Amount,
}

impl Liquidity {
    fn from_sums(collateral: Amount, borrows: Amount) -> Self {
        Self {
            liquidity: collateral.saturating_sub(borrows),
            shortfall: borrows.saturating_sub(collateral),
        }
    }

    pub fn has_shortfall(&self) -> bool {
        !self.shortfall.is_zero()
    }
}

/// Hypothetical change applied to one market before pricing
#[derive(Debug, Clone, Copy)]
pub(crate) struct Adjustment<'a> {
    pub market: &'a MarketId,
    pub redeem_tokens: Amount,
    pub borrow_amount: Amount,
    /// Folded into the existing borrow balance before pricing
    pub repaid_amount: Amount,
}

impl Comptroller {
    /// Current liquidity of an account
    pub fn account_liquidity(
        &self,
        account: &AccountId,
        ledgers: &dyn MarketLedgers,
        oracle: &dyn PriceOracle,
    ) -> Result<Liquidity, RiskError> {
        self.liquidity_with(account, None, ledgers, oracle)
    }

    /// Liquidity the account would have after redeeming `redeem_tokens` and
    /// borrowing `borrow_amount` in `market`
    pub fn hypothetical_liquidity(
        &self,
        account: &AccountId,
        market: &MarketId,
        redeem_tokens: Amount,
        borrow_amount: Amount,
        ledgers: &dyn MarketLedgers,
        oracle: &dyn PriceOracle,
    ) -> Result<Liquidity, RiskError> {
        let adjustment = Adjustment {
            market,
            redeem_tokens,
            borrow_amount,
            repaid_amount: Amount::ZERO,
        };
        self.liquidity_with(account, Some(adjustment), ledgers, oracle)
    }

    pub(crate) fn liquidity_with(
        &self,
        account: &AccountId,
        adjustment: Option<Adjustment<'_>>,
        ledgers: &dyn MarketLedgers,
        oracle: &dyn PriceOracle,
    ) -> Result<Liquidity, RiskError> {
        let mut sum_collateral = Amount::ZERO;
        let mut sum_borrows = Amount::ZERO;

        for market in self.membership.markets_of(account) {
            let Some(info) = self.registry.get(market) else {
                continue;
            };
            if info.listing == ListingState::HardDelisted {
                continue;
            }

            let snapshot = ledgers.account_snapshot(market, account)?;
            let price = oracle.nonzero_price(market)?;

            // Value of one claim token as collateral
            let tokens_to_denom = info
                .collateral_factor
                .mul_exp(snapshot.exchange_rate)?
                .mul_exp(price)?;

            let adjustment = adjustment.filter(|a| a.market == market);
            let borrow_balance = match adjustment {
                Some(adj) => snapshot.borrow_balance.checked_add(adj.repaid_amount)?,
                None => snapshot.borrow_balance,
            };

            sum_collateral =
                tokens_to_denom.mul_scalar_truncate_add(snapshot.collateral_tokens, sum_collateral)?;
            sum_borrows = price.mul_scalar_truncate_add(borrow_balance, sum_borrows)?;

            if let Some(adj) = adjustment {
                sum_borrows = tokens_to_denom.mul_scalar_truncate_add(adj.redeem_tokens, sum_borrows)?;
                sum_borrows = price.mul_scalar_truncate_add(adj.borrow_amount, sum_borrows)?;
            }
        }

        let result = Liquidity::from_sums(sum_collateral, sum_borrows);
        tracing::debug!(
            account = %account,
            collateral = %sum_collateral,
            borrows = %sum_borrows,
            shortfall = %result.shortfall,
            "Computed account liquidity"
        );
        Ok(result)
    }
}
