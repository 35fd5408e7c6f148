//! Port through which the Comptroller reads and adjusts market ledgers

use ironbank_core::{AccountId, Amount, Exp, MarketId};

use crate::error::RiskError;

/// One account's position in one market, as the risk engine sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccountSnapshot {
    /// Claim tokens counted as collateral (the full balance for uncapped markets)
    pub collateral_tokens: Amount,
    /// Borrow balance at the market's stored borrow index
    pub borrow_balance: Amount,
    /// Stored exchange rate of the market
    pub exchange_rate: Exp,
}

/// Market-wide figures used by caps, liquidation and seize checks
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarketTotals {
    /// Underlying supplied: `cash + total_borrows - total_reserves`
    pub supplied: Amount,
    pub total_borrows: Amount,
    pub exchange_rate: Exp,
    pub accrual_block: u64,
    /// Comptroller association tag
    pub comptroller: String,
}

/// Access to every market ledger, implemented by the ledger crate's book
pub trait MarketLedgers {
    fn account_snapshot(
        &self,
        market: &MarketId,
        account: &AccountId,
    ) -> Result<AccountSnapshot, RiskError>;

    fn market_totals(&self, market: &MarketId) -> Result<MarketTotals, RiskError>;

    /// Count the account's existing balance as collateral, up to the
    /// market's collateral cap. Returns the new collateral balance, or `None`
    /// for markets without a collateral sub-balance.
    fn register_collateral(
        &mut self,
        market: &MarketId,
        account: &AccountId,
    ) -> Result<Option<Amount>, RiskError>;

    /// Stop counting the account's balance as collateral
    fn unregister_collateral(
        &mut self,
        market: &MarketId,
        account: &AccountId,
    ) -> Result<Option<Amount>, RiskError>;
}

/// In-memory ledgers for risk engine unit tests
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Debug, Default)]
    pub struct FakeLedgers {
        pub positions: BTreeMap<(MarketId, AccountId), AccountSnapshot>,
        pub totals: BTreeMap<MarketId, MarketTotals>,
        pub exchange_rates: BTreeMap<MarketId, Exp>,
        pub registered: Vec<(MarketId, AccountId)>,
    }

    impl FakeLedgers {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_market(&mut self, market: &MarketId, exchange_rate: Exp) {
            self.exchange_rates.insert(market.clone(), exchange_rate);
            self.totals.insert(
                market.clone(),
                MarketTotals {
                    exchange_rate,
                    comptroller: "comptroller".to_string(),
                    ..MarketTotals::default()
                },
            );
        }

        pub fn set_position(
            &mut self,
            market: &MarketId,
            account: &AccountId,
            collateral_tokens: u128,
            borrow_balance: u128,
        ) {
            let exchange_rate = self.exchange_rates.get(market).copied().unwrap_or(Exp::ONE);
            self.positions.insert(
                (market.clone(), account.clone()),
                AccountSnapshot {
                    collateral_tokens: Amount::new(collateral_tokens),
                    borrow_balance: Amount::new(borrow_balance),
                    exchange_rate,
                },
            );
        }

        pub fn totals_mut(&mut self, market: &MarketId) -> &mut MarketTotals {
            self.totals.get_mut(market).unwrap()
        }
    }

    impl MarketLedgers for FakeLedgers {
        fn account_snapshot(
            &self,
            market: &MarketId,
            account: &AccountId,
        ) -> Result<AccountSnapshot, RiskError> {
            let exchange_rate = self
                .exchange_rates
                .get(market)
                .copied()
                .ok_or_else(|| RiskError::UnknownMarket { market: market.clone() })?;
            Ok(self
                .positions
                .get(&(market.clone(), account.clone()))
                .copied()
                .unwrap_or(AccountSnapshot {
                    exchange_rate,
                    ..AccountSnapshot::default()
                }))
        }

        fn market_totals(&self, market: &MarketId) -> Result<MarketTotals, RiskError> {
            self.totals
                .get(market)
                .cloned()
                .ok_or_else(|| RiskError::UnknownMarket { market: market.clone() })
        }

        fn register_collateral(
            &mut self,
            market: &MarketId,
            account: &AccountId,
        ) -> Result<Option<Amount>, RiskError> {
            self.registered.push((market.clone(), account.clone()));
            Ok(None)
        }

        fn unregister_collateral(
            &mut self,
            market: &MarketId,
            account: &AccountId,
        ) -> Result<Option<Amount>, RiskError> {
            self.registered.retain(|(m, a)| !(m == market && a == account));
            Ok(None)
        }
    }
}
