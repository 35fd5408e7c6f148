//! All market ledgers, keyed by market id

use std::collections::BTreeMap;

use ironbank_core::{AccountId, Amount, MarketId};
use ironbank_risk::{AccountSnapshot, MarketLedgers, MarketTotals, RiskError};
use serde::{Deserialize, Serialize};

use crate::error::LendingError;
use crate::market::Market;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketBook {
    markets: BTreeMap<MarketId, Market>,
}

impl MarketBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, market: Market) -> Result<(), LendingError> {
        if self.markets.contains_key(market.id()) {
            return Err(LendingError::MarketExists {
                market: market.id().clone(),
            });
        }
        self.markets.insert(market.id().clone(), market);
        Ok(())
    }

    pub fn get(&self, market: &MarketId) -> Result<&Market, LendingError> {
        self.markets.get(market).ok_or_else(|| LendingError::UnknownMarket {
            market: market.clone(),
        })
    }

    pub fn get_mut(&mut self, market: &MarketId) -> Result<&mut Market, LendingError> {
        self.markets.get_mut(market).ok_or_else(|| LendingError::UnknownMarket {
            market: market.clone(),
        })
    }

    pub fn contains(&self, market: &MarketId) -> bool {
        self.markets.contains_key(market)
    }

    pub fn markets(&self) -> impl Iterator<Item = &Market> {
        self.markets.values()
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    fn lookup(&self, market: &MarketId) -> Result<&Market, RiskError> {
        self.markets.get(market).ok_or_else(|| RiskError::UnknownMarket {
            market: market.clone(),
        })
    }

    fn lookup_mut(&mut self, market: &MarketId) -> Result<&mut Market, RiskError> {
        self.markets.get_mut(market).ok_or_else(|| RiskError::UnknownMarket {
            market: market.clone(),
        })
    }
}

fn into_risk(err: LendingError) -> RiskError {
    match err {
        LendingError::Risk(err) => err,
        LendingError::Math(err) => RiskError::Math(err),
        LendingError::Price(err) => RiskError::Price(err),
        other => RiskError::InvalidInput(other.to_string()),
    }
}

impl MarketLedgers for MarketBook {
    fn account_snapshot(&self, market: &MarketId, account: &AccountId) -> Result<AccountSnapshot, RiskError> {
        self.lookup(market)?.account_snapshot(account).map_err(into_risk)
    }

    fn market_totals(&self, market: &MarketId) -> Result<MarketTotals, RiskError> {
        self.lookup(market)?.totals().map_err(into_risk)
    }

    fn register_collateral(&mut self, market: &MarketId, account: &AccountId) -> Result<Option<Amount>, RiskError> {
        self.lookup_mut(market)?.register_collateral(account).map_err(into_risk)
    }

    fn unregister_collateral(&mut self, market: &MarketId, account: &AccountId) -> Result<Option<Amount>, RiskError> {
        self.lookup_mut(market)?.unregister_collateral(account).map_err(into_risk)
    }
}
