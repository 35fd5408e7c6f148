//! Mock Oracle for testing
//!
//! Provides settable prices for tests and the operator CLI.

use ironbank_core::{Exp, MarketId};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::RwLock;

use crate::error::OracleError;
use crate::port::PriceOracle;

/// Mock Price Oracle
///
/// Stores fixed prices that can be updated programmatically. A stored zero is
/// returned as-is so callers' zero-price handling can be exercised.
#[derive(Debug, Default)]
pub struct MockOracle {
    prices: RwLock<HashMap<MarketId, Exp>>,
}

impl MockOracle {
    /// Create a new empty mock oracle
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock oracle pre-populated with prices
    pub fn with_prices(prices: impl IntoIterator<Item = (MarketId, Exp)>) -> Self {
        Self {
            prices: RwLock::new(prices.into_iter().collect()),
        }
    }

    /// Set the underlying price for a market
    pub fn set_price(&self, market: MarketId, price: Exp) {
        let mut prices = self.prices.write().unwrap_or_else(|e| e.into_inner());
        prices.insert(market, price);
    }

    /// Remove a price (for testing missing-price errors)
    pub fn remove_price(&self, market: &MarketId) {
        let mut prices = self.prices.write().unwrap_or_else(|e| e.into_inner());
        prices.remove(market);
    }

    /// Snapshot of all prices, ordered by market
    pub fn prices(&self) -> BTreeMap<MarketId, Exp> {
        let prices = self.prices.read().unwrap_or_else(|e| e.into_inner());
        prices.iter().map(|(m, p)| (m.clone(), *p)).collect()
    }

    /// Load prices from a JSON object of `market -> mantissa`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OracleError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| OracleError::Store(e.to_string()))?;
        let prices: BTreeMap<MarketId, Exp> =
            serde_json::from_str(&content).map_err(|e| OracleError::Store(e.to_string()))?;
        Ok(Self::with_prices(prices))
    }

    /// Save prices as a JSON object of `market -> mantissa`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), OracleError> {
        let json = serde_json::to_string_pretty(&self.prices())
            .map_err(|e| OracleError::Store(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| OracleError::Store(e.to_string()))
    }
}

impl PriceOracle for MockOracle {
    fn underlying_price(&self, market: &MarketId) -> Result<Exp, OracleError> {
        let prices = self.prices.read().unwrap_or_else(|e| e.into_inner());
        prices
            .get(market)
            .copied()
            .ok_or_else(|| OracleError::PriceNotFound {
                market: market.clone(),
            })
    }
}
