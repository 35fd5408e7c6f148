//! Shared fixture for ledger integration tests

#![allow(dead_code)]

use std::sync::Arc;

use ironbank_core::{AccountId, Amount, AssetId, Exp, MarketId, MarketVersion};
use ironbank_ledger::{FixedRateModel, MarketSpec, Protocol, ProtocolConfig, RateModel};
use ironbank_oracle::MockOracle;
use rust_decimal::Decimal;

pub const WAD: u128 = 1_000_000_000_000_000_000;

/// `n` whole tokens with 18 decimals
pub fn units(n: u128) -> Amount {
    Amount::new(n * WAD)
}

pub fn exp(d: Decimal) -> Exp {
    Exp::from_decimal(d).unwrap()
}

pub fn account(name: &str) -> AccountId {
    AccountId::new(name)
}

pub fn market(id: &str) -> MarketId {
    MarketId::new(id)
}

pub struct Harness {
    pub protocol: Protocol,
    pub oracle: Arc<MockOracle>,
    pub admin: AccountId,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ProtocolConfig::default())
    }

    pub fn with_config(config: ProtocolConfig) -> Self {
        let oracle = Arc::new(MockOracle::new());
        let protocol = Protocol::new(&config, oracle.clone()).unwrap();
        Self {
            protocol,
            oracle,
            admin: AccountId::new(config.admin.as_str()),
        }
    }

    /// Create and list a market at exchange rate 1 with a fixed borrow rate
    pub fn add_market(
        &mut self,
        id: &str,
        underlying: &str,
        version: MarketVersion,
        price: Decimal,
        collateral_factor: Decimal,
        rate_per_block: Decimal,
    ) -> MarketId {
        let model = RateModel::Fixed(FixedRateModel {
            rate_per_block: exp(rate_per_block),
        });
        self.add_market_with_model(id, underlying, version, price, collateral_factor, model)
    }

    pub fn add_market_with_model(
        &mut self,
        id: &str,
        underlying: &str,
        version: MarketVersion,
        price: Decimal,
        collateral_factor: Decimal,
        rate_model: RateModel,
    ) -> MarketId {
        let id = MarketId::new(id);
        self.protocol
            .create_market(
                &self.admin,
                MarketSpec {
                    id: id.clone(),
                    underlying: AssetId::new(underlying),
                    version,
                    rate_model,
                    initial_exchange_rate: Exp::ONE,
                    reserve_factor: exp(Decimal::new(1, 1)),
                },
            )
            .unwrap();
        self.protocol.support_market(&self.admin, &id).unwrap();
        self.oracle.set_price(id.clone(), exp(price));
        if !collateral_factor.is_zero() {
            self.protocol
                .set_collateral_factor(&self.admin, &id, exp(collateral_factor))
                .unwrap();
        }
        id
    }

    pub fn fund(&mut self, underlying: &str, who: &AccountId, amount: Amount) {
        self.protocol
            .credit_underlying(&AssetId::new(underlying), who, amount)
            .unwrap();
    }

    /// Fund `who` and supply everything to `market`
    pub fn supply(&mut self, underlying: &str, market: &MarketId, who: &AccountId, amount: Amount) -> Amount {
        self.fund(underlying, who, amount);
        self.protocol.mint(who, market, amount).unwrap()
    }

    pub fn balance(&self, underlying: &str, who: &AccountId) -> Amount {
        self.protocol.underlying_balance(&AssetId::new(underlying), who)
    }

    pub fn set_price(&self, market: &MarketId, price: Decimal) {
        self.oracle.set_price(market.clone(), exp(price));
    }

    pub fn advance(&mut self, blocks: u64) {
        self.protocol.advance_blocks(blocks).unwrap();
    }

    pub fn state_json(&self) -> serde_json::Value {
        serde_json::to_value(self.protocol.state()).unwrap()
    }
}
