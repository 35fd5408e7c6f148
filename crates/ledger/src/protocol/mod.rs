//! Protocol - the single entry point that sequences every action
//!
//! Each action runs as one atomic step: accrue the touched markets, ask the
//! risk engine, mutate the ledgers, verify, then emit events. Any error
//! restores the state as it was before the step began.

mod actions;
mod admin;
mod flashloan;
mod liquidate;
mod native;
mod views;

pub use flashloan::FlashloanReceiver;
pub use liquidate::Liquidation;

use std::sync::Arc;

use ironbank_core::{AccountId, Amount, AssetId, MarketId};
use ironbank_events::EventLog;
use ironbank_oracle::PriceOracle;
use ironbank_risk::Comptroller;
use serde::{Deserialize, Serialize};

use crate::bank::TokenBank;
use crate::book::MarketBook;
use crate::config::{LedgerLimits, ProtocolConfig};
use crate::error::LendingError;

/// Everything a protocol instance persists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolState {
    pub comptroller: Comptroller,
    pub book: MarketBook,
    pub bank: TokenBank,
    pub limits: LedgerLimits,
    /// Current block height
    pub block: u64,
    pub events: EventLog,
}

impl ProtocolState {
    /// Empty state at block zero
    pub fn new(config: &ProtocolConfig) -> Result<Self, LendingError> {
        let comptroller = Comptroller::new(AccountId::new(config.admin.as_str()), &config.risk)?;
        Ok(Self {
            comptroller,
            book: MarketBook::new(),
            bank: TokenBank::new(),
            limits: config.limits()?,
            block: 0,
            events: EventLog::new(),
        })
    }

    /// Load persisted state from a JSON file
    pub fn load(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

/// The lending protocol: risk engine, market ledgers and token custody
pub struct Protocol {
    state: ProtocolState,
    oracle: Arc<dyn PriceOracle>,
}

impl Protocol {
    pub fn new(config: &ProtocolConfig, oracle: Arc<dyn PriceOracle>) -> Result<Self, LendingError> {
        Ok(Self::from_state(ProtocolState::new(config)?, oracle))
    }

    pub fn from_state(state: ProtocolState, oracle: Arc<dyn PriceOracle>) -> Self {
        Self { state, oracle }
    }

    pub fn state(&self) -> &ProtocolState {
        &self.state
    }

    pub fn into_state(self) -> ProtocolState {
        self.state
    }

    /// Run `op` as one atomic step, restoring the prior state on error.
    ///
    /// The event log is left out of the snapshot and truncated back to its
    /// mark instead.
    fn atomically<T>(
        &mut self,
        name: &'static str,
        op: impl FnOnce(&mut Self) -> Result<T, LendingError>,
    ) -> Result<T, LendingError> {
        let events = std::mem::take(&mut self.state.events);
        let mark = events.mark();
        let snapshot = self.state.clone();
        self.state.events = events;
        self.state.events.set_block(self.state.block);

        match op(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                tracing::warn!(op = name, kind = %err.kind(), error = %err, "Rolled back");
                let mut events = std::mem::replace(&mut self.state, snapshot).events;
                events.rollback(mark);
                self.state.events = events;
                Err(err)
            }
        }
    }

    /// Hold `market`'s re-entrancy guard for the duration of `op`.
    ///
    /// Only called inside `atomically`, whose rollback also resets the guard.
    fn guarded<T>(
        &mut self,
        market: &MarketId,
        op: impl FnOnce(&mut Self) -> Result<T, LendingError>,
    ) -> Result<T, LendingError> {
        self.state.book.get_mut(market)?.guard.enter(market)?;
        let value = op(self)?;
        self.state.book.get_mut(market)?.guard.exit();
        Ok(value)
    }

    fn accrue(&mut self, market: &MarketId) -> Result<(), LendingError> {
        let s = &mut self.state;
        s.book
            .get_mut(market)?
            .accrue_interest(s.block, &s.limits, &mut s.events)
    }

    // === Host ===

    pub fn block_number(&self) -> u64 {
        self.state.block
    }

    /// Move the chain forward; returns the new height
    pub fn advance_blocks(&mut self, blocks: u64) -> Result<u64, LendingError> {
        self.state.block = self
            .state
            .block
            .checked_add(blocks)
            .ok_or_else(|| LendingError::InvalidInput("block height overflow".to_string()))?;
        tracing::debug!(block = self.state.block, "Advanced blocks");
        Ok(self.state.block)
    }

    /// Mint underlying to an account out of thin air
    pub fn credit_underlying(&mut self, asset: &AssetId, account: &AccountId, amount: Amount) -> Result<(), LendingError> {
        self.state.bank.credit(asset, account, amount)?;
        tracing::info!(asset = %asset, account = %account, amount = %amount, "Credited underlying");
        Ok(())
    }

    pub fn credit_native(&mut self, account: &AccountId, amount: Amount) -> Result<(), LendingError> {
        self.credit_underlying(&AssetId::native(), account, amount)
    }

    /// Move underlying between accounts, e.g. to pay back a flashloan
    pub fn transfer_underlying(
        &mut self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LendingError> {
        self.atomically("transfer_underlying", |p| {
            p.state.bank.transfer(asset, from, to, amount)?;
            Ok(())
        })
    }

    pub fn underlying_balance(&self, asset: &AssetId, account: &AccountId) -> Amount {
        self.state.bank.balance_of(asset, account)
    }

    pub fn oracle(&self) -> &dyn PriceOracle {
        &*self.oracle
    }

    /// Swap the price source
    pub fn set_oracle(&mut self, caller: &AccountId, oracle: Arc<dyn PriceOracle>) -> Result<(), LendingError> {
        self.state.comptroller.require_admin(caller, "set oracle")?;
        self.oracle = oracle;
        tracing::info!("Price oracle replaced");
        Ok(())
    }

    pub fn events(&self) -> &EventLog {
        &self.state.events
    }

    /// Forget events up to and including `sequence` once the host has
    /// journaled them
    pub fn prune_events(&mut self, sequence: u64) -> usize {
        let pruned = self.state.events.prune_through(sequence);
        tracing::debug!(through = sequence, pruned, "Events pruned");
        pruned
    }
}
