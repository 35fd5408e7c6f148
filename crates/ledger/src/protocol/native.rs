//! Native-asset entry points for wrapped-native markets
//!
//! The native asset is wrapped 1:1 into the market's underlying on the way
//! in and unwrapped on the way out.

use ironbank_core::{AccountId, Amount, AssetId, MarketId, MarketVersion};

use super::Protocol;
use crate::error::LendingError;
use crate::market::DebtUpdate;

impl Protocol {
    fn wrapped_asset(&self, market: &MarketId) -> Result<AssetId, LendingError> {
        let ledger = self.state.book.get(market)?;
        if ledger.version() != MarketVersion::WrappedNative {
            return Err(LendingError::NativeNotSupported {
                market: market.clone(),
            });
        }
        Ok(ledger.underlying().clone())
    }

    pub fn mint_native(&mut self, minter: &AccountId, market: &MarketId, amount: Amount) -> Result<Amount, LendingError> {
        self.atomically("mint_native", |p| {
            let wrapped = p.wrapped_asset(market)?;
            p.state.bank.wrap(&wrapped, minter, amount)?;
            p.guarded(market, |p| {
                p.accrue(market)?;
                p.mint_fresh_inner(minter, market, amount)
            })
        })
    }

    /// Burn tokens and receive native; returns the native amount
    pub fn redeem_native(&mut self, redeemer: &AccountId, market: &MarketId, redeem_tokens: Amount) -> Result<Amount, LendingError> {
        self.atomically("redeem_native", |p| {
            let wrapped = p.wrapped_asset(market)?;
            let (_, amount) = p.guarded(market, |p| {
                p.accrue(market)?;
                p.redeem_fresh_inner(redeemer, market, redeem_tokens, Amount::ZERO)
            })?;
            p.state.bank.unwrap_native(&wrapped, redeemer, amount)?;
            Ok(amount)
        })
    }

    /// Withdraw exactly `amount` of native; returns the tokens burned
    pub fn redeem_underlying_native(
        &mut self,
        redeemer: &AccountId,
        market: &MarketId,
        amount: Amount,
    ) -> Result<Amount, LendingError> {
        self.atomically("redeem_underlying_native", |p| {
            let wrapped = p.wrapped_asset(market)?;
            let (tokens, _) = p.guarded(market, |p| {
                p.accrue(market)?;
                p.redeem_fresh_inner(redeemer, market, Amount::ZERO, amount)
            })?;
            p.state.bank.unwrap_native(&wrapped, redeemer, amount)?;
            Ok(tokens)
        })
    }

    pub fn borrow_native(&mut self, borrower: &AccountId, market: &MarketId, amount: Amount) -> Result<DebtUpdate, LendingError> {
        self.atomically("borrow_native", |p| {
            let wrapped = p.wrapped_asset(market)?;
            let update = p.guarded(market, |p| {
                p.accrue(market)?;
                p.borrow_fresh_inner(borrower, market, amount)
            })?;
            p.state.bank.unwrap_native(&wrapped, borrower, amount)?;
            Ok(update)
        })
    }

    /// Repay own debt with native; `Amount::MAX` repays all of it
    pub fn repay_borrow_native(
        &mut self,
        borrower: &AccountId,
        market: &MarketId,
        amount: Amount,
    ) -> Result<DebtUpdate, LendingError> {
        self.atomically("repay_borrow_native", |p| {
            let wrapped = p.wrapped_asset(market)?;
            p.guarded(market, |p| {
                p.accrue(market)?;
                let actual = p.state.book.get(market)?.repay_amount(borrower, amount)?;
                p.state.bank.wrap(&wrapped, borrower, actual)?;
                p.repay_fresh_inner(borrower, borrower, market, actual)
            })
        })
    }
}
