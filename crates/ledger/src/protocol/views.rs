//! Read-only queries, plus the `*_current` variants that accrue first

use ironbank_core::{AccountId, Amount, Exp, MarketId};
use ironbank_risk::{Comptroller, Liquidity};

use super::Protocol;
use crate::error::LendingError;
use crate::market::Market;

impl Protocol {
    pub fn comptroller(&self) -> &Comptroller {
        &self.state.comptroller
    }

    pub fn market(&self, market: &MarketId) -> Result<&Market, LendingError> {
        self.state.book.get(market)
    }

    pub fn markets(&self) -> impl Iterator<Item = &Market> {
        self.state.book.markets()
    }

    /// Liquidity at stored rates and current prices
    pub fn account_liquidity(&self, account: &AccountId) -> Result<Liquidity, LendingError> {
        Ok(self
            .state
            .comptroller
            .account_liquidity(account, &self.state.book, &*self.oracle)?)
    }

    /// Liquidity as if `account` redeemed `redeem_tokens` and borrowed
    /// `borrow_amount` in `market`
    pub fn hypothetical_liquidity(
        &self,
        account: &AccountId,
        market: &MarketId,
        redeem_tokens: Amount,
        borrow_amount: Amount,
    ) -> Result<Liquidity, LendingError> {
        Ok(self.state.comptroller.hypothetical_liquidity(
            account,
            market,
            redeem_tokens,
            borrow_amount,
            &self.state.book,
            &*self.oracle,
        )?)
    }

    pub fn liquidate_calculate_seize_tokens(
        &self,
        borrowed: &MarketId,
        collateral: &MarketId,
        repay_amount: Amount,
    ) -> Result<Amount, LendingError> {
        Ok(self.state.comptroller.liquidate_calculate_seize_tokens(
            borrowed,
            collateral,
            repay_amount,
            &self.state.book,
            &*self.oracle,
        )?)
    }

    pub fn balance_of(&self, market: &MarketId, account: &AccountId) -> Result<Amount, LendingError> {
        Ok(self.market(market)?.balance_of(account))
    }

    pub fn collateral_tokens_of(&self, market: &MarketId, account: &AccountId) -> Result<Amount, LendingError> {
        Ok(self.market(market)?.collateral_tokens_of(account))
    }

    pub fn balance_of_underlying(&self, market: &MarketId, account: &AccountId) -> Result<Amount, LendingError> {
        self.market(market)?.balance_of_underlying(account)
    }

    pub fn exchange_rate_stored(&self, market: &MarketId) -> Result<Exp, LendingError> {
        self.market(market)?.exchange_rate_stored()
    }

    pub fn exchange_rate_current(&mut self, market: &MarketId) -> Result<Exp, LendingError> {
        self.accrue_interest(market)?;
        self.exchange_rate_stored(market)
    }

    pub fn borrow_balance_stored(&self, market: &MarketId, account: &AccountId) -> Result<Amount, LendingError> {
        self.market(market)?.borrow_balance_stored(account)
    }

    pub fn borrow_balance_current(&mut self, market: &MarketId, account: &AccountId) -> Result<Amount, LendingError> {
        self.accrue_interest(market)?;
        self.borrow_balance_stored(market, account)
    }

    pub fn total_borrows_current(&mut self, market: &MarketId) -> Result<Amount, LendingError> {
        self.accrue_interest(market)?;
        Ok(self.market(market)?.state().total_borrows)
    }

    pub fn cash(&self, market: &MarketId) -> Result<Amount, LendingError> {
        Ok(self.market(market)?.state().cash)
    }

    pub fn borrow_rate_per_block(&self, market: &MarketId) -> Result<Exp, LendingError> {
        self.market(market)?.borrow_rate_per_block()
    }

    pub fn supply_rate_per_block(&self, market: &MarketId) -> Result<Exp, LendingError> {
        self.market(market)?.supply_rate_per_block()
    }
}
