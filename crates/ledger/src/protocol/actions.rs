//! Supply, redeem, borrow, repay, transfer and membership

use ironbank_core::{AccountId, Amount, MarketId};
use ironbank_events::ProtocolEvent;

use super::Protocol;
use crate::error::LendingError;
use crate::market::DebtUpdate;

impl Protocol {
    // === Membership ===

    pub fn enter_markets(&mut self, account: &AccountId, markets: &[MarketId]) -> Result<(), LendingError> {
        self.atomically("enter_markets", |p| {
            let s = &mut p.state;
            s.comptroller
                .enter_markets(account, markets, &mut s.book, &mut s.events)?;
            Ok(())
        })
    }

    pub fn exit_market(&mut self, account: &AccountId, market: &MarketId) -> Result<(), LendingError> {
        self.atomically("exit_market", |p| {
            let oracle = &*p.oracle;
            let s = &mut p.state;
            s.comptroller
                .exit_market(account, market, &mut s.book, oracle, &mut s.events)?;
            Ok(())
        })
    }

    /// Accrue interest on `market` up to the current block.
    ///
    /// Locked like any other market action: a flashloan's parked amount must
    /// never accrue.
    pub fn accrue_interest(&mut self, market: &MarketId) -> Result<(), LendingError> {
        self.atomically("accrue_interest", |p| p.guarded(market, |p| p.accrue(market)))
    }

    // === Mint ===

    /// Supply underlying; returns the claim tokens minted
    pub fn mint(&mut self, minter: &AccountId, market: &MarketId, mint_amount: Amount) -> Result<Amount, LendingError> {
        self.atomically("mint", |p| {
            p.guarded(market, |p| {
                p.accrue(market)?;
                p.mint_fresh_inner(minter, market, mint_amount)
            })
        })
    }

    /// Mint without accruing first; fails on a stale market
    pub fn mint_fresh(&mut self, minter: &AccountId, market: &MarketId, mint_amount: Amount) -> Result<Amount, LendingError> {
        self.atomically("mint", |p| {
            p.guarded(market, |p| p.mint_fresh_inner(minter, market, mint_amount))
        })
    }

    pub(super) fn mint_fresh_inner(
        &mut self,
        minter: &AccountId,
        market: &MarketId,
        mint_amount: Amount,
    ) -> Result<Amount, LendingError> {
        let s = &mut self.state;
        s.comptroller.mint_allowed(market, minter, mint_amount, &s.book)?;

        let ledger = s.book.get_mut(market)?;
        ledger.require_fresh(s.block)?;
        s.bank
            .transfer(ledger.underlying(), minter, &market.holder(), mint_amount)?;

        let is_member = s.comptroller.is_member(minter, market);
        let mint_tokens = ledger.apply_mint(minter, mint_amount, is_member, &mut s.events)?;
        s.comptroller.verify_mint(mint_amount, mint_tokens)?;

        tracing::info!(market = %market, minter = %minter, amount = %mint_amount, tokens = %mint_tokens, "Minted");
        s.events.emit(ProtocolEvent::Mint {
            market: market.clone(),
            minter: minter.clone(),
            mint_amount,
            mint_tokens,
        });
        Ok(mint_tokens)
    }

    // === Redeem ===

    /// Burn `redeem_tokens`; returns the underlying paid out
    pub fn redeem(&mut self, redeemer: &AccountId, market: &MarketId, redeem_tokens: Amount) -> Result<Amount, LendingError> {
        self.atomically("redeem", |p| {
            p.guarded(market, |p| {
                p.accrue(market)?;
                p.redeem_fresh_inner(redeemer, market, redeem_tokens, Amount::ZERO)
            })
        })
        .map(|(_, amount)| amount)
    }

    /// Withdraw exactly `redeem_amount` of underlying; returns the tokens burned
    pub fn redeem_underlying(
        &mut self,
        redeemer: &AccountId,
        market: &MarketId,
        redeem_amount: Amount,
    ) -> Result<Amount, LendingError> {
        self.atomically("redeem_underlying", |p| {
            p.guarded(market, |p| {
                p.accrue(market)?;
                p.redeem_fresh_inner(redeemer, market, Amount::ZERO, redeem_amount)
            })
        })
        .map(|(tokens, _)| tokens)
    }

    /// Redeem without accruing first. Exactly one input must be non-zero.
    /// Returns `(tokens burned, underlying paid)`.
    pub fn redeem_fresh(
        &mut self,
        redeemer: &AccountId,
        market: &MarketId,
        redeem_tokens: Amount,
        redeem_amount: Amount,
    ) -> Result<(Amount, Amount), LendingError> {
        self.atomically("redeem", |p| {
            p.guarded(market, |p| {
                p.redeem_fresh_inner(redeemer, market, redeem_tokens, redeem_amount)
            })
        })
    }

    pub(super) fn redeem_fresh_inner(
        &mut self,
        redeemer: &AccountId,
        market: &MarketId,
        redeem_tokens_in: Amount,
        redeem_amount_in: Amount,
    ) -> Result<(Amount, Amount), LendingError> {
        let oracle = &*self.oracle;
        let s = &mut self.state;

        let ledger = s.book.get(market)?;
        let (redeem_tokens, redeem_amount) = ledger.redeem_amounts(redeem_tokens_in, redeem_amount_in)?;
        let collateral_tokens = ledger.collateral_to_burn(redeemer, redeem_tokens)?;
        s.comptroller
            .redeem_allowed(market, redeemer, collateral_tokens, &s.book, oracle)?;

        let ledger = s.book.get_mut(market)?;
        ledger.require_fresh(s.block)?;
        ledger.apply_redeem(redeemer, redeem_tokens, redeem_amount, &mut s.events)?;
        s.bank
            .transfer(ledger.underlying(), &market.holder(), redeemer, redeem_amount)?;
        s.comptroller.verify_redeem(redeem_amount, redeem_tokens)?;

        tracing::info!(market = %market, redeemer = %redeemer, amount = %redeem_amount, tokens = %redeem_tokens, "Redeemed");
        s.events.emit(ProtocolEvent::Redeem {
            market: market.clone(),
            redeemer: redeemer.clone(),
            redeem_amount,
            redeem_tokens,
        });
        Ok((redeem_tokens, redeem_amount))
    }

    // === Borrow ===

    pub fn borrow(&mut self, borrower: &AccountId, market: &MarketId, borrow_amount: Amount) -> Result<DebtUpdate, LendingError> {
        self.atomically("borrow", |p| {
            p.guarded(market, |p| {
                p.accrue(market)?;
                p.borrow_fresh_inner(borrower, market, borrow_amount)
            })
        })
    }

    /// Borrow without accruing first; fails on a stale market
    pub fn borrow_fresh(
        &mut self,
        borrower: &AccountId,
        market: &MarketId,
        borrow_amount: Amount,
    ) -> Result<DebtUpdate, LendingError> {
        self.atomically("borrow", |p| {
            p.guarded(market, |p| p.borrow_fresh_inner(borrower, market, borrow_amount))
        })
    }

    pub(super) fn borrow_fresh_inner(
        &mut self,
        borrower: &AccountId,
        market: &MarketId,
        borrow_amount: Amount,
    ) -> Result<DebtUpdate, LendingError> {
        let oracle = &*self.oracle;
        let s = &mut self.state;
        s.comptroller
            .borrow_allowed(market, borrower, borrow_amount, &mut s.book, oracle, &mut s.events)?;

        let ledger = s.book.get_mut(market)?;
        ledger.require_fresh(s.block)?;
        let update = ledger.apply_borrow(borrower, borrow_amount)?;
        s.bank
            .transfer(ledger.underlying(), &market.holder(), borrower, borrow_amount)?;

        tracing::info!(market = %market, borrower = %borrower, amount = %borrow_amount, account_borrows = %update.account_borrows, "Borrowed");
        s.events.emit(ProtocolEvent::Borrow {
            market: market.clone(),
            borrower: borrower.clone(),
            borrow_amount,
            account_borrows: update.account_borrows,
            total_borrows: update.total_borrows,
        });
        Ok(update)
    }

    // === Repay ===

    /// Repay own debt; `Amount::MAX` repays all of it
    pub fn repay_borrow(&mut self, borrower: &AccountId, market: &MarketId, repay_amount: Amount) -> Result<DebtUpdate, LendingError> {
        self.repay_borrow_behalf(borrower, borrower, market, repay_amount)
    }

    /// Repay another account's debt
    pub fn repay_borrow_behalf(
        &mut self,
        payer: &AccountId,
        borrower: &AccountId,
        market: &MarketId,
        repay_amount: Amount,
    ) -> Result<DebtUpdate, LendingError> {
        self.atomically("repay_borrow", |p| {
            p.guarded(market, |p| {
                p.accrue(market)?;
                p.repay_fresh_inner(payer, borrower, market, repay_amount)
            })
        })
    }

    /// Repay without accruing first; fails on a stale market
    pub fn repay_borrow_fresh(
        &mut self,
        payer: &AccountId,
        borrower: &AccountId,
        market: &MarketId,
        repay_amount: Amount,
    ) -> Result<DebtUpdate, LendingError> {
        self.atomically("repay_borrow", |p| {
            p.guarded(market, |p| p.repay_fresh_inner(payer, borrower, market, repay_amount))
        })
    }

    pub(super) fn repay_fresh_inner(
        &mut self,
        payer: &AccountId,
        borrower: &AccountId,
        market: &MarketId,
        repay_amount: Amount,
    ) -> Result<DebtUpdate, LendingError> {
        let s = &mut self.state;
        s.comptroller.repay_borrow_allowed(market, payer, borrower)?;

        let ledger = s.book.get_mut(market)?;
        ledger.require_fresh(s.block)?;
        let actual = ledger.repay_amount(borrower, repay_amount)?;
        s.bank
            .transfer(ledger.underlying(), payer, &market.holder(), actual)?;
        let update = ledger.apply_repay(borrower, actual)?;

        tracing::info!(market = %market, payer = %payer, borrower = %borrower, amount = %actual, account_borrows = %update.account_borrows, "Repaid");
        s.events.emit(ProtocolEvent::RepayBorrow {
            market: market.clone(),
            payer: payer.clone(),
            borrower: borrower.clone(),
            repay_amount: actual,
            account_borrows: update.account_borrows,
            total_borrows: update.total_borrows,
        });
        Ok(update)
    }

    // === Transfer ===

    /// Move claim tokens between accounts
    pub fn transfer(&mut self, src: &AccountId, dst: &AccountId, market: &MarketId, tokens: Amount) -> Result<(), LendingError> {
        self.atomically("transfer", |p| {
            p.guarded(market, |p| p.transfer_inner(src, dst, market, tokens))
        })
    }

    fn transfer_inner(&mut self, src: &AccountId, dst: &AccountId, market: &MarketId, tokens: Amount) -> Result<(), LendingError> {
        if src == dst {
            return Err(LendingError::SelfTransfer);
        }
        let oracle = &*self.oracle;
        let s = &mut self.state;

        let collateral_tokens = s.book.get(market)?.collateral_to_burn(src, tokens)?;
        s.comptroller
            .transfer_allowed(market, src, dst, collateral_tokens, &s.book, oracle)?;

        let dst_is_member = s.comptroller.is_member(dst, market);
        s.book
            .get_mut(market)?
            .apply_transfer(src, dst, tokens, dst_is_member, &mut s.events)?;

        tracing::info!(market = %market, from = %src, to = %dst, tokens = %tokens, "Transferred");
        s.events.emit(ProtocolEvent::Transfer {
            market: market.clone(),
            from: src.clone(),
            to: dst.clone(),
            tokens,
        });
        Ok(())
    }
}
