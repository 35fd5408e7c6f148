//! Liquidation and seizure

use ironbank_core::{AccountId, Amount, MarketId};
use ironbank_events::ProtocolEvent;

use super::Protocol;
use crate::error::LendingError;

/// Outcome of a liquidation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Liquidation {
    pub repay_amount: Amount,
    pub seize_tokens: Amount,
}

impl Protocol {
    /// Repay part of `borrower`'s debt in `borrowed` and seize claim tokens
    /// of `collateral` at a discount.
    pub fn liquidate_borrow(
        &mut self,
        liquidator: &AccountId,
        borrower: &AccountId,
        borrowed: &MarketId,
        repay_amount: Amount,
        collateral: &MarketId,
    ) -> Result<Liquidation, LendingError> {
        self.atomically("liquidate_borrow", |p| {
            p.guarded(borrowed, |p| {
                p.accrue(borrowed)?;
                p.accrue(collateral)?;
                p.liquidate_fresh_inner(liquidator, borrower, borrowed, repay_amount, collateral)
            })
        })
    }

    /// Liquidate without accruing either market first
    pub fn liquidate_borrow_fresh(
        &mut self,
        liquidator: &AccountId,
        borrower: &AccountId,
        borrowed: &MarketId,
        repay_amount: Amount,
        collateral: &MarketId,
    ) -> Result<Liquidation, LendingError> {
        self.atomically("liquidate_borrow", |p| {
            p.guarded(borrowed, |p| {
                p.liquidate_fresh_inner(liquidator, borrower, borrowed, repay_amount, collateral)
            })
        })
    }

    fn liquidate_fresh_inner(
        &mut self,
        liquidator: &AccountId,
        borrower: &AccountId,
        borrowed: &MarketId,
        repay_amount: Amount,
        collateral: &MarketId,
    ) -> Result<Liquidation, LendingError> {
        if liquidator == borrower {
            return Err(LendingError::LiquidatorIsBorrower);
        }
        if repay_amount.is_zero() || repay_amount == Amount::MAX {
            return Err(LendingError::InvalidRepayAmount);
        }

        {
            let oracle = &*self.oracle;
            let s = &self.state;
            s.comptroller.liquidate_borrow_allowed(
                borrowed,
                collateral,
                liquidator,
                borrower,
                repay_amount,
                s.block,
                &s.book,
                oracle,
            )?;
            s.book.get(borrowed)?.require_fresh(s.block)?;
            s.book.get(collateral)?.require_fresh(s.block)?;
        }

        let repaid = self
            .repay_fresh_inner(liquidator, borrower, borrowed, repay_amount)?
            .amount;

        let seize_tokens = {
            let oracle = &*self.oracle;
            let s = &self.state;
            let seize_tokens = s
                .comptroller
                .liquidate_calculate_seize_tokens(borrowed, collateral, repaid, &s.book, oracle)?;
            let available = s.book.get(collateral)?.balance_of(borrower);
            if available < seize_tokens {
                return Err(LendingError::SeizeTooMuch {
                    available: available.to_string(),
                    required: seize_tokens.to_string(),
                });
            }
            seize_tokens
        };

        if collateral == borrowed {
            self.seize_inner(collateral, borrowed, liquidator, borrower, seize_tokens, repaid)?;
        } else {
            self.guarded(collateral, |p| {
                p.seize_inner(collateral, borrowed, liquidator, borrower, seize_tokens, repaid)
            })?;
        }

        tracing::info!(
            borrowed = %borrowed,
            collateral = %collateral,
            liquidator = %liquidator,
            borrower = %borrower,
            repay = %repaid,
            seize = %seize_tokens,
            "Liquidated"
        );
        self.state.events.emit(ProtocolEvent::LiquidateBorrow {
            market: borrowed.clone(),
            liquidator: liquidator.clone(),
            borrower: borrower.clone(),
            repay_amount: repaid,
            collateral_market: collateral.clone(),
            seize_tokens,
        });
        Ok(Liquidation {
            repay_amount: repaid,
            seize_tokens,
        })
    }

    /// Move `seize_tokens` of `collateral` from the borrower to the liquidator
    fn seize_inner(
        &mut self,
        collateral: &MarketId,
        borrowed: &MarketId,
        liquidator: &AccountId,
        borrower: &AccountId,
        seize_tokens: Amount,
        repaid: Amount,
    ) -> Result<(), LendingError> {
        let oracle = &*self.oracle;
        let s = &mut self.state;
        s.comptroller
            .seize_allowed(collateral, borrowed, liquidator, borrower, repaid, &s.book, oracle)?;

        let liquidator_is_member = s.comptroller.is_member(liquidator, collateral);
        s.book.get_mut(collateral)?.apply_transfer(
            borrower,
            liquidator,
            seize_tokens,
            liquidator_is_member,
            &mut s.events,
        )?;

        s.events.emit(ProtocolEvent::Transfer {
            market: collateral.clone(),
            from: borrower.clone(),
            to: liquidator.clone(),
            tokens: seize_tokens,
        });
        Ok(())
    }
}
