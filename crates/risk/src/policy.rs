//! Pre-action policy checks
//!
//! Every ledger action asks one of these before mutating anything. Pause
//! flags are consulted before any other condition.

use ironbank_core::{AccountId, Amount, MarketId, PauseAction};
use ironbank_events::EventLog;
use ironbank_oracle::PriceOracle;

use crate::engine::Comptroller;
use crate::error::RiskError;
use crate::ledgers::MarketLedgers;
use crate::liquidity::Adjustment;
use crate::registry::MarketInfo;

impl Comptroller {
    fn market_info(&self, market: &MarketId) -> Result<&MarketInfo, RiskError> {
        self.registry
            .get(market)
            .ok_or_else(|| RiskError::MarketNotListed {
                market: market.clone(),
            })
    }

    fn check_market_pause(&self, market: &MarketId, action: PauseAction) -> Result<(), RiskError> {
        if self.market_info(market)?.is_paused(action) {
            return Err(RiskError::ActionPaused {
                action,
                market: Some(market.clone()),
            });
        }
        Ok(())
    }

    fn check_global_pause(&self, action: PauseAction) -> Result<(), RiskError> {
        let paused = match action {
            PauseAction::Transfer => self.params.transfer_paused,
            PauseAction::Seize => self.params.seize_paused,
            _ => false,
        };
        if paused {
            return Err(RiskError::ActionPaused {
                action,
                market: None,
            });
        }
        Ok(())
    }

    /// May `minter` supply `mint_amount` of underlying to `market`?
    pub fn mint_allowed(
        &self,
        market: &MarketId,
        minter: &AccountId,
        mint_amount: Amount,
        ledgers: &dyn MarketLedgers,
    ) -> Result<(), RiskError> {
        self.check_market_pause(market, PauseAction::Mint)?;
        let info = self.registry.listed(market)?;

        // Zero cap means unlimited
        if !info.supply_cap.is_zero() {
            let supplied = ledgers.market_totals(market)?.supplied;
            if supplied.checked_add(mint_amount)? > info.supply_cap {
                return Err(RiskError::SupplyCapReached {
                    market: market.clone(),
                });
            }
        }

        tracing::debug!(market = %market, minter = %minter, amount = %mint_amount, "Mint allowed");
        Ok(())
    }

    /// A non-zero mint must produce tokens
    pub fn verify_mint(&self, mint_amount: Amount, mint_tokens: Amount) -> Result<(), RiskError> {
        if mint_tokens.is_zero() && !mint_amount.is_zero() {
            return Err(RiskError::MintTokensZero);
        }
        Ok(())
    }

    /// May `redeemer` give up `redeem_tokens` of collateral in `market`?
    pub fn redeem_allowed(
        &self,
        market: &MarketId,
        redeemer: &AccountId,
        redeem_tokens: Amount,
        ledgers: &dyn MarketLedgers,
        oracle: &dyn PriceOracle,
    ) -> Result<(), RiskError> {
        self.registry.reachable(market)?;

        // Tokens outside the entered set never back a borrow
        if !self.membership.is_member(redeemer, market) {
            return Ok(());
        }

        let after = self.liquidity_with(
            redeemer,
            Some(Adjustment {
                market,
                redeem_tokens,
                borrow_amount: Amount::ZERO,
                repaid_amount: Amount::ZERO,
            }),
            ledgers,
            oracle,
        )?;
        if after.has_shortfall() {
            return Err(RiskError::InsufficientLiquidity {
                shortfall: after.shortfall.to_string(),
            });
        }
        Ok(())
    }

    /// A non-zero payout must burn tokens
    pub fn verify_redeem(&self, redeem_amount: Amount, redeem_tokens: Amount) -> Result<(), RiskError> {
        if redeem_tokens.is_zero() && !redeem_amount.is_zero() {
            return Err(RiskError::RedeemTokensZero);
        }
        Ok(())
    }

    /// May `borrower` borrow `borrow_amount` from `market`?
    ///
    /// Enters the market on the borrower's behalf. Credit accounts are held
    /// to their credit limit instead of the collateral test.
    pub fn borrow_allowed(
        &mut self,
        market: &MarketId,
        borrower: &AccountId,
        borrow_amount: Amount,
        ledgers: &mut dyn MarketLedgers,
        oracle: &dyn PriceOracle,
        events: &mut EventLog,
    ) -> Result<(), RiskError> {
        self.check_market_pause(market, PauseAction::Borrow)?;
        self.registry.listed(market)?;

        if !self.membership.is_member(borrower, market) {
            self.add_to_market(borrower, market, ledgers, events)?;
        }

        oracle.nonzero_price(market)?;

        let info = self.registry.listed(market)?;
        if !info.borrow_cap.is_zero() {
            let total_borrows = ledgers.market_totals(market)?.total_borrows;
            if total_borrows.checked_add(borrow_amount)? > info.borrow_cap {
                return Err(RiskError::BorrowCapReached {
                    market: market.clone(),
                });
            }
        }

        let credit_limit = self.credit_limit(borrower, market);
        if !credit_limit.is_zero() {
            let borrowed = ledgers.account_snapshot(market, borrower)?.borrow_balance;
            if borrowed.checked_add(borrow_amount)? > credit_limit {
                return Err(RiskError::CreditLimitExceeded {
                    account: borrower.clone(),
                    market: market.clone(),
                });
            }
            tracing::debug!(market = %market, borrower = %borrower, "Borrow allowed on credit");
            return Ok(());
        }

        let after = self.liquidity_with(
            borrower,
            Some(Adjustment {
                market,
                redeem_tokens: Amount::ZERO,
                borrow_amount,
                repaid_amount: Amount::ZERO,
            }),
            &*ledgers,
            oracle,
        )?;
        if after.has_shortfall() {
            return Err(RiskError::InsufficientLiquidity {
                shortfall: after.shortfall.to_string(),
            });
        }

        tracing::debug!(market = %market, borrower = %borrower, amount = %borrow_amount, "Borrow allowed");
        Ok(())
    }

    /// May `payer` repay `borrower`'s debt in `market`?
    pub fn repay_borrow_allowed(
        &self,
        market: &MarketId,
        payer: &AccountId,
        borrower: &AccountId,
    ) -> Result<(), RiskError> {
        let info = self.registry.reachable(market)?;
        if info.version.checks_credit_repay()
            && payer != borrower
            && self.is_credit_account(borrower, market)
        {
            return Err(RiskError::CreditAccountRepay {
                borrower: borrower.clone(),
            });
        }
        Ok(())
    }

    /// May `liquidator` repay `repay_amount` of `borrower`'s debt in
    /// `borrowed`, seizing collateral in `collateral`?
    #[allow(clippy::too_many_arguments)]
    pub fn liquidate_borrow_allowed(
        &self,
        borrowed: &MarketId,
        collateral: &MarketId,
        liquidator: &AccountId,
        borrower: &AccountId,
        repay_amount: Amount,
        current_block: u64,
        ledgers: &dyn MarketLedgers,
        oracle: &dyn PriceOracle,
    ) -> Result<(), RiskError> {
        if self.is_credit_account(borrower, borrowed) {
            return Err(RiskError::CreditAccountLiquidation {
                borrower: borrower.clone(),
            });
        }
        self.registry.reachable(borrowed)?;
        self.registry.reachable(collateral)?;

        for market in [borrowed, collateral] {
            if ledgers.market_totals(market)?.accrual_block != current_block {
                return Err(RiskError::MarketStale {
                    market: market.clone(),
                });
            }
        }

        let current = self.account_liquidity(borrower, ledgers, oracle)?;
        if !current.has_shortfall() {
            return Err(RiskError::InsufficientShortfall {
                borrower: borrower.clone(),
            });
        }

        let borrow_balance = ledgers.account_snapshot(borrowed, borrower)?.borrow_balance;
        let max_close = self.params.close_factor.mul_scalar_truncate(borrow_balance)?;
        if repay_amount > max_close {
            return Err(RiskError::TooMuchRepay {
                repay: repay_amount.to_string(),
                max_close: max_close.to_string(),
            });
        }

        tracing::debug!(
            borrowed = %borrowed,
            collateral = %collateral,
            liquidator = %liquidator,
            borrower = %borrower,
            repay = %repay_amount,
            "Liquidation allowed"
        );
        Ok(())
    }

    /// May collateral be seized from `borrower` after `repaid_amount` was
    /// repaid on their behalf in `borrowed`?
    ///
    /// Re-checks the shortfall as it stood before the repayment, so a nested
    /// call that cured the borrower mid-liquidation makes the seize fail.
    /// The repaid amount is added back to the borrow balance and priced
    /// together with it.
    #[allow(clippy::too_many_arguments)]
    pub fn seize_allowed(
        &self,
        collateral: &MarketId,
        borrowed: &MarketId,
        liquidator: &AccountId,
        borrower: &AccountId,
        repaid_amount: Amount,
        ledgers: &dyn MarketLedgers,
        oracle: &dyn PriceOracle,
    ) -> Result<(), RiskError> {
        self.check_global_pause(PauseAction::Seize)?;
        if self.is_credit_account(borrower, borrowed) {
            return Err(RiskError::CreditAccountLiquidation {
                borrower: borrower.clone(),
            });
        }
        self.registry.reachable(collateral)?;
        self.registry.reachable(borrowed)?;

        let collateral_tag = ledgers.market_totals(collateral)?.comptroller;
        let borrowed_tag = ledgers.market_totals(borrowed)?.comptroller;
        if collateral_tag != borrowed_tag {
            return Err(RiskError::ComptrollerMismatch {
                borrowed: borrowed.clone(),
                collateral: collateral.clone(),
            });
        }

        let before_repay = self.liquidity_with(
            borrower,
            Some(Adjustment {
                market: borrowed,
                redeem_tokens: Amount::ZERO,
                borrow_amount: Amount::ZERO,
                repaid_amount,
            }),
            ledgers,
            oracle,
        )?;
        if !before_repay.has_shortfall() {
            return Err(RiskError::InsufficientShortfall {
                borrower: borrower.clone(),
            });
        }

        tracing::debug!(collateral = %collateral, liquidator = %liquidator, borrower = %borrower, "Seize allowed");
        Ok(())
    }

    /// May `src` move `transfer_tokens` of collateral in `market` to `dst`?
    pub fn transfer_allowed(
        &self,
        market: &MarketId,
        src: &AccountId,
        dst: &AccountId,
        transfer_tokens: Amount,
        ledgers: &dyn MarketLedgers,
        oracle: &dyn PriceOracle,
    ) -> Result<(), RiskError> {
        self.check_global_pause(PauseAction::Transfer)?;
        self.redeem_allowed(market, src, transfer_tokens, ledgers, oracle)?;
        tracing::debug!(market = %market, src = %src, dst = %dst, "Transfer allowed");
        Ok(())
    }

    /// May `receiver` take a flashloan of `amount` from `market`?
    pub fn flashloan_allowed(
        &self,
        market: &MarketId,
        receiver: &AccountId,
        amount: Amount,
    ) -> Result<(), RiskError> {
        self.check_market_pause(market, PauseAction::Flashloan)?;
        let info = self.registry.listed(market)?;
        if !info.version.supports_flashloan() {
            return Err(RiskError::FlashloanNotSupported {
                market: market.clone(),
            });
        }
        tracing::debug!(market = %market, receiver = %receiver, amount = %amount, "Flashloan allowed");
        Ok(())
    }
}
