//! Market ledger
//!
//! One market's accounting: cash, borrows, reserves, claim-token supply,
//! the borrow index and every account's position. Methods here only move
//! numbers; risk checks and underlying transfers are sequenced around them by
//! the protocol.

use std::collections::BTreeMap;

use ironbank_core::{div_scalar_by_exp_truncate, AccountId, Amount, AssetId, Exp, MarketId, MarketVersion};
use ironbank_events::{EventLog, ProtocolEvent};
use ironbank_risk::{AccountSnapshot, MarketTotals};
use serde::{Deserialize, Serialize};

use crate::config::LedgerLimits;
use crate::error::LendingError;
use crate::guard::ReentrancyGuard;
use crate::rate_model::{InterestRateModel, RateModel};
use crate::state::{AccountPosition, BorrowSnapshot, LedgerState};
use crate::variant::Variant;

/// Parameters for creating a market ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSpec {
    pub id: MarketId,
    pub underlying: AssetId,
    pub version: MarketVersion,
    pub rate_model: RateModel,
    pub initial_exchange_rate: Exp,
    pub reserve_factor: Exp,
}

/// Result of a borrow or repay: the account's and the market's new debt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebtUpdate {
    pub amount: Amount,
    pub account_borrows: Amount,
    pub total_borrows: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    id: MarketId,
    underlying: AssetId,
    variant: Variant,
    state: LedgerState,
    accounts: BTreeMap<AccountId, AccountPosition>,
    rate_model: RateModel,
    /// Comptroller association tag
    comptroller: String,
    /// Accounts whose debt does not count toward utilization
    #[serde(default)]
    rate_exclusions: Vec<AccountId>,
    #[serde(skip)]
    pub(crate) guard: ReentrancyGuard,
}

impl Market {
    pub fn new(spec: MarketSpec, comptroller: impl Into<String>, block: u64) -> Self {
        Self {
            id: spec.id,
            underlying: spec.underlying,
            variant: Variant::new(spec.version),
            state: LedgerState::new(spec.initial_exchange_rate, spec.reserve_factor, block),
            accounts: BTreeMap::new(),
            rate_model: spec.rate_model,
            comptroller: comptroller.into(),
            rate_exclusions: Vec::new(),
            guard: ReentrancyGuard::default(),
        }
    }

    // === Views ===

    pub fn id(&self) -> &MarketId {
        &self.id
    }

    pub fn underlying(&self) -> &AssetId {
        &self.underlying
    }

    pub fn version(&self) -> MarketVersion {
        self.variant.version()
    }

    pub fn variant(&self) -> &Variant {
        &self.variant
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn rate_model(&self) -> &RateModel {
        &self.rate_model
    }

    pub fn comptroller(&self) -> &str {
        &self.comptroller
    }

    pub fn guard(&self) -> ReentrancyGuard {
        self.guard
    }

    pub fn rate_exclusions(&self) -> &[AccountId] {
        &self.rate_exclusions
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, &AccountPosition)> {
        self.accounts.iter()
    }

    pub fn position(&self, account: &AccountId) -> AccountPosition {
        self.accounts.get(account).cloned().unwrap_or_default()
    }

    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.accounts.get(account).map(|p| p.tokens).unwrap_or(Amount::ZERO)
    }

    pub fn collateral_tokens_of(&self, account: &AccountId) -> Amount {
        self.accounts
            .get(account)
            .map(|p| self.variant.accounting().collateral_tokens(p))
            .unwrap_or(Amount::ZERO)
    }

    /// `(cash + borrows - reserves) / supply`, or the initial rate while empty
    pub fn exchange_rate_stored(&self) -> Result<Exp, LendingError> {
        if self.state.total_supply.is_zero() {
            return Ok(self.state.initial_exchange_rate);
        }
        Ok(Exp::from_ratio(self.state.supplied()?, self.state.total_supply)?)
    }

    /// Borrow balance at the stored borrow index
    pub fn borrow_balance_stored(&self, account: &AccountId) -> Result<Amount, LendingError> {
        let snapshot = match self.accounts.get(account) {
            Some(position) => position.borrow,
            None => return Ok(Amount::ZERO),
        };
        if snapshot.principal.is_zero() {
            return Ok(Amount::ZERO);
        }
        let scaled = snapshot
            .principal
            .checked_mul(Amount::from_raw(self.state.borrow_index.mantissa()))?;
        Ok(scaled.checked_div(Amount::from_raw(snapshot.interest_index.mantissa()))?)
    }

    /// Underlying value of the account's tokens at the stored rate
    pub fn balance_of_underlying(&self, account: &AccountId) -> Result<Amount, LendingError> {
        Ok(self
            .exchange_rate_stored()?
            .mul_scalar_truncate(self.balance_of(account))?)
    }

    /// Borrows the rate model sees
    fn rate_base_borrows(&self) -> Result<Amount, LendingError> {
        let mut excluded = Amount::ZERO;
        for account in &self.rate_exclusions {
            excluded = excluded.checked_add(self.borrow_balance_stored(account)?)?;
        }
        Ok(self.state.total_borrows.saturating_sub(excluded))
    }

    pub fn borrow_rate_per_block(&self) -> Result<Exp, LendingError> {
        if !self.version().accrues_interest() {
            return Ok(Exp::ZERO);
        }
        let borrows = self.rate_base_borrows()?;
        Ok(self
            .rate_model
            .borrow_rate(self.state.cash, borrows, self.state.total_reserves)?)
    }

    pub fn supply_rate_per_block(&self) -> Result<Exp, LendingError> {
        if !self.version().accrues_interest() {
            return Ok(Exp::ZERO);
        }
        let borrows = self.rate_base_borrows()?;
        Ok(self.rate_model.supply_rate(
            self.state.cash,
            borrows,
            self.state.total_reserves,
            self.state.reserve_factor,
        )?)
    }

    pub fn account_snapshot(&self, account: &AccountId) -> Result<AccountSnapshot, LendingError> {
        Ok(AccountSnapshot {
            collateral_tokens: self.collateral_tokens_of(account),
            borrow_balance: self.borrow_balance_stored(account)?,
            exchange_rate: self.exchange_rate_stored()?,
        })
    }

    pub fn totals(&self) -> Result<MarketTotals, LendingError> {
        Ok(MarketTotals {
            supplied: self.state.supplied()?,
            total_borrows: self.state.total_borrows,
            exchange_rate: self.exchange_rate_stored()?,
            accrual_block: self.state.accrual_block,
            comptroller: self.comptroller.clone(),
        })
    }

    pub fn is_fresh(&self, current_block: u64) -> bool {
        self.state.accrual_block == current_block
    }

    pub fn require_fresh(&self, current_block: u64) -> Result<(), LendingError> {
        if !self.is_fresh(current_block) {
            return Err(LendingError::MarketStale {
                market: self.id.clone(),
                accrual_block: self.state.accrual_block,
                current_block,
            });
        }
        Ok(())
    }

    // === Interest ===

    /// Bring borrows, reserves and the borrow index up to `current_block`.
    ///
    /// A no-op when already accrued this block.
    pub fn accrue_interest(
        &mut self,
        current_block: u64,
        limits: &LedgerLimits,
        events: &mut EventLog,
    ) -> Result<(), LendingError> {
        let prior_block = self.state.accrual_block;
        if prior_block == current_block {
            return Ok(());
        }
        let block_delta = current_block.checked_sub(prior_block).ok_or_else(|| {
            LendingError::InvalidInput(format!(
                "block {} precedes last accrual {}",
                current_block, prior_block
            ))
        })?;

        if !self.version().accrues_interest() {
            self.state.accrual_block = current_block;
            return Ok(());
        }

        let cash_prior = self.state.cash;
        let borrow_rate = self.borrow_rate_per_block()?;
        if borrow_rate > limits.borrow_rate_max {
            return Err(LendingError::BorrowRateTooHigh {
                rate: borrow_rate.to_string(),
                max: limits.borrow_rate_max.to_string(),
            });
        }

        let simple_interest_factor = borrow_rate.mul_scalar(Amount::from(block_delta))?;
        let interest_accumulated = simple_interest_factor.mul_scalar_truncate(self.state.total_borrows)?;
        let total_borrows = interest_accumulated.checked_add(self.state.total_borrows)?;
        let total_reserves = self
            .state
            .reserve_factor
            .mul_scalar_truncate_add(interest_accumulated, self.state.total_reserves)?;
        let index_prior = Amount::from_raw(self.state.borrow_index.mantissa());
        let borrow_index = simple_interest_factor.mul_scalar_truncate_add(index_prior, index_prior)?;

        self.state.accrual_block = current_block;
        self.state.borrow_index = Exp::from_mantissa(borrow_index.raw());
        self.state.total_borrows = total_borrows;
        self.state.total_reserves = total_reserves;

        tracing::debug!(
            market = %self.id,
            blocks = block_delta,
            interest = %interest_accumulated,
            total_borrows = %total_borrows,
            "Interest accrued"
        );
        events.emit(ProtocolEvent::AccrueInterest {
            market: self.id.clone(),
            cash_prior,
            interest_accumulated,
            borrow_index: self.state.borrow_index,
            total_borrows,
        });
        Ok(())
    }

    // === Token accounting ===

    fn position_mut(&mut self, account: &AccountId) -> &mut AccountPosition {
        self.accounts.entry(account.clone()).or_default()
    }

    fn prune(&mut self, account: &AccountId) {
        if self.accounts.get(account).is_some_and(AccountPosition::is_empty) {
            self.accounts.remove(account);
        }
    }

    fn publish_collateral(&self, account: &AccountId, changed: Option<Amount>, events: &mut EventLog) {
        if let Some(collateral) = changed {
            events.emit(ProtocolEvent::user_collateral_changed(&self.id, account, collateral));
        }
    }

    fn credit_tokens(
        &mut self,
        account: &AccountId,
        tokens: Amount,
        is_member: bool,
        events: &mut EventLog,
    ) -> Result<(), LendingError> {
        let mut position = self.accounts.remove(account).unwrap_or_default();
        let changed = self
            .variant
            .accounting_mut()
            .credit(&mut position, tokens, is_member);
        self.accounts.insert(account.clone(), position);
        self.publish_collateral(account, changed?, events);
        Ok(())
    }

    fn debit_tokens(&mut self, account: &AccountId, tokens: Amount, events: &mut EventLog) -> Result<(), LendingError> {
        let available = self.balance_of(account);
        if available < tokens {
            return Err(LendingError::InsufficientTokens {
                market: self.id.clone(),
                account: account.clone(),
                available: available.to_string(),
                required: tokens.to_string(),
            });
        }
        let mut position = self.accounts.remove(account).unwrap_or_default();
        let changed = self.variant.accounting_mut().debit(&mut position, tokens);
        self.accounts.insert(account.clone(), position);
        self.prune(account);
        self.publish_collateral(account, changed?, events);
        Ok(())
    }

    /// Part of a debit of `tokens` from `account` that is collateral
    pub fn collateral_to_burn(&self, account: &AccountId, tokens: Amount) -> Result<Amount, LendingError> {
        let position = self.position(account);
        Ok(self.variant.accounting().collateral_to_burn(&position, tokens)?)
    }

    pub fn register_collateral(&mut self, account: &AccountId) -> Result<Option<Amount>, LendingError> {
        let mut position = self.accounts.remove(account).unwrap_or_default();
        let changed = self.variant.accounting_mut().register_collateral(&mut position);
        self.accounts.insert(account.clone(), position);
        self.prune(account);
        Ok(changed?)
    }

    pub fn unregister_collateral(&mut self, account: &AccountId) -> Result<Option<Amount>, LendingError> {
        let mut position = self.accounts.remove(account).unwrap_or_default();
        let changed = self.variant.accounting_mut().unregister_collateral(&mut position);
        self.accounts.insert(account.clone(), position);
        self.prune(account);
        Ok(changed?)
    }

    fn require_cash(&self, amount: Amount) -> Result<(), LendingError> {
        if self.state.cash < amount {
            return Err(LendingError::InsufficientCash {
                market: self.id.clone(),
                available: self.state.cash.to_string(),
                required: amount.to_string(),
            });
        }
        Ok(())
    }

    // === Fresh mutations ===

    /// Book `mint_amount` of received underlying; returns tokens minted
    pub fn apply_mint(
        &mut self,
        minter: &AccountId,
        mint_amount: Amount,
        is_member: bool,
        events: &mut EventLog,
    ) -> Result<Amount, LendingError> {
        let exchange_rate = self.exchange_rate_stored()?;
        let mint_tokens = div_scalar_by_exp_truncate(mint_amount, exchange_rate)?;

        self.state.total_supply = self.state.total_supply.checked_add(mint_tokens)?;
        self.state.cash = self.state.cash.checked_add(mint_amount)?;
        self.credit_tokens(minter, mint_tokens, is_member, events)?;
        Ok(mint_tokens)
    }

    /// Resolve a redeem request to `(tokens, amount)`.
    ///
    /// Exactly one of the inputs must be non-zero.
    pub fn redeem_amounts(&self, redeem_tokens: Amount, redeem_amount: Amount) -> Result<(Amount, Amount), LendingError> {
        if redeem_tokens.is_zero() == redeem_amount.is_zero() {
            return Err(LendingError::InvalidRedeemInput);
        }
        let exchange_rate = self.exchange_rate_stored()?;
        if redeem_tokens.is_zero() {
            let tokens = div_scalar_by_exp_truncate(redeem_amount, exchange_rate)?;
            Ok((tokens, redeem_amount))
        } else {
            let amount = exchange_rate.mul_scalar_truncate(redeem_tokens)?;
            Ok((redeem_tokens, amount))
        }
    }

    /// Burn `redeem_tokens` and release `redeem_amount` of cash
    pub fn apply_redeem(
        &mut self,
        redeemer: &AccountId,
        redeem_tokens: Amount,
        redeem_amount: Amount,
        events: &mut EventLog,
    ) -> Result<(), LendingError> {
        self.require_cash(redeem_amount)?;
        self.debit_tokens(redeemer, redeem_tokens, events)?;
        self.state.total_supply = self.state.total_supply.checked_sub(redeem_tokens)?;
        self.state.cash = self.state.cash.checked_sub(redeem_amount)?;
        Ok(())
    }

    pub fn apply_borrow(&mut self, borrower: &AccountId, borrow_amount: Amount) -> Result<DebtUpdate, LendingError> {
        self.require_cash(borrow_amount)?;
        let account_borrows = self.borrow_balance_stored(borrower)?.checked_add(borrow_amount)?;
        let total_borrows = self.state.total_borrows.checked_add(borrow_amount)?;

        let borrow_index = self.state.borrow_index;
        self.position_mut(borrower).borrow = BorrowSnapshot {
            principal: account_borrows,
            interest_index: borrow_index,
        };
        self.state.total_borrows = total_borrows;
        self.state.cash = self.state.cash.checked_sub(borrow_amount)?;

        Ok(DebtUpdate {
            amount: borrow_amount,
            account_borrows,
            total_borrows,
        })
    }

    /// Amount a repay request settles; `Amount::MAX` means the whole balance
    pub fn repay_amount(&self, borrower: &AccountId, requested: Amount) -> Result<Amount, LendingError> {
        if requested == Amount::MAX {
            self.borrow_balance_stored(borrower)
        } else {
            Ok(requested)
        }
    }

    /// Book `repay_amount` of received underlying against the borrower's debt
    pub fn apply_repay(&mut self, borrower: &AccountId, repay_amount: Amount) -> Result<DebtUpdate, LendingError> {
        let account_borrows = self.borrow_balance_stored(borrower)?.checked_sub(repay_amount)?;
        let total_borrows = self.state.total_borrows.checked_sub(repay_amount)?;

        let borrow_index = self.state.borrow_index;
        self.position_mut(borrower).borrow = BorrowSnapshot {
            principal: account_borrows,
            interest_index: borrow_index,
        };
        self.prune(borrower);
        self.state.total_borrows = total_borrows;
        self.state.cash = self.state.cash.checked_add(repay_amount)?;

        Ok(DebtUpdate {
            amount: repay_amount,
            account_borrows,
            total_borrows,
        })
    }

    /// Move tokens between accounts; the receiver gains collateral if a member
    pub fn apply_transfer(
        &mut self,
        src: &AccountId,
        dst: &AccountId,
        tokens: Amount,
        dst_is_member: bool,
        events: &mut EventLog,
    ) -> Result<(), LendingError> {
        if src == dst {
            return Err(LendingError::SelfTransfer);
        }
        self.debit_tokens(src, tokens, events)?;
        self.credit_tokens(dst, tokens, dst_is_member, events)
    }

    // === Flashloans ===

    /// Lend `amount` out of cash for the duration of a callback. The amount
    /// is parked in borrows so the exchange rate does not move.
    pub fn lend_flashloan(&mut self, amount: Amount) -> Result<(), LendingError> {
        self.require_cash(amount)?;
        self.state.cash = self.state.cash.checked_sub(amount)?;
        self.state.total_borrows = self.state.total_borrows.checked_add(amount)?;
        Ok(())
    }

    /// Take back a flashloan and book its fee
    pub fn settle_flashloan(&mut self, amount: Amount, total_fee: Amount, reserves_fee: Amount) -> Result<(), LendingError> {
        self.state.total_borrows = self.state.total_borrows.checked_sub(amount)?;
        self.state.cash = self.state.cash.checked_add(amount)?.checked_add(total_fee)?;
        self.state.total_reserves = self.state.total_reserves.checked_add(reserves_fee)?;
        Ok(())
    }

    // === Reserves and parameters ===

    pub fn add_reserves(&mut self, amount: Amount) -> Result<Amount, LendingError> {
        self.state.cash = self.state.cash.checked_add(amount)?;
        self.state.total_reserves = self.state.total_reserves.checked_add(amount)?;
        Ok(self.state.total_reserves)
    }

    pub fn reduce_reserves(&mut self, amount: Amount) -> Result<Amount, LendingError> {
        self.require_cash(amount)?;
        if self.state.total_reserves < amount {
            return Err(LendingError::InsufficientReserves {
                market: self.id.clone(),
                available: self.state.total_reserves.to_string(),
                required: amount.to_string(),
            });
        }
        self.state.cash = self.state.cash.checked_sub(amount)?;
        self.state.total_reserves = self.state.total_reserves.checked_sub(amount)?;
        Ok(self.state.total_reserves)
    }

    /// Returns the previous factor
    pub fn set_reserve_factor(&mut self, new_factor: Exp, limits: &LedgerLimits) -> Result<Exp, LendingError> {
        if new_factor > limits.reserve_factor_max {
            return Err(LendingError::InvalidReserveFactor {
                factor: new_factor.to_string(),
                max: limits.reserve_factor_max.to_string(),
            });
        }
        Ok(std::mem::replace(&mut self.state.reserve_factor, new_factor))
    }

    pub fn set_rate_model(&mut self, model: RateModel) {
        self.rate_model = model;
    }

    /// Returns the previous tag
    pub fn set_comptroller(&mut self, comptroller: impl Into<String>) -> String {
        std::mem::replace(&mut self.comptroller, comptroller.into())
    }

    pub fn set_collateral_cap(&mut self, cap: Amount) -> Result<(), LendingError> {
        match self.variant.capped_mut() {
            Some(capped) => {
                capped.collateral_cap = cap;
                Ok(())
            }
            None => Err(LendingError::InvalidInput(format!("{} has no collateral cap", self.id))),
        }
    }

    pub fn set_rate_exclusions(&mut self, accounts: Vec<AccountId>) {
        self.rate_exclusions = accounts;
    }
}
