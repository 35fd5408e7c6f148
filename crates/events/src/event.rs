//! Protocol domain events
//!
//! Field order within each variant is part of the journal format and must
//! stay stable.

use ironbank_core::{AccountId, Amount, Exp, GuardianRole, MarketId, MarketVersion, PauseAction};
use serde::{Deserialize, Serialize};

/// Events emitted by the risk engine and the market ledgers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProtocolEvent {
    // === Market registry ===
    /// Market admitted (or re-admitted after a soft delist)
    MarketListed {
        market: MarketId,
        version: MarketVersion,
    },

    /// Market soft or hard delisted
    MarketDelisted { market: MarketId, hard: bool },

    NewCollateralFactor {
        market: MarketId,
        old_factor: Exp,
        new_factor: Exp,
    },

    NewSupplyCap { market: MarketId, new_cap: Amount },

    NewBorrowCap { market: MarketId, new_cap: Amount },

    // === Risk parameters ===
    NewCloseFactor { old_factor: Exp, new_factor: Exp },

    NewLiquidationIncentive {
        old_incentive: Exp,
        new_incentive: Exp,
    },

    /// Pause flag flipped; `market` is `None` for global actions
    ActionPaused {
        market: Option<MarketId>,
        action: PauseAction,
        paused: bool,
    },

    NewGuardian {
        role: GuardianRole,
        old_guardian: Option<AccountId>,
        new_guardian: Option<AccountId>,
    },

    CreditLimitChanged {
        account: AccountId,
        market: MarketId,
        limit: Amount,
    },

    // === Membership ===
    MarketEntered { market: MarketId, account: AccountId },

    MarketExited { market: MarketId, account: AccountId },

    // === Ledger ===
    AccrueInterest {
        market: MarketId,
        cash_prior: Amount,
        interest_accumulated: Amount,
        borrow_index: Exp,
        total_borrows: Amount,
    },

    Mint {
        market: MarketId,
        minter: AccountId,
        mint_amount: Amount,
        mint_tokens: Amount,
    },

    Redeem {
        market: MarketId,
        redeemer: AccountId,
        redeem_amount: Amount,
        redeem_tokens: Amount,
    },

    Borrow {
        market: MarketId,
        borrower: AccountId,
        borrow_amount: Amount,
        account_borrows: Amount,
        total_borrows: Amount,
    },

    RepayBorrow {
        market: MarketId,
        payer: AccountId,
        borrower: AccountId,
        repay_amount: Amount,
        account_borrows: Amount,
        total_borrows: Amount,
    },

    LiquidateBorrow {
        market: MarketId,
        liquidator: AccountId,
        borrower: AccountId,
        repay_amount: Amount,
        collateral_market: MarketId,
        seize_tokens: Amount,
    },

    Transfer {
        market: MarketId,
        from: AccountId,
        to: AccountId,
        tokens: Amount,
    },

    Flashloan {
        market: MarketId,
        receiver: AccountId,
        amount: Amount,
        total_fee: Amount,
        reserves_fee: Amount,
    },

    /// Collateral sub-balance of an account changed (collateral-capped markets)
    UserCollateralChanged {
        market: MarketId,
        account: AccountId,
        new_collateral_tokens: Amount,
    },

    NewCollateralCap { market: MarketId, new_cap: Amount },

    NewReserveFactor {
        market: MarketId,
        old_factor: Exp,
        new_factor: Exp,
    },

    ReservesAdded {
        market: MarketId,
        benefactor: AccountId,
        add_amount: Amount,
        new_total_reserves: Amount,
    },

    ReservesReduced {
        market: MarketId,
        admin: AccountId,
        reduce_amount: Amount,
        new_total_reserves: Amount,
    },

    NewInterestRateModel { market: MarketId, model: String },

    NewComptroller {
        market: MarketId,
        old_comptroller: String,
        new_comptroller: String,
    },

    RateExclusionsChanged {
        market: MarketId,
        accounts: Vec<AccountId>,
    },
}

impl ProtocolEvent {
    /// Snake-case event name, as written in the `event` tag
    pub fn name(&self) -> &'static str {
        match self {
            ProtocolEvent::MarketListed { .. } => "market_listed",
            ProtocolEvent::MarketDelisted { .. } => "market_delisted",
            ProtocolEvent::NewCollateralFactor { .. } => "new_collateral_factor",
            ProtocolEvent::NewSupplyCap { .. } => "new_supply_cap",
            ProtocolEvent::NewBorrowCap { .. } => "new_borrow_cap",
            ProtocolEvent::NewCloseFactor { .. } => "new_close_factor",
            ProtocolEvent::NewLiquidationIncentive { .. } => "new_liquidation_incentive",
            ProtocolEvent::ActionPaused { .. } => "action_paused",
            ProtocolEvent::NewGuardian { .. } => "new_guardian",
            ProtocolEvent::CreditLimitChanged { .. } => "credit_limit_changed",
            ProtocolEvent::MarketEntered { .. } => "market_entered",
            ProtocolEvent::MarketExited { .. } => "market_exited",
            ProtocolEvent::AccrueInterest { .. } => "accrue_interest",
            ProtocolEvent::Mint { .. } => "mint",
            ProtocolEvent::Redeem { .. } => "redeem",
            ProtocolEvent::Borrow { .. } => "borrow",
            ProtocolEvent::RepayBorrow { .. } => "repay_borrow",
            ProtocolEvent::LiquidateBorrow { .. } => "liquidate_borrow",
            ProtocolEvent::Transfer { .. } => "transfer",
            ProtocolEvent::Flashloan { .. } => "flashloan",
            ProtocolEvent::UserCollateralChanged { .. } => "user_collateral_changed",
            ProtocolEvent::NewCollateralCap { .. } => "new_collateral_cap",
            ProtocolEvent::NewReserveFactor { .. } => "new_reserve_factor",
            ProtocolEvent::ReservesAdded { .. } => "reserves_added",
            ProtocolEvent::ReservesReduced { .. } => "reserves_reduced",
            ProtocolEvent::NewInterestRateModel { .. } => "new_interest_rate_model",
            ProtocolEvent::NewComptroller { .. } => "new_comptroller",
            ProtocolEvent::RateExclusionsChanged { .. } => "rate_exclusions_changed",
        }
    }

    /// The market the event concerns, if any
    pub fn market(&self) -> Option<&MarketId> {
        match self {
            ProtocolEvent::NewCloseFactor { .. }
            | ProtocolEvent::NewLiquidationIncentive { .. }
            | ProtocolEvent::NewGuardian { .. } => None,
            ProtocolEvent::ActionPaused { market, .. } => market.as_ref(),
            ProtocolEvent::MarketListed { market, .. }
            | ProtocolEvent::MarketDelisted { market, .. }
            | ProtocolEvent::NewCollateralFactor { market, .. }
            | ProtocolEvent::NewSupplyCap { market, .. }
            | ProtocolEvent::NewBorrowCap { market, .. }
            | ProtocolEvent::CreditLimitChanged { market, .. }
            | ProtocolEvent::MarketEntered { market, .. }
            | ProtocolEvent::MarketExited { market, .. }
            | ProtocolEvent::AccrueInterest { market, .. }
            | ProtocolEvent::Mint { market, .. }
            | ProtocolEvent::Redeem { market, .. }
            | ProtocolEvent::Borrow { market, .. }
            | ProtocolEvent::RepayBorrow { market, .. }
            | ProtocolEvent::LiquidateBorrow { market, .. }
            | ProtocolEvent::Transfer { market, .. }
            | ProtocolEvent::Flashloan { market, .. }
            | ProtocolEvent::UserCollateralChanged { market, .. }
            | ProtocolEvent::NewCollateralCap { market, .. }
            | ProtocolEvent::NewReserveFactor { market, .. }
            | ProtocolEvent::ReservesAdded { market, .. }
            | ProtocolEvent::ReservesReduced { market, .. }
            | ProtocolEvent::NewInterestRateModel { market, .. }
            | ProtocolEvent::NewComptroller { market, .. }
            | ProtocolEvent::RateExclusionsChanged { market, .. } => Some(market),
        }
    }

    /// Create a MarketEntered event
    pub fn market_entered(market: &MarketId, account: &AccountId) -> Self {
        Self::MarketEntered {
            market: market.clone(),
            account: account.clone(),
        }
    }

    /// Create a MarketExited event
    pub fn market_exited(market: &MarketId, account: &AccountId) -> Self {
        Self::MarketExited {
            market: market.clone(),
            account: account.clone(),
        }
    }

    /// Create an ActionPaused event
    pub fn action_paused(market: Option<&MarketId>, action: PauseAction, paused: bool) -> Self {
        Self::ActionPaused {
            market: market.cloned(),
            action,
            paused,
        }
    }

    /// Create a UserCollateralChanged event
    pub fn user_collateral_changed(
        market: &MarketId,
        account: &AccountId,
        new_collateral_tokens: Amount,
    ) -> Self {
        Self::UserCollateralChanged {
            market: market.clone(),
            account: account.clone(),
            new_collateral_tokens,
        }
    }
}
