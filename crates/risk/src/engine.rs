//! Comptroller - market registry, membership and privileged setters

use ironbank_core::{AccountId, Amount, Exp, GuardianRole, MarketId, MarketVersion, PauseAction};
use ironbank_events::{EventLog, ProtocolEvent};
use ironbank_oracle::PriceOracle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::RiskConfig;
use crate::error::RiskError;
use crate::ledgers::MarketLedgers;
use crate::membership::Membership;
use crate::params::{RiskLimits, RiskParams};
use crate::registry::MarketRegistry;

/// Accounts holding guardian capabilities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guardians {
    pub pause: Option<AccountId>,
    pub supply_cap: Option<AccountId>,
    pub borrow_cap: Option<AccountId>,
}

impl Guardians {
    pub fn get(&self, role: GuardianRole) -> Option<&AccountId> {
        match role {
            GuardianRole::Pause => self.pause.as_ref(),
            GuardianRole::SupplyCap => self.supply_cap.as_ref(),
            GuardianRole::BorrowCap => self.borrow_cap.as_ref(),
        }
    }

    fn slot(&mut self, role: GuardianRole) -> &mut Option<AccountId> {
        match role {
            GuardianRole::Pause => &mut self.pause,
            GuardianRole::SupplyCap => &mut self.supply_cap,
            GuardianRole::BorrowCap => &mut self.borrow_cap,
        }
    }
}

/// Risk Engine
///
/// Owns everything the protocol needs to decide whether an action is
/// allowed. Market balances are read through `MarketLedgers`; prices through
/// `PriceOracle`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comptroller {
    pub(crate) id: String,
    pub(crate) admin: AccountId,
    pub(crate) guardians: Guardians,
    pub(crate) registry: MarketRegistry,
    pub(crate) membership: Membership,
    pub(crate) params: RiskParams,
    pub(crate) limits: RiskLimits,
    pub(crate) credit_limits: BTreeMap<AccountId, BTreeMap<MarketId, Amount>>,
}

impl Comptroller {
    /// Create a comptroller with no markets
    pub fn new(admin: AccountId, config: &RiskConfig) -> Result<Self, RiskError> {
        let limits = config.limits()?;
        let params = config.initial_params(&limits)?;
        Ok(Self {
            id: config.comptroller_id.clone(),
            admin,
            guardians: Guardians::default(),
            registry: MarketRegistry::new(),
            membership: Membership::new(),
            params,
            limits,
            credit_limits: BTreeMap::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn admin(&self) -> &AccountId {
        &self.admin
    }

    pub fn guardians(&self) -> &Guardians {
        &self.guardians
    }

    pub fn registry(&self) -> &MarketRegistry {
        &self.registry
    }

    pub fn params(&self) -> &RiskParams {
        &self.params
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    /// Markets the account has entered, in entry order
    pub fn markets_of(&self, account: &AccountId) -> &[MarketId] {
        self.membership.markets_of(account)
    }

    pub fn is_member(&self, account: &AccountId, market: &MarketId) -> bool {
        self.membership.is_member(account, market)
    }

    /// Credit limit of an account in a market; zero when none is set
    pub fn credit_limit(&self, account: &AccountId, market: &MarketId) -> Amount {
        self.credit_limits
            .get(account)
            .and_then(|limits| limits.get(market))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    pub fn is_credit_account(&self, account: &AccountId, market: &MarketId) -> bool {
        !self.credit_limit(account, market).is_zero()
    }

    pub fn is_admin(&self, account: &AccountId) -> bool {
        &self.admin == account
    }

    /// Fail unless `caller` is the admin
    pub fn require_admin(&self, caller: &AccountId, action: &str) -> Result<(), RiskError> {
        if self.is_admin(caller) {
            return Ok(());
        }
        tracing::warn!(caller = %caller, action, "Rejected privileged call");
        Err(RiskError::Unauthorized {
            caller: caller.clone(),
            action: action.to_string(),
        })
    }

    fn require_admin_or(
        &self,
        caller: &AccountId,
        role: GuardianRole,
        action: &str,
    ) -> Result<(), RiskError> {
        if self.guardians.get(role) == Some(caller) {
            return Ok(());
        }
        self.require_admin(caller, action)
    }

    // === Market registry ===

    /// List a market (or re-list a soft-delisted one)
    pub fn support_market(
        &mut self,
        caller: &AccountId,
        market: &MarketId,
        version: MarketVersion,
        events: &mut EventLog,
    ) -> Result<(), RiskError> {
        self.require_admin(caller, "support market")?;
        self.registry.list(market, version)?;
        self.params.touch();

        tracing::info!(market = %market, version = %version, "Market listed");
        events.emit(ProtocolEvent::MarketListed {
            market: market.clone(),
            version,
        });
        Ok(())
    }

    /// Soft delist a listed market, or hard delist a soft-delisted one
    pub fn delist_market(
        &mut self,
        caller: &AccountId,
        market: &MarketId,
        hard: bool,
        events: &mut EventLog,
    ) -> Result<(), RiskError> {
        self.require_admin(caller, "delist market")?;
        self.registry.delist(market, hard)?;
        self.params.touch();

        tracing::info!(market = %market, hard, "Market delisted");
        events.emit(ProtocolEvent::MarketDelisted {
            market: market.clone(),
            hard,
        });
        Ok(())
    }

    /// Set a market's collateral factor.
    ///
    /// A non-zero factor needs a live oracle price for the market.
    pub fn set_collateral_factor(
        &mut self,
        caller: &AccountId,
        market: &MarketId,
        new_factor: Exp,
        oracle: &dyn PriceOracle,
        events: &mut EventLog,
    ) -> Result<(), RiskError> {
        self.require_admin(caller, "set collateral factor")?;
        self.registry.listed(market)?;
        self.limits.check_collateral_factor(new_factor)?;
        if !new_factor.is_zero() {
            oracle.nonzero_price(market)?;
        }

        let info = self.registry.get_mut(market)?;
        let old_factor = info.collateral_factor;
        info.collateral_factor = new_factor;
        self.params.touch();

        tracing::info!(market = %market, old = %old_factor, new = %new_factor, "Collateral factor changed");
        events.emit(ProtocolEvent::NewCollateralFactor {
            market: market.clone(),
            old_factor,
            new_factor,
        });
        Ok(())
    }

    /// Set supply caps (in underlying) for several markets; zero removes the cap
    pub fn set_market_supply_caps(
        &mut self,
        caller: &AccountId,
        markets: &[MarketId],
        caps: &[Amount],
        events: &mut EventLog,
    ) -> Result<(), RiskError> {
        self.require_admin_or(caller, GuardianRole::SupplyCap, "set supply caps")?;
        check_parallel(markets, caps)?;

        for (market, cap) in markets.iter().zip(caps) {
            self.registry.get_mut(market)?.supply_cap = *cap;
            tracing::info!(market = %market, cap = %cap, "Supply cap changed");
            events.emit(ProtocolEvent::NewSupplyCap {
                market: market.clone(),
                new_cap: *cap,
            });
        }
        self.params.touch();
        Ok(())
    }

    /// Set borrow caps for several markets; zero removes the cap
    pub fn set_market_borrow_caps(
        &mut self,
        caller: &AccountId,
        markets: &[MarketId],
        caps: &[Amount],
        events: &mut EventLog,
    ) -> Result<(), RiskError> {
        self.require_admin_or(caller, GuardianRole::BorrowCap, "set borrow caps")?;
        check_parallel(markets, caps)?;

        for (market, cap) in markets.iter().zip(caps) {
            self.registry.get_mut(market)?.borrow_cap = *cap;
            tracing::info!(market = %market, cap = %cap, "Borrow cap changed");
            events.emit(ProtocolEvent::NewBorrowCap {
                market: market.clone(),
                new_cap: *cap,
            });
        }
        self.params.touch();
        Ok(())
    }

    // === Risk parameters ===

    pub fn set_close_factor(
        &mut self,
        caller: &AccountId,
        new_factor: Exp,
        events: &mut EventLog,
    ) -> Result<(), RiskError> {
        self.require_admin(caller, "set close factor")?;
        self.limits.check_close_factor(new_factor)?;

        let old_factor = self.params.close_factor;
        self.params.close_factor = new_factor;
        self.params.touch();

        tracing::info!(old = %old_factor, new = %new_factor, "Close factor changed");
        events.emit(ProtocolEvent::NewCloseFactor {
            old_factor,
            new_factor,
        });
        Ok(())
    }

    pub fn set_liquidation_incentive(
        &mut self,
        caller: &AccountId,
        new_incentive: Exp,
        events: &mut EventLog,
    ) -> Result<(), RiskError> {
        self.require_admin(caller, "set liquidation incentive")?;
        self.limits.check_liquidation_incentive(new_incentive)?;

        let old_incentive = self.params.liquidation_incentive;
        self.params.liquidation_incentive = new_incentive;
        self.params.touch();

        tracing::info!(old = %old_incentive, new = %new_incentive, "Liquidation incentive changed");
        events.emit(ProtocolEvent::NewLiquidationIncentive {
            old_incentive,
            new_incentive,
        });
        Ok(())
    }

    /// Grant (or with zero, revoke) a credit limit
    pub fn set_credit_limit(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
        market: &MarketId,
        limit: Amount,
        events: &mut EventLog,
    ) -> Result<(), RiskError> {
        self.require_admin(caller, "set credit limit")?;
        self.registry.get_mut(market)?;

        if limit.is_zero() {
            if let Some(limits) = self.credit_limits.get_mut(account) {
                limits.remove(market);
                if limits.is_empty() {
                    self.credit_limits.remove(account);
                }
            }
        } else {
            self.credit_limits
                .entry(account.clone())
                .or_default()
                .insert(market.clone(), limit);
        }
        self.params.touch();

        tracing::info!(account = %account, market = %market, limit = %limit, "Credit limit changed");
        events.emit(ProtocolEvent::CreditLimitChanged {
            account: account.clone(),
            market: market.clone(),
            limit,
        });
        Ok(())
    }

    pub fn set_guardian(
        &mut self,
        caller: &AccountId,
        role: GuardianRole,
        new_guardian: Option<AccountId>,
        events: &mut EventLog,
    ) -> Result<(), RiskError> {
        self.require_admin(caller, "set guardian")?;

        let slot = self.guardians.slot(role);
        let old_guardian = std::mem::replace(slot, new_guardian.clone());
        self.params.touch();

        tracing::info!(role = %role, guardian = ?new_guardian, "Guardian changed");
        events.emit(ProtocolEvent::NewGuardian {
            role,
            old_guardian,
            new_guardian,
        });
        Ok(())
    }

    // === Pause switches ===

    /// Pause or unpause mint, borrow or flashloan on one market.
    ///
    /// The pause guardian may only pause; unpausing is admin-only.
    pub fn set_market_paused(
        &mut self,
        caller: &AccountId,
        market: &MarketId,
        action: PauseAction,
        paused: bool,
        events: &mut EventLog,
    ) -> Result<(), RiskError> {
        if action.is_global() {
            return Err(RiskError::InvalidInput(format!(
                "{} is paused protocol-wide, not per market",
                action
            )));
        }
        self.require_pause_capability(caller, paused)?;

        self.registry.get_mut(market)?.set_paused(action, paused);
        self.params.touch();

        tracing::info!(market = %market, action = %action, paused, "Pause state changed");
        events.emit(ProtocolEvent::action_paused(Some(market), action, paused));
        Ok(())
    }

    /// Pause or unpause transfer or seize protocol-wide
    pub fn set_global_paused(
        &mut self,
        caller: &AccountId,
        action: PauseAction,
        paused: bool,
        events: &mut EventLog,
    ) -> Result<(), RiskError> {
        if !action.is_global() {
            return Err(RiskError::InvalidInput(format!(
                "{} is paused per market",
                action
            )));
        }
        self.require_pause_capability(caller, paused)?;

        match action {
            PauseAction::Transfer => self.params.transfer_paused = paused,
            _ => self.params.seize_paused = paused,
        }
        self.params.touch();

        tracing::info!(action = %action, paused, "Global pause state changed");
        events.emit(ProtocolEvent::action_paused(None, action, paused));
        Ok(())
    }

    fn require_pause_capability(&self, caller: &AccountId, paused: bool) -> Result<(), RiskError> {
        if paused {
            self.require_admin_or(caller, GuardianRole::Pause, "pause")
        } else {
            self.require_admin(caller, "unpause")
        }
    }

    // === Membership ===

    /// Enter each market so it counts toward the account's liquidity.
    ///
    /// Entering a market twice is a no-op.
    pub fn enter_markets(
        &mut self,
        account: &AccountId,
        markets: &[MarketId],
        ledgers: &mut dyn MarketLedgers,
        events: &mut EventLog,
    ) -> Result<(), RiskError> {
        for market in markets {
            self.add_to_market(account, market, ledgers, events)?;
        }
        Ok(())
    }

    pub(crate) fn add_to_market(
        &mut self,
        account: &AccountId,
        market: &MarketId,
        ledgers: &mut dyn MarketLedgers,
        events: &mut EventLog,
    ) -> Result<(), RiskError> {
        self.registry.listed(market)?;
        if !self.membership.insert(account, market) {
            return Ok(());
        }

        tracing::debug!(account = %account, market = %market, "Market entered");
        events.emit(ProtocolEvent::market_entered(market, account));
        if let Some(collateral) = ledgers.register_collateral(market, account)? {
            events.emit(ProtocolEvent::user_collateral_changed(market, account, collateral));
        }
        Ok(())
    }

    /// Leave a market.
    ///
    /// Fails while the account borrows from it, or when dropping its
    /// collateral would leave the account short.
    pub fn exit_market(
        &mut self,
        account: &AccountId,
        market: &MarketId,
        ledgers: &mut dyn MarketLedgers,
        oracle: &dyn PriceOracle,
        events: &mut EventLog,
    ) -> Result<(), RiskError> {
        let snapshot = ledgers.account_snapshot(market, account)?;
        if !snapshot.borrow_balance.is_zero() {
            return Err(RiskError::NonzeroBorrowBalance {
                market: market.clone(),
            });
        }
        if !self.membership.is_member(account, market) {
            return Ok(());
        }

        let after = self.hypothetical_liquidity(
            account,
            market,
            snapshot.collateral_tokens,
            Amount::ZERO,
            &*ledgers,
            oracle,
        )?;
        if after.has_shortfall() {
            return Err(RiskError::InsufficientLiquidity {
                shortfall: after.shortfall.to_string(),
            });
        }

        self.membership.remove(account, market);
        tracing::debug!(account = %account, market = %market, "Market exited");
        events.emit(ProtocolEvent::market_exited(market, account));
        if let Some(collateral) = ledgers.unregister_collateral(market, account)? {
            events.emit(ProtocolEvent::user_collateral_changed(market, account, collateral));
        }
        Ok(())
    }
}

fn check_parallel(markets: &[MarketId], caps: &[Amount]) -> Result<(), RiskError> {
    if markets.is_empty() || markets.len() != caps.len() {
        return Err(RiskError::InvalidInput(format!(
            "{} markets for {} caps",
            markets.len(),
            caps.len()
        )));
    }
    Ok(())
}
