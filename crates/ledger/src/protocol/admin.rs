//! Privileged configuration
//!
//! Risk parameters are forwarded to the comptroller; per-market ledger
//! parameters are changed here after accruing under the old settings.

use ironbank_core::{AccountId, Amount, Exp, GuardianRole, MarketId, PauseAction};
use ironbank_events::ProtocolEvent;

use super::Protocol;
use crate::error::LendingError;
use crate::market::{Market, MarketSpec};
use crate::rate_model::RateModel;

impl Protocol {
    // === Markets ===

    /// Create a market ledger. It is not listed until `support_market`.
    pub fn create_market(&mut self, caller: &AccountId, spec: MarketSpec) -> Result<(), LendingError> {
        self.atomically("create_market", |p| {
            let s = &mut p.state;
            s.comptroller.require_admin(caller, "create market")?;
            let id = spec.id.clone();
            let version = spec.version;
            let market = Market::new(spec, s.comptroller.id(), s.block);
            s.book.insert(market)?;
            tracing::info!(market = %id, version = %version, "Market created");
            Ok(())
        })
    }

    /// List a market with the risk engine
    pub fn support_market(&mut self, caller: &AccountId, market: &MarketId) -> Result<(), LendingError> {
        self.atomically("support_market", |p| {
            let s = &mut p.state;
            let version = s.book.get(market)?.version();
            s.comptroller.support_market(caller, market, version, &mut s.events)?;
            Ok(())
        })
    }

    pub fn delist_market(&mut self, caller: &AccountId, market: &MarketId, hard: bool) -> Result<(), LendingError> {
        self.atomically("delist_market", |p| {
            let s = &mut p.state;
            s.comptroller.delist_market(caller, market, hard, &mut s.events)?;
            Ok(())
        })
    }

    // === Risk parameters ===

    pub fn set_collateral_factor(&mut self, caller: &AccountId, market: &MarketId, factor: Exp) -> Result<(), LendingError> {
        self.atomically("set_collateral_factor", |p| {
            let oracle = &*p.oracle;
            let s = &mut p.state;
            s.comptroller
                .set_collateral_factor(caller, market, factor, oracle, &mut s.events)?;
            Ok(())
        })
    }

    pub fn set_market_supply_caps(&mut self, caller: &AccountId, markets: &[MarketId], caps: &[Amount]) -> Result<(), LendingError> {
        self.atomically("set_market_supply_caps", |p| {
            let s = &mut p.state;
            s.comptroller
                .set_market_supply_caps(caller, markets, caps, &mut s.events)?;
            Ok(())
        })
    }

    pub fn set_market_borrow_caps(&mut self, caller: &AccountId, markets: &[MarketId], caps: &[Amount]) -> Result<(), LendingError> {
        self.atomically("set_market_borrow_caps", |p| {
            let s = &mut p.state;
            s.comptroller
                .set_market_borrow_caps(caller, markets, caps, &mut s.events)?;
            Ok(())
        })
    }

    pub fn set_close_factor(&mut self, caller: &AccountId, factor: Exp) -> Result<(), LendingError> {
        self.atomically("set_close_factor", |p| {
            let s = &mut p.state;
            s.comptroller.set_close_factor(caller, factor, &mut s.events)?;
            Ok(())
        })
    }

    pub fn set_liquidation_incentive(&mut self, caller: &AccountId, incentive: Exp) -> Result<(), LendingError> {
        self.atomically("set_liquidation_incentive", |p| {
            let s = &mut p.state;
            s.comptroller
                .set_liquidation_incentive(caller, incentive, &mut s.events)?;
            Ok(())
        })
    }

    /// Zero revokes the credit limit
    pub fn set_credit_limit(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
        market: &MarketId,
        limit: Amount,
    ) -> Result<(), LendingError> {
        self.atomically("set_credit_limit", |p| {
            let s = &mut p.state;
            s.comptroller
                .set_credit_limit(caller, account, market, limit, &mut s.events)?;
            Ok(())
        })
    }

    pub fn set_guardian(&mut self, caller: &AccountId, role: GuardianRole, guardian: Option<AccountId>) -> Result<(), LendingError> {
        self.atomically("set_guardian", |p| {
            let s = &mut p.state;
            s.comptroller.set_guardian(caller, role, guardian, &mut s.events)?;
            Ok(())
        })
    }

    pub fn set_market_paused(
        &mut self,
        caller: &AccountId,
        market: &MarketId,
        action: PauseAction,
        paused: bool,
    ) -> Result<(), LendingError> {
        self.atomically("set_market_paused", |p| {
            let s = &mut p.state;
            s.comptroller
                .set_market_paused(caller, market, action, paused, &mut s.events)?;
            Ok(())
        })
    }

    pub fn set_global_paused(&mut self, caller: &AccountId, action: PauseAction, paused: bool) -> Result<(), LendingError> {
        self.atomically("set_global_paused", |p| {
            let s = &mut p.state;
            s.comptroller
                .set_global_paused(caller, action, paused, &mut s.events)?;
            Ok(())
        })
    }

    // === Ledger parameters ===

    pub fn set_reserve_factor(&mut self, caller: &AccountId, market: &MarketId, factor: Exp) -> Result<(), LendingError> {
        self.atomically("set_reserve_factor", |p| {
            p.state.comptroller.require_admin(caller, "set reserve factor")?;
            p.guarded(market, |p| {
                p.accrue(market)?;
                let s = &mut p.state;
                let ledger = s.book.get_mut(market)?;
                ledger.require_fresh(s.block)?;
                let old_factor = ledger.set_reserve_factor(factor, &s.limits)?;

                tracing::info!(market = %market, old = %old_factor, new = %factor, "Reserve factor set");
                s.events.emit(ProtocolEvent::NewReserveFactor {
                    market: market.clone(),
                    old_factor,
                    new_factor: factor,
                });
                Ok(())
            })
        })
    }

    pub fn set_interest_rate_model(&mut self, caller: &AccountId, market: &MarketId, model: RateModel) -> Result<(), LendingError> {
        self.atomically("set_interest_rate_model", |p| {
            p.state.comptroller.require_admin(caller, "set interest rate model")?;
            p.guarded(market, |p| {
                p.accrue(market)?;
                let s = &mut p.state;
                let name = model.name().to_string();
                s.book.get_mut(market)?.set_rate_model(model);

                tracing::info!(market = %market, model = %name, "Interest rate model set");
                s.events.emit(ProtocolEvent::NewInterestRateModel {
                    market: market.clone(),
                    model: name,
                });
                Ok(())
            })
        })
    }

    /// Collateral-capped markets only; zero lifts the cap
    pub fn set_collateral_cap(&mut self, caller: &AccountId, market: &MarketId, cap: Amount) -> Result<(), LendingError> {
        self.atomically("set_collateral_cap", |p| {
            let s = &mut p.state;
            s.comptroller.require_admin(caller, "set collateral cap")?;
            s.book.get_mut(market)?.set_collateral_cap(cap)?;

            tracing::info!(market = %market, cap = %cap, "Collateral cap set");
            s.events.emit(ProtocolEvent::NewCollateralCap {
                market: market.clone(),
                new_cap: cap,
            });
            Ok(())
        })
    }

    /// Replace the accounts whose debt is left out of utilization
    pub fn set_rate_exclusions(&mut self, caller: &AccountId, market: &MarketId, accounts: Vec<AccountId>) -> Result<(), LendingError> {
        self.atomically("set_rate_exclusions", |p| {
            p.state.comptroller.require_admin(caller, "set rate exclusions")?;
            p.accrue(market)?;
            let s = &mut p.state;
            s.book.get_mut(market)?.set_rate_exclusions(accounts.clone());

            tracing::info!(market = %market, count = accounts.len(), "Rate exclusions set");
            s.events.emit(ProtocolEvent::RateExclusionsChanged {
                market: market.clone(),
                accounts,
            });
            Ok(())
        })
    }

    /// Re-tag a market with another comptroller id
    pub fn set_market_comptroller(&mut self, caller: &AccountId, market: &MarketId, comptroller: &str) -> Result<(), LendingError> {
        self.atomically("set_market_comptroller", |p| {
            let s = &mut p.state;
            s.comptroller.require_admin(caller, "set comptroller")?;
            let old_comptroller = s.book.get_mut(market)?.set_comptroller(comptroller);

            tracing::info!(market = %market, old = %old_comptroller, new = %comptroller, "Comptroller set");
            s.events.emit(ProtocolEvent::NewComptroller {
                market: market.clone(),
                old_comptroller,
                new_comptroller: comptroller.to_string(),
            });
            Ok(())
        })
    }

    // === Reserves ===

    /// Donate underlying to `market`'s reserves
    pub fn add_reserves(&mut self, benefactor: &AccountId, market: &MarketId, amount: Amount) -> Result<Amount, LendingError> {
        self.atomically("add_reserves", |p| {
            p.guarded(market, |p| {
                p.accrue(market)?;
                let s = &mut p.state;
                let ledger = s.book.get_mut(market)?;
                ledger.require_fresh(s.block)?;
                s.bank
                    .transfer(ledger.underlying(), benefactor, &market.holder(), amount)?;
                let new_total_reserves = ledger.add_reserves(amount)?;

                tracing::info!(market = %market, benefactor = %benefactor, amount = %amount, "Reserves added");
                s.events.emit(ProtocolEvent::ReservesAdded {
                    market: market.clone(),
                    benefactor: benefactor.clone(),
                    add_amount: amount,
                    new_total_reserves,
                });
                Ok(new_total_reserves)
            })
        })
    }

    /// Withdraw reserves to the admin
    pub fn reduce_reserves(&mut self, caller: &AccountId, market: &MarketId, amount: Amount) -> Result<Amount, LendingError> {
        self.atomically("reduce_reserves", |p| {
            p.state.comptroller.require_admin(caller, "reduce reserves")?;
            p.guarded(market, |p| {
                p.accrue(market)?;
                let s = &mut p.state;
                let ledger = s.book.get_mut(market)?;
                ledger.require_fresh(s.block)?;
                let new_total_reserves = ledger.reduce_reserves(amount)?;
                s.bank
                    .transfer(ledger.underlying(), &market.holder(), caller, amount)?;

                tracing::info!(market = %market, admin = %caller, amount = %amount, "Reserves reduced");
                s.events.emit(ProtocolEvent::ReservesReduced {
                    market: market.clone(),
                    admin: caller.clone(),
                    reduce_amount: amount,
                    new_total_reserves,
                });
                Ok(new_total_reserves)
            })
        })
    }
}
