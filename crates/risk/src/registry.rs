//! Market registry - listing lifecycle and per-market risk settings

use ironbank_core::{Amount, Exp, MarketId, MarketVersion, PauseAction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::Display;

use crate::error::RiskError;

/// Listing lifecycle of a market.
///
/// `Unlisted -> Listed -> SoftDelisted -> HardDelisted`, with re-listing
/// allowed from `SoftDelisted`. `HardDelisted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ListingState {
    Unlisted,
    Listed,
    SoftDelisted,
    HardDelisted,
}

impl ListingState {
    /// Positions in the market can still be unwound
    pub fn is_reachable(&self) -> bool {
        matches!(self, ListingState::Listed | ListingState::SoftDelisted)
    }
}

/// Registry entry for one market
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketInfo {
    pub listing: ListingState,
    pub version: MarketVersion,
    pub collateral_factor: Exp,
    /// Supply cap in underlying; zero means no cap
    pub supply_cap: Amount,
    /// Borrow cap in underlying; zero means no cap
    pub borrow_cap: Amount,
    pub mint_paused: bool,
    pub borrow_paused: bool,
    pub flashloan_paused: bool,
}

impl MarketInfo {
    fn new(version: MarketVersion) -> Self {
        Self {
            listing: ListingState::Listed,
            version,
            collateral_factor: Exp::ZERO,
            supply_cap: Amount::ZERO,
            borrow_cap: Amount::ZERO,
            mint_paused: false,
            borrow_paused: false,
            flashloan_paused: false,
        }
    }

    pub fn is_listed(&self) -> bool {
        self.listing == ListingState::Listed
    }

    /// Per-market pause flag; global actions are never paused here
    pub fn is_paused(&self, action: PauseAction) -> bool {
        match action {
            PauseAction::Mint => self.mint_paused,
            PauseAction::Borrow => self.borrow_paused,
            PauseAction::Flashloan => self.flashloan_paused,
            PauseAction::Transfer | PauseAction::Seize => false,
        }
    }

    pub(crate) fn set_paused(&mut self, action: PauseAction, paused: bool) {
        match action {
            PauseAction::Mint => self.mint_paused = paused,
            PauseAction::Borrow => self.borrow_paused = paused,
            PauseAction::Flashloan => self.flashloan_paused = paused,
            PauseAction::Transfer | PauseAction::Seize => {}
        }
    }
}

/// Every market ever listed, in listing order.
///
/// Markets are never removed; delisting only changes `listing`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketRegistry {
    markets: BTreeMap<MarketId, MarketInfo>,
    all_markets: Vec<MarketId>,
}

impl MarketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, market: &MarketId) -> Option<&MarketInfo> {
        self.markets.get(market)
    }

    pub(crate) fn get_mut(&mut self, market: &MarketId) -> Result<&mut MarketInfo, RiskError> {
        self.markets
            .get_mut(market)
            .ok_or_else(|| RiskError::UnknownMarket {
                market: market.clone(),
            })
    }

    /// Listing state; markets never seen are `Unlisted`
    pub fn listing(&self, market: &MarketId) -> ListingState {
        self.markets
            .get(market)
            .map_or(ListingState::Unlisted, |m| m.listing)
    }

    /// Entry for a market that is currently `Listed`
    pub fn listed(&self, market: &MarketId) -> Result<&MarketInfo, RiskError> {
        match self.markets.get(market) {
            Some(info) if info.is_listed() => Ok(info),
            _ => Err(RiskError::MarketNotListed {
                market: market.clone(),
            }),
        }
    }

    /// Entry for a market that is `Listed` or `SoftDelisted`
    pub fn reachable(&self, market: &MarketId) -> Result<&MarketInfo, RiskError> {
        match self.markets.get(market) {
            Some(info) if info.listing.is_reachable() => Ok(info),
            _ => Err(RiskError::MarketNotListed {
                market: market.clone(),
            }),
        }
    }

    /// Markets in listing order
    pub fn all_markets(&self) -> &[MarketId] {
        &self.all_markets
    }

    /// Admit a market, or re-admit a soft-delisted one keeping its settings
    pub(crate) fn list(&mut self, market: &MarketId, version: MarketVersion) -> Result<(), RiskError> {
        match self.listing(market) {
            ListingState::Unlisted => {
                self.markets.insert(market.clone(), MarketInfo::new(version));
                self.all_markets.push(market.clone());
                Ok(())
            }
            ListingState::SoftDelisted => {
                let info = self.get_mut(market)?;
                info.listing = ListingState::Listed;
                info.version = version;
                Ok(())
            }
            ListingState::Listed | ListingState::HardDelisted => Err(RiskError::MarketAlreadyListed {
                market: market.clone(),
            }),
        }
    }

    /// Soft delist from `Listed`, or hard delist from `SoftDelisted`
    pub(crate) fn delist(&mut self, market: &MarketId, hard: bool) -> Result<(), RiskError> {
        let from = self.listing(market);
        let expected = if hard {
            ListingState::SoftDelisted
        } else {
            ListingState::Listed
        };
        if from == ListingState::Unlisted {
            return Err(RiskError::MarketNotListed {
                market: market.clone(),
            });
        }
        if from != expected {
            return Err(RiskError::InvalidListingTransition {
                market: market.clone(),
                from,
            });
        }

        let info = self.get_mut(market)?;
        for action in [PauseAction::Mint, PauseAction::Borrow, PauseAction::Flashloan] {
            if !info.is_paused(action) {
                return Err(RiskError::MarketNotPaused {
                    market: market.clone(),
                    action,
                });
            }
        }
        if !info.collateral_factor.is_zero() {
            return Err(RiskError::MarketHasCollateral {
                market: market.clone(),
            });
        }

        info.listing = if hard {
            ListingState::HardDelisted
        } else {
            ListingState::SoftDelisted
        };
        Ok(())
    }
}
