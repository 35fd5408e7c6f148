//! Iron Bank Risk Engine (Comptroller)
//!
//! Decides whether each ledger action is allowed. It owns the market
//! registry, per-account market membership, credit limits, pause switches and
//! the global risk parameters, and computes account liquidity by reading
//! every market an account has entered through the `MarketLedgers` port.

pub mod config;
pub mod engine;
pub mod error;
pub mod ledgers;
pub mod liquidation;
pub mod liquidity;
pub mod membership;
pub mod params;
pub mod policy;
pub mod registry;

pub use config::RiskConfig;
pub use engine::{Comptroller, Guardians};
pub use error::RiskError;
pub use ledgers::{AccountSnapshot, MarketLedgers, MarketTotals};
pub use liquidation::seize_tokens;
pub use liquidity::Liquidity;
pub use membership::Membership;
pub use params::{RiskLimits, RiskParams};
pub use registry::{ListingState, MarketInfo, MarketRegistry};
