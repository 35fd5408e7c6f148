//! Iron Bank Core - Domain types
//!
//! This crate contains the fundamental types used across Iron Bank:
//! - `Amount`: Non-negative 256-bit token quantity with checked arithmetic
//! - `Exp`: 1e18-scaled fixed-point fraction (the arithmetic kernel)
//! - `AccountId`, `MarketId`, `AssetId`: identifiers
//! - `MarketVersion`: ledger variant tag
//! - `PauseAction`, `GuardianRole`: pause switches and privileged roles
//! - `MathError`, `ErrorKind`: arithmetic faults and the failure taxonomy

pub mod action;
pub mod amount;
pub mod error;
pub mod exp;
pub mod ids;
pub mod version;

pub use action::{GuardianRole, PauseAction};
pub use amount::Amount;
pub use error::{ErrorKind, MathError};
pub use exp::{div_scalar_by_exp_truncate, Exp, EXP_SCALE};
pub use ids::{AccountId, AssetId, MarketId};
pub use version::MarketVersion;
