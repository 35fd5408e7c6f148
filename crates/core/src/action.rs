//! Pausable actions and privileged roles

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// An action that can be switched off by a pause flag.
///
/// Mint, borrow and flashloan are paused per market; transfer and seize are
/// paused protocol-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PauseAction {
    Mint,
    Borrow,
    Flashloan,
    Transfer,
    Seize,
}

impl PauseAction {
    /// Whether the flag is protocol-wide rather than per market
    pub fn is_global(&self) -> bool {
        matches!(self, PauseAction::Transfer | PauseAction::Seize)
    }
}

/// A guardian capability that can act alongside the admin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GuardianRole {
    /// May pause (never unpause) actions
    Pause,
    /// May set supply caps
    SupplyCap,
    /// May set borrow caps
    BorrowCap,
}
