//! Market version tags

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Selects which ledger variant backs a market.
///
/// Stored by the market registry at listing time and consumed by the risk
/// engine wherever validation differs per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MarketVersion {
    /// Plain interest-bearing market
    Vanilla,
    /// Collateral sub-balance bounded by a global cap
    CollateralCap,
    /// Collateral-capped market that never accrues interest
    CollateralCapNoInterest,
    /// Accepts and pays out the native asset
    WrappedNative,
    /// Collateral-capped market that refuses third-party repayment of credit accounts
    CreditChecked,
}

impl MarketVersion {
    /// Whether balances carry a separate collateral sub-balance
    pub fn has_collateral_cap(&self) -> bool {
        matches!(
            self,
            MarketVersion::CollateralCap
                | MarketVersion::CollateralCapNoInterest
                | MarketVersion::CreditChecked
        )
    }

    pub fn supports_flashloan(&self) -> bool {
        !matches!(self, MarketVersion::Vanilla)
    }

    pub fn accrues_interest(&self) -> bool {
        !matches!(self, MarketVersion::CollateralCapNoInterest)
    }

    pub fn checks_credit_repay(&self) -> bool {
        matches!(self, MarketVersion::CreditChecked)
    }
}
