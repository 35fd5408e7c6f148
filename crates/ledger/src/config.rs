//! Protocol configuration
//!
//! Loaded from JSON with per-field defaults; ratios are decimals converted
//! to mantissas by `limits()`.

use ironbank_core::Exp;
use ironbank_risk::RiskConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LendingError;

/// Configuration for a protocol instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Account holding the admin capability
    #[serde(default = "default_admin")]
    pub admin: String,

    /// Risk engine settings
    #[serde(default)]
    pub risk: RiskConfig,

    // === Ledger limits ===
    /// Hard ceiling on the per-block borrow rate
    #[serde(default = "default_borrow_rate_max_per_block")]
    pub borrow_rate_max_per_block: Decimal,

    #[serde(default = "default_reserve_factor_max")]
    pub reserve_factor_max: Decimal,

    /// Flashloan fee in basis points of the borrowed amount
    #[serde(default = "default_flashloan_fee_bps")]
    pub flashloan_fee_bps: u32,

    // === Market defaults ===
    /// Exchange rate of an empty market
    #[serde(default = "default_initial_exchange_rate")]
    pub initial_exchange_rate: Decimal,

    #[serde(default = "default_reserve_factor")]
    pub reserve_factor: Decimal,

    /// Used to convert annual rates into per-block rates
    #[serde(default = "default_blocks_per_year")]
    pub blocks_per_year: u64,
}

fn default_admin() -> String {
    "admin".to_string()
}

fn default_borrow_rate_max_per_block() -> Decimal {
    Decimal::new(5, 4) // 0.0005
}

fn default_reserve_factor_max() -> Decimal {
    Decimal::ONE
}

fn default_flashloan_fee_bps() -> u32 {
    3
}

fn default_initial_exchange_rate() -> Decimal {
    Decimal::new(2, 2) // 0.02
}

fn default_reserve_factor() -> Decimal {
    Decimal::new(1, 1) // 10%
}

fn default_blocks_per_year() -> u64 {
    2_102_400 // 15 second blocks
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            admin: default_admin(),
            risk: RiskConfig::default(),
            borrow_rate_max_per_block: default_borrow_rate_max_per_block(),
            reserve_factor_max: default_reserve_factor_max(),
            flashloan_fee_bps: default_flashloan_fee_bps(),
            initial_exchange_rate: default_initial_exchange_rate(),
            reserve_factor: default_reserve_factor(),
            blocks_per_year: default_blocks_per_year(),
        }
    }
}

impl ProtocolConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Ledger limits as mantissas
    pub fn limits(&self) -> Result<LedgerLimits, LendingError> {
        Ok(LedgerLimits {
            borrow_rate_max: Exp::from_decimal(self.borrow_rate_max_per_block)?,
            reserve_factor_max: Exp::from_decimal(self.reserve_factor_max)?,
            flashloan_fee_bps: self.flashloan_fee_bps,
        })
    }
}

/// Limits enforced by every market ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLimits {
    pub borrow_rate_max: Exp,
    pub reserve_factor_max: Exp,
    pub flashloan_fee_bps: u32,
}
