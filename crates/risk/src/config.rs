//! Risk configuration with configurable bounds
//!
//! Ratios are written as human-facing decimals ("0.5", "1.08") and converted
//! to `Exp` mantissas when the comptroller is built.

use ironbank_core::Exp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RiskError;
use crate::params::{RiskLimits, RiskParams};

/// Configuration for the Comptroller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Tag markets must share for seizes between them to be allowed
    #[serde(default = "default_comptroller_id")]
    pub comptroller_id: String,

    // === Initial parameters ===
    /// Fraction of a borrow repayable in one liquidation
    #[serde(default = "default_close_factor")]
    pub close_factor: Decimal,

    /// Collateral bonus paid to liquidators
    #[serde(default = "default_liquidation_incentive")]
    pub liquidation_incentive: Decimal,

    // === Bounds ===
    #[serde(default = "default_close_factor_min")]
    pub close_factor_min: Decimal,

    #[serde(default = "default_close_factor_max")]
    pub close_factor_max: Decimal,

    #[serde(default = "default_liquidation_incentive_min")]
    pub liquidation_incentive_min: Decimal,

    #[serde(default = "default_liquidation_incentive_max")]
    pub liquidation_incentive_max: Decimal,

    /// Upper bound for any market's collateral factor
    #[serde(default = "default_max_collateral_factor")]
    pub max_collateral_factor: Decimal,
}

fn default_comptroller_id() -> String {
    "comptroller".to_string()
}

fn default_close_factor() -> Decimal {
    Decimal::new(5, 1) // 50%
}

fn default_liquidation_incentive() -> Decimal {
    Decimal::new(108, 2) // 8% bonus
}

fn default_close_factor_min() -> Decimal {
    Decimal::new(5, 2)
}

fn default_close_factor_max() -> Decimal {
    Decimal::new(9, 1)
}

fn default_liquidation_incentive_min() -> Decimal {
    Decimal::ONE
}

fn default_liquidation_incentive_max() -> Decimal {
    Decimal::new(15, 1)
}

fn default_max_collateral_factor() -> Decimal {
    Decimal::new(9, 1)
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            comptroller_id: default_comptroller_id(),
            close_factor: default_close_factor(),
            liquidation_incentive: default_liquidation_incentive(),
            close_factor_min: default_close_factor_min(),
            close_factor_max: default_close_factor_max(),
            liquidation_incentive_min: default_liquidation_incentive_min(),
            liquidation_incentive_max: default_liquidation_incentive_max(),
            max_collateral_factor: default_max_collateral_factor(),
        }
    }
}

impl RiskConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Convert the bounds to mantissas
    pub fn limits(&self) -> Result<RiskLimits, RiskError> {
        let limits = RiskLimits {
            close_factor_min: Exp::from_decimal(self.close_factor_min)?,
            close_factor_max: Exp::from_decimal(self.close_factor_max)?,
            liquidation_incentive_min: Exp::from_decimal(self.liquidation_incentive_min)?,
            liquidation_incentive_max: Exp::from_decimal(self.liquidation_incentive_max)?,
            max_collateral_factor: Exp::from_decimal(self.max_collateral_factor)?,
        };
        if limits.max_collateral_factor >= Exp::ONE {
            return Err(RiskError::InvalidCollateralFactor {
                factor: self.max_collateral_factor.to_string(),
                max: "1".to_string(),
            });
        }
        Ok(limits)
    }

    /// Initial parameters, validated against the configured bounds
    pub fn initial_params(&self, limits: &RiskLimits) -> Result<RiskParams, RiskError> {
        let close_factor = Exp::from_decimal(self.close_factor)?;
        let liquidation_incentive = Exp::from_decimal(self.liquidation_incentive)?;
        limits.check_close_factor(close_factor)?;
        limits.check_liquidation_incentive(liquidation_incentive)?;
        Ok(RiskParams::new(close_factor, liquidation_incentive))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = RiskConfig::default();
        assert_eq!(config.close_factor, dec!(0.5));
        assert_eq!(config.liquidation_incentive, dec!(1.08));
        assert_eq!(config.close_factor_min, dec!(0.05));
        assert_eq!(config.close_factor_max, dec!(0.9));
        assert_eq!(config.liquidation_incentive_min, dec!(1));
        assert_eq!(config.liquidation_incentive_max, dec!(1.5));
        assert_eq!(config.max_collateral_factor, dec!(0.9));
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{ "close_factor": "0.25" }"#;
        let config: RiskConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.close_factor, dec!(0.25));
        assert_eq!(config.liquidation_incentive, dec!(1.08)); // default
        assert_eq!(config.comptroller_id, "comptroller");
    }

    #[test]
    fn test_initial_params_out_of_bounds() {
        let config = RiskConfig {
            close_factor: dec!(0.95),
            ..RiskConfig::default()
        };
        let limits = config.limits().unwrap();
        assert!(matches!(
            config.initial_params(&limits),
            Err(RiskError::InvalidCloseFactor(_))
        ));
    }

    #[test]
    fn test_max_collateral_factor_below_one() {
        let config = RiskConfig {
            max_collateral_factor: dec!(1),
            ..RiskConfig::default()
        };
        assert!(config.limits().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("risk.json");
        std::fs::write(&path, r#"{ "liquidation_incentive": "1.1" }"#).unwrap();

        let config = RiskConfig::from_file(&path).unwrap();
        assert_eq!(config.liquidation_incentive, dec!(1.1));
    }
}
