//! Global risk parameters

use ironbank_core::Exp;
use serde::{Deserialize, Serialize};

use crate::error::RiskError;

/// Bounds enforced by the parameter setters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskLimits {
    pub close_factor_min: Exp,
    pub close_factor_max: Exp,
    pub liquidation_incentive_min: Exp,
    pub liquidation_incentive_max: Exp,
    pub max_collateral_factor: Exp,
}

impl RiskLimits {
    pub fn check_close_factor(&self, factor: Exp) -> Result<(), RiskError> {
        if factor < self.close_factor_min || factor > self.close_factor_max {
            return Err(RiskError::InvalidCloseFactor(factor.to_string()));
        }
        Ok(())
    }

    pub fn check_liquidation_incentive(&self, incentive: Exp) -> Result<(), RiskError> {
        if incentive < self.liquidation_incentive_min || incentive > self.liquidation_incentive_max {
            return Err(RiskError::InvalidLiquidationIncentive(incentive.to_string()));
        }
        Ok(())
    }

    pub fn check_collateral_factor(&self, factor: Exp) -> Result<(), RiskError> {
        if factor > self.max_collateral_factor {
            return Err(RiskError::InvalidCollateralFactor {
                factor: factor.to_string(),
                max: self.max_collateral_factor.to_string(),
            });
        }
        Ok(())
    }
}

/// Protocol-wide parameters owned by the Comptroller.
///
/// Only mutated through the Comptroller's validated setters; every accepted
/// change bumps `revision`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskParams {
    pub close_factor: Exp,
    pub liquidation_incentive: Exp,
    pub transfer_paused: bool,
    pub seize_paused: bool,
    pub revision: u64,
}

impl RiskParams {
    pub fn new(close_factor: Exp, liquidation_incentive: Exp) -> Self {
        Self {
            close_factor,
            liquidation_incentive,
            transfer_paused: false,
            seize_paused: false,
            revision: 0,
        }
    }

    /// Record an accepted change
    pub fn touch(&mut self) {
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn exp(d: rust_decimal::Decimal) -> Exp {
        Exp::from_decimal(d).unwrap()
    }

    fn limits() -> RiskLimits {
        RiskLimits {
            close_factor_min: exp(dec!(0.05)),
            close_factor_max: exp(dec!(0.9)),
            liquidation_incentive_min: exp(dec!(1)),
            liquidation_incentive_max: exp(dec!(1.5)),
            max_collateral_factor: exp(dec!(0.9)),
        }
    }

    #[test]
    fn test_close_factor_bounds() {
        let limits = limits();
        assert!(limits.check_close_factor(exp(dec!(0.05))).is_ok());
        assert!(limits.check_close_factor(exp(dec!(0.9))).is_ok());
        assert!(limits.check_close_factor(exp(dec!(0.04))).is_err());
        assert!(limits.check_close_factor(exp(dec!(0.91))).is_err());
    }

    #[test]
    fn test_incentive_bounds() {
        let limits = limits();
        assert!(limits.check_liquidation_incentive(exp(dec!(0.99))).is_err());
        assert!(limits.check_liquidation_incentive(exp(dec!(1.08))).is_ok());
        assert!(limits.check_liquidation_incentive(exp(dec!(1.51))).is_err());
    }

    #[test]
    fn test_collateral_factor_bound() {
        let limits = limits();
        assert!(limits.check_collateral_factor(Exp::ZERO).is_ok());
        assert!(limits.check_collateral_factor(exp(dec!(0.9))).is_ok());
        assert!(limits.check_collateral_factor(exp(dec!(0.95))).is_err());
    }

    #[test]
    fn test_touch_bumps_revision() {
        let mut params = RiskParams::new(exp(dec!(0.5)), exp(dec!(1.08)));
        params.touch();
        params.touch();
        assert_eq!(params.revision, 2);
    }
}
