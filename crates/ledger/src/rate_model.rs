//! Interest rate models
//!
//! A rate model maps market utilization to a per-block borrow rate. The
//! supply rate follows from the borrow rate, utilization and reserve factor.

use ironbank_core::{Amount, Exp, MathError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `borrows / (cash + borrows - reserves)`, zero when nothing is borrowed
pub fn utilization_rate(cash: Amount, borrows: Amount, reserves: Amount) -> Result<Exp, MathError> {
    if borrows.is_zero() {
        return Ok(Exp::ZERO);
    }
    let denom = cash.add_then_sub(borrows, reserves)?;
    Exp::from_ratio(borrows, denom)
}

/// Per-block rate oracle consulted during accrual
pub trait InterestRateModel {
    /// Per-block borrow rate
    fn borrow_rate(&self, cash: Amount, borrows: Amount, reserves: Amount) -> Result<Exp, MathError>;

    /// Per-block supply rate: `utilization * borrow_rate * (1 - reserve_factor)`
    fn supply_rate(
        &self,
        cash: Amount,
        borrows: Amount,
        reserves: Amount,
        reserve_factor: Exp,
    ) -> Result<Exp, MathError> {
        let one_minus_reserve_factor = Exp::ONE.checked_sub(reserve_factor)?;
        let borrow_rate = self.borrow_rate(cash, borrows, reserves)?;
        let rate_to_pool = borrow_rate.mul_exp(one_minus_reserve_factor)?;
        utilization_rate(cash, borrows, reserves)?.mul_exp(rate_to_pool)
    }
}

/// Kinked linear model: gentle slope up to `kink`, steep slope past it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JumpRateModel {
    pub base_rate_per_block: Exp,
    pub multiplier_per_block: Exp,
    pub jump_multiplier_per_block: Exp,
    pub kink: Exp,
}

impl JumpRateModel {
    /// Build from annual rates
    pub fn from_annual(
        base_rate_per_year: Decimal,
        multiplier_per_year: Decimal,
        jump_multiplier_per_year: Decimal,
        kink: Decimal,
        blocks_per_year: u64,
    ) -> Result<Self, MathError> {
        let blocks = Amount::from(blocks_per_year);
        Ok(Self {
            base_rate_per_block: Exp::from_decimal(base_rate_per_year)?.div_scalar(blocks)?,
            multiplier_per_block: Exp::from_decimal(multiplier_per_year)?.div_scalar(blocks)?,
            jump_multiplier_per_block: Exp::from_decimal(jump_multiplier_per_year)?.div_scalar(blocks)?,
            kink: Exp::from_decimal(kink)?,
        })
    }
}

impl InterestRateModel for JumpRateModel {
    fn borrow_rate(&self, cash: Amount, borrows: Amount, reserves: Amount) -> Result<Exp, MathError> {
        let util = utilization_rate(cash, borrows, reserves)?;

        if util <= self.kink {
            return util.mul_exp(self.multiplier_per_block)?.checked_add(self.base_rate_per_block);
        }

        let normal_rate = self
            .kink
            .mul_exp(self.multiplier_per_block)?
            .checked_add(self.base_rate_per_block)?;
        let excess_util = util.checked_sub(self.kink)?;
        excess_util
            .mul_exp(self.jump_multiplier_per_block)?
            .checked_add(normal_rate)
    }
}

/// Constant borrow rate regardless of utilization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedRateModel {
    pub rate_per_block: Exp,
}

impl InterestRateModel for FixedRateModel {
    fn borrow_rate(&self, _cash: Amount, _borrows: Amount, _reserves: Amount) -> Result<Exp, MathError> {
        Ok(self.rate_per_block)
    }
}

/// Rate model attached to a market ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateModel {
    Jump(JumpRateModel),
    Fixed(FixedRateModel),
}

impl RateModel {
    /// Fixed-rate model with a zero rate
    pub fn zero() -> Self {
        RateModel::Fixed(FixedRateModel {
            rate_per_block: Exp::ZERO,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            RateModel::Jump(_) => "jump_rate",
            RateModel::Fixed(_) => "fixed_rate",
        }
    }
}

impl InterestRateModel for RateModel {
    fn borrow_rate(&self, cash: Amount, borrows: Amount, reserves: Amount) -> Result<Exp, MathError> {
        match self {
            RateModel::Jump(model) => model.borrow_rate(cash, borrows, reserves),
            RateModel::Fixed(model) => model.borrow_rate(cash, borrows, reserves),
        }
    }
}
