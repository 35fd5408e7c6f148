//! Ledger state records

use ironbank_core::{Amount, Exp};
use serde::{Deserialize, Serialize};

/// Market-wide accounting totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Underlying held by the market, tracked internally
    pub cash: Amount,
    pub total_borrows: Amount,
    pub total_reserves: Amount,
    /// Claim tokens outstanding
    pub total_supply: Amount,
    /// Cumulative interest index, starts at 1.0
    pub borrow_index: Exp,
    pub accrual_block: u64,
    pub reserve_factor: Exp,
    pub initial_exchange_rate: Exp,
}

impl LedgerState {
    pub fn new(initial_exchange_rate: Exp, reserve_factor: Exp, block: u64) -> Self {
        Self {
            cash: Amount::ZERO,
            total_borrows: Amount::ZERO,
            total_reserves: Amount::ZERO,
            total_supply: Amount::ZERO,
            borrow_index: Exp::ONE,
            accrual_block: block,
            reserve_factor,
            initial_exchange_rate,
        }
    }

    /// `cash + borrows - reserves`
    pub fn supplied(&self) -> Result<Amount, ironbank_core::MathError> {
        self.cash.add_then_sub(self.total_borrows, self.total_reserves)
    }
}

/// Borrow principal together with the index it was last updated at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BorrowSnapshot {
    pub principal: Amount,
    pub interest_index: Exp,
}

/// One account's position in one market
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountPosition {
    pub tokens: Amount,
    /// Portion of `tokens` counted as collateral; only used by capped markets
    pub collateral_tokens: Amount,
    pub borrow: BorrowSnapshot,
}

impl AccountPosition {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_zero() && self.borrow.principal.is_zero()
    }
}
