//! Per-market re-entrancy guard

use ironbank_core::MarketId;
use strum_macros::Display;

use crate::error::LendingError;

/// Guard states; a ledger is `Idle` between operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ReentrancyGuard {
    #[default]
    Idle,
    Entered,
    InFlashloan,
}

impl ReentrancyGuard {
    pub fn enter(&mut self, market: &MarketId) -> Result<(), LendingError> {
        match self {
            ReentrancyGuard::Idle => {
                *self = ReentrancyGuard::Entered;
                Ok(())
            }
            _ => Err(LendingError::Reentered {
                market: market.clone(),
            }),
        }
    }

    /// Move from `Entered` to `InFlashloan` for the duration of a callback
    pub fn begin_flashloan(&mut self, market: &MarketId) -> Result<(), LendingError> {
        match self {
            ReentrancyGuard::Entered => {
                *self = ReentrancyGuard::InFlashloan;
                Ok(())
            }
            _ => Err(LendingError::Reentered {
                market: market.clone(),
            }),
        }
    }

    pub fn end_flashloan(&mut self) {
        if *self == ReentrancyGuard::InFlashloan {
            *self = ReentrancyGuard::Entered;
        }
    }

    pub fn exit(&mut self) {
        *self = ReentrancyGuard::Idle;
    }

    pub fn is_idle(&self) -> bool {
        *self == ReentrancyGuard::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_twice_fails() {
        let market = MarketId::new("crETH");
        let mut guard = ReentrancyGuard::default();
        guard.enter(&market).unwrap();
        assert_eq!(
            guard.enter(&market),
            Err(LendingError::Reentered { market: market.clone() })
        );
        guard.exit();
        assert!(guard.is_idle());
    }

    #[test]
    fn test_flashloan_blocks_entry() {
        let market = MarketId::new("crETH");
        let mut guard = ReentrancyGuard::default();
        guard.enter(&market).unwrap();
        guard.begin_flashloan(&market).unwrap();
        assert_eq!(guard.to_string(), "in_flashloan");
        assert!(guard.enter(&market).is_err());
        assert!(guard.begin_flashloan(&market).is_err());
        guard.end_flashloan();
        assert_eq!(guard, ReentrancyGuard::Entered);
    }
}
