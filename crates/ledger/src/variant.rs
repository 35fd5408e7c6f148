//! Ledger variants
//!
//! Plain ledgers count every claim token as collateral. Capped ledgers keep a
//! separate collateral sub-balance per account, bounded market-wide by a
//! collateral cap; tokens outside it form a buffer that is burned first.

use ironbank_core::{Amount, MarketVersion, MathError};
use serde::{Deserialize, Serialize};

use crate::state::AccountPosition;

/// Token bookkeeping that differs between ledger variants.
///
/// Methods that change the collateral sub-balance return the new
/// sub-balance so the caller can publish it.
pub trait TokenAccounting {
    /// Tokens counted as collateral by the risk engine
    fn collateral_tokens(&self, position: &AccountPosition) -> Amount;

    /// Part of a debit of `tokens` that comes out of collateral
    fn collateral_to_burn(&self, position: &AccountPosition, tokens: Amount) -> Result<Amount, MathError>;

    /// Add freshly received tokens. Members of the market also gain collateral.
    fn credit(
        &mut self,
        position: &mut AccountPosition,
        tokens: Amount,
        is_member: bool,
    ) -> Result<Option<Amount>, MathError>;

    /// Remove tokens, buffer first
    fn debit(&mut self, position: &mut AccountPosition, tokens: Amount) -> Result<Option<Amount>, MathError>;

    /// Promote the account's buffer to collateral on market entry
    fn register_collateral(&mut self, position: &mut AccountPosition) -> Result<Option<Amount>, MathError>;

    /// Drop all of the account's collateral back to buffer on market exit
    fn unregister_collateral(&mut self, position: &mut AccountPosition) -> Result<Option<Amount>, MathError>;
}

/// Ledger without a collateral sub-balance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainLedger {}

impl TokenAccounting for PlainLedger {
    fn collateral_tokens(&self, position: &AccountPosition) -> Amount {
        position.tokens
    }

    fn collateral_to_burn(&self, _position: &AccountPosition, tokens: Amount) -> Result<Amount, MathError> {
        Ok(tokens)
    }

    fn credit(
        &mut self,
        position: &mut AccountPosition,
        tokens: Amount,
        _is_member: bool,
    ) -> Result<Option<Amount>, MathError> {
        position.tokens = position.tokens.checked_add(tokens)?;
        Ok(None)
    }

    fn debit(&mut self, position: &mut AccountPosition, tokens: Amount) -> Result<Option<Amount>, MathError> {
        position.tokens = position.tokens.checked_sub(tokens)?;
        Ok(None)
    }

    fn register_collateral(&mut self, _position: &mut AccountPosition) -> Result<Option<Amount>, MathError> {
        Ok(None)
    }

    fn unregister_collateral(&mut self, _position: &mut AccountPosition) -> Result<Option<Amount>, MathError> {
        Ok(None)
    }
}

/// Ledger with a bounded collateral sub-balance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CappedLedger {
    /// Market-wide bound on collateral tokens; zero means unbounded
    pub collateral_cap: Amount,
    pub total_collateral_tokens: Amount,
}

impl CappedLedger {
    /// Grant up to `tokens` of collateral, limited by the remaining cap
    fn increase_collateral(
        &mut self,
        position: &mut AccountPosition,
        tokens: Amount,
    ) -> Result<Option<Amount>, MathError> {
        let requested = self.total_collateral_tokens.checked_add(tokens)?;
        let granted = if self.collateral_cap.is_zero() || requested <= self.collateral_cap {
            tokens
        } else if self.collateral_cap > self.total_collateral_tokens {
            self.collateral_cap.checked_sub(self.total_collateral_tokens)?
        } else {
            return Ok(None);
        };
        if granted.is_zero() {
            return Ok(None);
        }
        self.total_collateral_tokens = self.total_collateral_tokens.checked_add(granted)?;
        position.collateral_tokens = position.collateral_tokens.checked_add(granted)?;
        Ok(Some(position.collateral_tokens))
    }

    fn decrease_collateral(
        &mut self,
        position: &mut AccountPosition,
        tokens: Amount,
    ) -> Result<Option<Amount>, MathError> {
        if tokens.is_zero() {
            return Ok(None);
        }
        self.total_collateral_tokens = self.total_collateral_tokens.checked_sub(tokens)?;
        position.collateral_tokens = position.collateral_tokens.checked_sub(tokens)?;
        Ok(Some(position.collateral_tokens))
    }
}

impl TokenAccounting for CappedLedger {
    fn collateral_tokens(&self, position: &AccountPosition) -> Amount {
        position.collateral_tokens
    }

    fn collateral_to_burn(&self, position: &AccountPosition, tokens: Amount) -> Result<Amount, MathError> {
        let buffer = position.tokens.checked_sub(position.collateral_tokens)?;
        Ok(tokens.saturating_sub(buffer))
    }

    fn credit(
        &mut self,
        position: &mut AccountPosition,
        tokens: Amount,
        is_member: bool,
    ) -> Result<Option<Amount>, MathError> {
        position.tokens = position.tokens.checked_add(tokens)?;
        if is_member {
            self.increase_collateral(position, tokens)
        } else {
            Ok(None)
        }
    }

    fn debit(&mut self, position: &mut AccountPosition, tokens: Amount) -> Result<Option<Amount>, MathError> {
        let from_collateral = self.collateral_to_burn(position, tokens)?;
        let changed = self.decrease_collateral(position, from_collateral)?;
        position.tokens = position.tokens.checked_sub(tokens)?;
        Ok(changed)
    }

    fn register_collateral(&mut self, position: &mut AccountPosition) -> Result<Option<Amount>, MathError> {
        let buffer = position.tokens.checked_sub(position.collateral_tokens)?;
        self.increase_collateral(position, buffer)
    }

    fn unregister_collateral(&mut self, position: &mut AccountPosition) -> Result<Option<Amount>, MathError> {
        let collateral = position.collateral_tokens;
        self.decrease_collateral(position, collateral)
    }
}

/// Ledger variant, tagged by market version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "version", rename_all = "snake_case")]
pub enum Variant {
    Vanilla(PlainLedger),
    CollateralCap(CappedLedger),
    CollateralCapNoInterest(CappedLedger),
    WrappedNative(PlainLedger),
    CreditChecked(CappedLedger),
}

impl Variant {
    pub fn new(version: MarketVersion) -> Self {
        match version {
            MarketVersion::Vanilla => Variant::Vanilla(PlainLedger::default()),
            MarketVersion::CollateralCap => Variant::CollateralCap(CappedLedger::default()),
            MarketVersion::CollateralCapNoInterest => {
                Variant::CollateralCapNoInterest(CappedLedger::default())
            }
            MarketVersion::WrappedNative => Variant::WrappedNative(PlainLedger::default()),
            MarketVersion::CreditChecked => Variant::CreditChecked(CappedLedger::default()),
        }
    }

    pub fn version(&self) -> MarketVersion {
        match self {
            Variant::Vanilla(_) => MarketVersion::Vanilla,
            Variant::CollateralCap(_) => MarketVersion::CollateralCap,
            Variant::CollateralCapNoInterest(_) => MarketVersion::CollateralCapNoInterest,
            Variant::WrappedNative(_) => MarketVersion::WrappedNative,
            Variant::CreditChecked(_) => MarketVersion::CreditChecked,
        }
    }

    pub fn accounting(&self) -> &dyn TokenAccounting {
        match self {
            Variant::Vanilla(ledger) | Variant::WrappedNative(ledger) => ledger,
            Variant::CollateralCap(ledger)
            | Variant::CollateralCapNoInterest(ledger)
            | Variant::CreditChecked(ledger) => ledger,
        }
    }

    pub fn accounting_mut(&mut self) -> &mut dyn TokenAccounting {
        match self {
            Variant::Vanilla(ledger) | Variant::WrappedNative(ledger) => ledger,
            Variant::CollateralCap(ledger)
            | Variant::CollateralCapNoInterest(ledger)
            | Variant::CreditChecked(ledger) => ledger,
        }
    }

    /// Collateral bookkeeping, for capped variants only
    pub fn capped(&self) -> Option<&CappedLedger> {
        match self {
            Variant::CollateralCap(ledger)
            | Variant::CollateralCapNoInterest(ledger)
            | Variant::CreditChecked(ledger) => Some(ledger),
            Variant::Vanilla(_) | Variant::WrappedNative(_) => None,
        }
    }

    pub fn capped_mut(&mut self) -> Option<&mut CappedLedger> {
        match self {
            Variant::CollateralCap(ledger)
            | Variant::CollateralCapNoInterest(ledger)
            | Variant::CreditChecked(ledger) => Some(ledger),
            Variant::Vanilla(_) | Variant::WrappedNative(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(tokens: u128, collateral: u128) -> AccountPosition {
        AccountPosition {
            tokens: Amount::new(tokens),
            collateral_tokens: Amount::new(collateral),
            ..Default::default()
        }
    }

    #[test]
    fn test_plain_counts_everything() {
        let mut ledger = PlainLedger::default();
        let mut pos = AccountPosition::default();
        assert_eq!(ledger.credit(&mut pos, Amount::new(10), false).unwrap(), None);
        assert_eq!(ledger.collateral_tokens(&pos), Amount::new(10));
        assert_eq!(ledger.collateral_to_burn(&pos, Amount::new(4)).unwrap(), Amount::new(4));
    }

    #[test]
    fn test_capped_credit_respects_cap() {
        let mut ledger = CappedLedger {
            collateral_cap: Amount::new(100),
            total_collateral_tokens: Amount::new(80),
        };
        let mut pos = AccountPosition::default();

        let changed = ledger.credit(&mut pos, Amount::new(50), true).unwrap();
        assert_eq!(changed, Some(Amount::new(20)));
        assert_eq!(pos.tokens, Amount::new(50));
        assert_eq!(pos.collateral_tokens, Amount::new(20));
        assert_eq!(ledger.total_collateral_tokens, Amount::new(100));

        // Cap exhausted
        assert_eq!(ledger.credit(&mut pos, Amount::new(5), true).unwrap(), None);
        assert_eq!(pos.tokens, Amount::new(55));
    }

    #[test]
    fn test_capped_non_member_gets_buffer_only() {
        let mut ledger = CappedLedger::default();
        let mut pos = AccountPosition::default();
        assert_eq!(ledger.credit(&mut pos, Amount::new(50), false).unwrap(), None);
        assert_eq!(pos.collateral_tokens, Amount::ZERO);
        assert_eq!(ledger.total_collateral_tokens, Amount::ZERO);
    }

    #[test]
    fn test_capped_debit_burns_buffer_first() {
        let mut ledger = CappedLedger {
            collateral_cap: Amount::ZERO,
            total_collateral_tokens: Amount::new(60),
        };
        let mut pos = position(100, 60);

        assert_eq!(ledger.collateral_to_burn(&pos, Amount::new(30)).unwrap(), Amount::ZERO);
        assert_eq!(ledger.debit(&mut pos, Amount::new(30)).unwrap(), None);
        assert_eq!(pos.collateral_tokens, Amount::new(60));

        // 10 buffer left, so 15 of 25 come out of collateral
        assert_eq!(ledger.collateral_to_burn(&pos, Amount::new(25)).unwrap(), Amount::new(15));
        assert_eq!(ledger.debit(&mut pos, Amount::new(25)).unwrap(), Some(Amount::new(45)));
        assert_eq!(pos.tokens, Amount::new(45));
        assert_eq!(ledger.total_collateral_tokens, Amount::new(45));
    }

    #[test]
    fn test_register_and_unregister() {
        let mut ledger = CappedLedger {
            collateral_cap: Amount::new(70),
            total_collateral_tokens: Amount::ZERO,
        };
        let mut pos = position(100, 0);

        assert_eq!(ledger.register_collateral(&mut pos).unwrap(), Some(Amount::new(70)));
        assert_eq!(ledger.unregister_collateral(&mut pos).unwrap(), Some(Amount::ZERO));
        assert_eq!(ledger.total_collateral_tokens, Amount::ZERO);
        assert_eq!(pos.tokens, Amount::new(100));
    }

    #[test]
    fn test_variant_version_round_trip() {
        for version in [
            MarketVersion::Vanilla,
            MarketVersion::CollateralCap,
            MarketVersion::CollateralCapNoInterest,
            MarketVersion::WrappedNative,
            MarketVersion::CreditChecked,
        ] {
            let variant = Variant::new(version);
            assert_eq!(variant.version(), version);
            assert_eq!(variant.capped().is_some(), version.has_collateral_cap());
        }
    }
}
