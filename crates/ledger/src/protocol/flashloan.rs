//! Flashloans
//!
//! The receiver gets the loan, runs arbitrary protocol calls in its callback
//! and must leave the market holding the loan plus fee when it returns.
//! The market stays locked for the whole callback.

use ironbank_core::{AccountId, Amount, AssetId, MarketId};
use ironbank_events::ProtocolEvent;

use super::Protocol;
use crate::error::LendingError;

/// Callback target for a flashloan
pub trait FlashloanReceiver {
    /// Account that receives the loan and pays it back
    fn account(&self) -> AccountId;

    /// Called after `amount` of `asset` has been sent to `account()`.
    /// Must return `amount + fee` to `market.holder()` before returning.
    fn on_flashloan(
        &mut self,
        protocol: &mut Protocol,
        market: &MarketId,
        asset: &AssetId,
        amount: Amount,
        fee: Amount,
        data: &[u8],
    ) -> Result<(), LendingError>;
}

const BPS_DENOMINATOR: u128 = 10_000;

impl Protocol {
    /// Fee charged on a flashloan of `amount`
    pub fn flashloan_fee(&self, amount: Amount) -> Result<Amount, LendingError> {
        let bps = Amount::from(u64::from(self.state.limits.flashloan_fee_bps));
        Ok(amount
            .checked_mul(bps)?
            .checked_div(Amount::new(BPS_DENOMINATOR))?)
    }

    pub fn flashloan(
        &mut self,
        receiver: &mut dyn FlashloanReceiver,
        market: &MarketId,
        amount: Amount,
        data: &[u8],
    ) -> Result<(), LendingError> {
        self.atomically("flashloan", |p| {
            p.guarded(market, |p| p.flashloan_inner(receiver, market, amount, data))
        })
    }

    fn flashloan_inner(
        &mut self,
        receiver: &mut dyn FlashloanReceiver,
        market: &MarketId,
        amount: Amount,
        data: &[u8],
    ) -> Result<(), LendingError> {
        if amount.is_zero() {
            return Err(LendingError::InvalidInput("flashloan amount is zero".to_string()));
        }
        let receiver_account = receiver.account();
        self.accrue(market)?;

        let holder = market.holder();
        let total_fee = self.flashloan_fee(amount)?;
        let s = &mut self.state;
        let ledger = s.book.get(market)?;
        let asset = ledger.underlying().clone();
        let balance_before = s.bank.balance_of(&asset, &holder);
        let lendable = balance_before.min(ledger.state().cash);
        if amount > lendable {
            return Err(LendingError::InsufficientCash {
                market: market.clone(),
                available: lendable.to_string(),
                required: amount.to_string(),
            });
        }
        let reserves_fee = ledger.state().reserve_factor.mul_scalar_truncate(total_fee)?;
        s.comptroller.flashloan_allowed(market, &receiver_account, amount)?;

        let ledger = s.book.get_mut(market)?;
        ledger.lend_flashloan(amount)?;
        ledger.guard.begin_flashloan(market)?;
        s.bank.transfer(&asset, &holder, &receiver_account, amount)?;

        tracing::debug!(market = %market, receiver = %receiver_account, amount = %amount, fee = %total_fee, "Flashloan callback");
        receiver.on_flashloan(self, market, &asset, amount, total_fee, data)?;

        let s = &mut self.state;
        let expected = balance_before.checked_add(total_fee)?;
        let actual = s.bank.balance_of(&asset, &holder);
        if actual < expected {
            return Err(LendingError::FlashloanNotRepaid {
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }

        let ledger = s.book.get_mut(market)?;
        ledger.guard.end_flashloan();
        ledger.settle_flashloan(amount, total_fee, reserves_fee)?;

        tracing::info!(market = %market, receiver = %receiver_account, amount = %amount, fee = %total_fee, "Flashloan repaid");
        s.events.emit(ProtocolEvent::Flashloan {
            market: market.clone(),
            receiver: receiver_account,
            amount,
            total_fee,
            reserves_fee,
        });
        Ok(())
    }
}
