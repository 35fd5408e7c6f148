//! Flashloans, fees and re-entrancy

mod common;

use common::*;
use ironbank_core::{AccountId, Amount, AssetId, ErrorKind, MarketId, MarketVersion};
use ironbank_ledger::{FlashloanReceiver, LendingError, Protocol};
use ironbank_risk::RiskError;
use rust_decimal_macros::dec;

/// Pays back `amount + fee` (or less, when `shortfall` is set)
struct Repayer {
    account: AccountId,
    shortfall: Amount,
    seen: Vec<(Amount, Amount)>,
}

impl Repayer {
    fn new(name: &str) -> Self {
        Self {
            account: account(name),
            shortfall: Amount::ZERO,
            seen: Vec::new(),
        }
    }
}

impl FlashloanReceiver for Repayer {
    fn account(&self) -> AccountId {
        self.account.clone()
    }

    fn on_flashloan(
        &mut self,
        protocol: &mut Protocol,
        market: &MarketId,
        asset: &AssetId,
        amount: Amount,
        fee: Amount,
        _data: &[u8],
    ) -> Result<(), LendingError> {
        self.seen.push((amount, fee));
        let owed = amount.checked_add(fee)?.checked_sub(self.shortfall)?;
        protocol.transfer_underlying(asset, &self.account, &market.holder(), owed)
    }
}

/// Tries to re-enter the lending market from inside the callback
struct Reenterer {
    account: AccountId,
    attempts: Vec<Result<(), LendingError>>,
}

impl FlashloanReceiver for Reenterer {
    fn account(&self) -> AccountId {
        self.account.clone()
    }

    fn on_flashloan(
        &mut self,
        protocol: &mut Protocol,
        market: &MarketId,
        asset: &AssetId,
        amount: Amount,
        fee: Amount,
        _data: &[u8],
    ) -> Result<(), LendingError> {
        let mut nested = Repayer::new("nested");
        self.attempts
            .push(protocol.flashloan(&mut nested, market, Amount::new(1), &[]));
        self.attempts
            .push(protocol.mint(&self.account, market, Amount::new(1)).map(|_| ()));
        self.attempts.push(
            protocol
                .repay_borrow(&self.account, market, Amount::new(1))
                .map(|_| ()),
        );
        self.attempts.push(
            protocol
                .redeem(&self.account, market, Amount::new(1))
                .map(|_| ()),
        );

        let owed = amount.checked_add(fee)?;
        protocol.transfer_underlying(asset, &self.account, &market.holder(), owed)
    }
}

/// Lets blocks pass inside the callback and tries to accrue on the loan
struct Accruer {
    account: AccountId,
    attempts: Vec<Result<Amount, LendingError>>,
}

impl FlashloanReceiver for Accruer {
    fn account(&self) -> AccountId {
        self.account.clone()
    }

    fn on_flashloan(
        &mut self,
        protocol: &mut Protocol,
        market: &MarketId,
        asset: &AssetId,
        amount: Amount,
        fee: Amount,
        _data: &[u8],
    ) -> Result<(), LendingError> {
        protocol.advance_blocks(100)?;
        self.attempts
            .push(protocol.accrue_interest(market).map(|_| Amount::ZERO));
        self.attempts.push(protocol.total_borrows_current(market));

        let owed = amount.checked_add(fee)?;
        protocol.transfer_underlying(asset, &self.account, &market.holder(), owed)
    }
}

fn dai_market() -> Harness {
    let mut h = Harness::new();
    let dai = h.add_market("crDAI", "DAI", MarketVersion::CollateralCap, dec!(1), dec!(0.5), dec!(0));
    h.supply("DAI", &dai, &account("bob"), units(1_000_000));
    h
}

#[test]
fn test_flashloan_fee_goes_to_suppliers_and_reserves() {
    let mut h = dai_market();
    let dai = market("crDAI");
    let mut receiver = Repayer::new("arb");
    h.fund("DAI", &receiver.account, units(3));

    h.protocol
        .flashloan(&mut receiver, &dai, units(10_000), b"payload")
        .unwrap();

    // 3 bps of 10_000
    assert_eq!(receiver.seen, vec![(units(10_000), units(3))]);
    let state = h.protocol.market(&dai).unwrap().state().clone();
    assert_eq!(state.cash, units(1_000_003));
    assert_eq!(state.total_reserves, Amount::new(300_000_000_000_000_000));
    assert_eq!(state.total_borrows, Amount::ZERO);
    assert_eq!(h.balance("DAI", &receiver.account), Amount::ZERO);
    assert_eq!(h.balance("DAI", &dai.holder()), units(1_000_003));

    // (1_000_003 - 0.3) / 1_000_000
    assert_eq!(h.protocol.exchange_rate_stored(&dai).unwrap(), exp(dec!(1.0000027)));
    assert!(h.protocol.market(&dai).unwrap().guard().is_idle());
}

#[test]
fn test_flashloan_must_be_repaid() {
    let mut h = dai_market();
    let dai = market("crDAI");
    let mut receiver = Repayer::new("arb");
    receiver.shortfall = Amount::new(1);
    h.fund("DAI", &receiver.account, units(3));
    let before = h.state_json();

    let err = h
        .protocol
        .flashloan(&mut receiver, &dai, units(10_000), &[])
        .unwrap_err();
    assert!(matches!(err, LendingError::FlashloanNotRepaid { .. }));
    assert_eq!(err.kind(), ErrorKind::PolicyRejection);
    assert_eq!(h.state_json(), before);
    assert_eq!(h.balance("DAI", &receiver.account), units(3));
}

#[test]
fn test_flashloan_rejects_reentry() {
    let mut h = dai_market();
    let dai = market("crDAI");
    let mut receiver = Reenterer {
        account: account("attacker"),
        attempts: Vec::new(),
    };
    h.fund("DAI", &receiver.account, units(10));

    h.protocol
        .flashloan(&mut receiver, &dai, units(1_000), &[])
        .unwrap();

    assert_eq!(receiver.attempts.len(), 4);
    for attempt in &receiver.attempts {
        let err = attempt.as_ref().unwrap_err();
        assert_eq!(err, &LendingError::Reentered { market: dai.clone() });
        assert_eq!(err.kind(), ErrorKind::ReentrancyFault);
    }
    // Failed inner calls left the outer loan intact
    assert_eq!(
        h.protocol.cash(&dai).unwrap(),
        Amount::new(1_000_000_300_000_000_000_000_000)
    );
}

#[test]
fn test_flashloan_limits() {
    let mut h = dai_market();
    let dai = market("crDAI");
    let mut receiver = Repayer::new("arb");

    let err = h.protocol.flashloan(&mut receiver, &dai, Amount::ZERO, &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = h
        .protocol
        .flashloan(&mut receiver, &dai, units(1_000_001), &[])
        .unwrap_err();
    assert!(matches!(err, LendingError::InsufficientCash { .. }));
    assert!(receiver.seen.is_empty());
}

#[test]
fn test_flashloan_capped_by_holder_balance() {
    let mut h = dai_market();
    let dai = market("crDAI");
    let asset = AssetId::new("DAI");
    let mut receiver = Repayer::new("arb");
    h.fund("DAI", &receiver.account, units(150));

    // Custody now holds less than the market's recorded cash
    h.protocol
        .transfer_underlying(&asset, &dai.holder(), &account("drain"), units(400_000))
        .unwrap();
    assert_eq!(h.protocol.cash(&dai).unwrap(), units(1_000_000));

    let err = h
        .protocol
        .flashloan(&mut receiver, &dai, units(700_000), &[])
        .unwrap_err();
    assert_eq!(
        err,
        LendingError::InsufficientCash {
            market: dai.clone(),
            available: units(600_000).to_string(),
            required: units(700_000).to_string(),
        }
    );
    assert!(receiver.seen.is_empty());

    h.protocol
        .flashloan(&mut receiver, &dai, units(500_000), &[])
        .unwrap();
    assert_eq!(receiver.seen, vec![(units(500_000), units(150))]);
}

#[test]
fn test_flashloan_callback_cannot_accrue() {
    let mut h = Harness::new();
    let dai = h.add_market("crDAI", "DAI", MarketVersion::CollateralCap, dec!(1), dec!(0.5), dec!(0.0001));
    h.supply("DAI", &dai, &account("bob"), units(1_000_000));
    let mut receiver = Accruer {
        account: account("arb"),
        attempts: Vec::new(),
    };
    h.fund("DAI", &receiver.account, units(300));

    h.protocol
        .flashloan(&mut receiver, &dai, units(1_000_000), &[])
        .unwrap();

    assert_eq!(receiver.attempts.len(), 2);
    for attempt in &receiver.attempts {
        assert_eq!(attempt, &Err(LendingError::Reentered { market: dai.clone() }));
    }
    // Nothing accrued on the parked loan; the next accrual starts from here
    let state = h.protocol.market(&dai).unwrap().state().clone();
    assert_eq!(state.total_borrows, Amount::ZERO);
    assert_eq!(state.accrual_block, 0);
    h.protocol.accrue_interest(&dai).unwrap();
    assert_eq!(h.protocol.market(&dai).unwrap().state().total_borrows, Amount::ZERO);
}

#[test]
fn test_vanilla_market_has_no_flashloans() {
    let mut h = Harness::new();
    let usdc = h.add_market("crUSDC", "USDC", MarketVersion::Vanilla, dec!(1), dec!(0.8), dec!(0));
    h.supply("USDC", &usdc, &account("bob"), units(100));
    let mut receiver = Repayer::new("arb");

    let err = h.protocol.flashloan(&mut receiver, &usdc, units(10), &[]).unwrap_err();
    assert!(matches!(err, LendingError::Risk(RiskError::FlashloanNotSupported { .. })));
}

#[test]
fn test_flashloan_pause() {
    let mut h = dai_market();
    let dai = market("crDAI");
    let admin = h.admin.clone();
    h.protocol
        .set_market_paused(&admin, &dai, ironbank_core::PauseAction::Flashloan, true)
        .unwrap();
    let mut receiver = Repayer::new("arb");

    let err = h.protocol.flashloan(&mut receiver, &dai, units(10), &[]).unwrap_err();
    assert!(matches!(err, LendingError::Risk(RiskError::ActionPaused { .. })));
}
