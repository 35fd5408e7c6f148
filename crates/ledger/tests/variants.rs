//! Collateral caps, credit accounts, wrapped native and rate exclusions

mod common;

use common::*;
use ironbank_core::{Amount, AssetId, ErrorKind, MarketVersion};
use ironbank_events::ProtocolEvent;
use ironbank_ledger::{JumpRateModel, LendingError, RateModel};
use ironbank_risk::RiskError;
use rust_decimal_macros::dec;

#[test]
fn test_collateral_cap_splits_buffer_and_collateral() {
    let mut h = Harness::new();
    let dai = h.add_market("crDAI", "DAI", MarketVersion::CollateralCap, dec!(1), dec!(0.5), dec!(0));
    let admin = h.admin.clone();
    let alice = account("alice");
    let bob = account("bob");
    h.protocol.set_collateral_cap(&admin, &dai, Amount::new(100)).unwrap();

    h.protocol.enter_markets(&alice, &[dai.clone()]).unwrap();
    h.supply("DAI", &dai, &alice, Amount::new(150));
    assert_eq!(h.protocol.balance_of(&dai, &alice).unwrap(), Amount::new(150));
    assert_eq!(h.protocol.collateral_tokens_of(&dai, &alice).unwrap(), Amount::new(100));
    assert!(h.protocol.events().events().any(|e| *e
        == ProtocolEvent::UserCollateralChanged {
            market: dai.clone(),
            account: alice.clone(),
            new_collateral_tokens: Amount::new(100),
        }));

    // Cap is full
    h.protocol.enter_markets(&bob, &[dai.clone()]).unwrap();
    h.supply("DAI", &dai, &bob, Amount::new(10));
    assert_eq!(h.protocol.collateral_tokens_of(&dai, &bob).unwrap(), Amount::ZERO);

    // Buffer is burned before collateral
    h.protocol.redeem(&alice, &dai, Amount::new(50)).unwrap();
    assert_eq!(h.protocol.collateral_tokens_of(&dai, &alice).unwrap(), Amount::new(100));
    h.protocol.redeem(&alice, &dai, Amount::new(30)).unwrap();
    assert_eq!(h.protocol.collateral_tokens_of(&dai, &alice).unwrap(), Amount::new(70));

    let variant = h.protocol.market(&dai).unwrap().variant().capped().cloned().unwrap();
    assert_eq!(variant.total_collateral_tokens, Amount::new(70));
}

#[test]
fn test_collateral_registered_on_entry() {
    let mut h = Harness::new();
    let dai = h.add_market("crDAI", "DAI", MarketVersion::CollateralCap, dec!(1), dec!(0.5), dec!(0));
    let carol = account("carol");

    h.supply("DAI", &dai, &carol, Amount::new(20));
    assert_eq!(h.protocol.collateral_tokens_of(&dai, &carol).unwrap(), Amount::ZERO);

    h.protocol.enter_markets(&carol, &[dai.clone()]).unwrap();
    assert_eq!(h.protocol.collateral_tokens_of(&dai, &carol).unwrap(), Amount::new(20));

    h.protocol.exit_market(&carol, &dai).unwrap();
    assert_eq!(h.protocol.collateral_tokens_of(&dai, &carol).unwrap(), Amount::ZERO);
    assert_eq!(h.protocol.balance_of(&dai, &carol).unwrap(), Amount::new(20));
}

#[test]
fn test_buffer_tokens_do_not_back_borrows() {
    let mut h = Harness::new();
    let dai = h.add_market("crDAI", "DAI", MarketVersion::CollateralCap, dec!(1), dec!(0.5), dec!(0));
    let eth = h.add_market("crETH", "ETH", MarketVersion::Vanilla, dec!(1), dec!(0.5), dec!(0));
    let admin = h.admin.clone();
    let alice = account("alice");
    h.supply("ETH", &eth, &account("bob"), units(1000));
    h.protocol.set_collateral_cap(&admin, &dai, units(100)).unwrap();

    h.protocol.enter_markets(&alice, &[dai.clone()]).unwrap();
    h.supply("DAI", &dai, &alice, units(300));

    // Only 100 counts: 100 * 0.5 = 50
    let err = h.protocol.borrow(&alice, &eth, units(51)).unwrap_err();
    assert!(matches!(err, LendingError::Risk(RiskError::InsufficientLiquidity { .. })));
    h.protocol.borrow(&alice, &eth, units(50)).unwrap();

    // Buffer can still be moved freely
    h.protocol.transfer(&alice, &account("dave"), &dai, units(200)).unwrap();
    assert!(h.protocol.transfer(&alice, &account("dave"), &dai, units(1)).is_err());
}

#[test]
fn test_credit_account() {
    let mut h = Harness::new();
    let usdt = h.add_market("crUSDT", "USDT", MarketVersion::CreditChecked, dec!(1), dec!(0.5), dec!(0));
    let admin = h.admin.clone();
    let dave = account("dave");
    let bob = account("bob");
    h.supply("USDT", &usdt, &bob, units(1000));

    h.protocol.set_credit_limit(&admin, &dave, &usdt, units(500)).unwrap();
    assert!(h.protocol.comptroller().is_credit_account(&dave, &usdt));

    h.protocol.borrow(&dave, &usdt, units(400)).unwrap();
    let err = h.protocol.borrow(&dave, &usdt, units(101)).unwrap_err();
    assert!(matches!(err, LendingError::Risk(RiskError::CreditLimitExceeded { .. })));

    // Nobody else may repay or liquidate a credit account
    h.fund("USDT", &bob, units(10));
    let err = h.protocol.repay_borrow_behalf(&bob, &dave, &usdt, units(10)).unwrap_err();
    assert!(matches!(err, LendingError::Risk(RiskError::CreditAccountRepay { .. })));
    let err = h
        .protocol
        .liquidate_borrow(&bob, &dave, &usdt, units(10), &usdt)
        .unwrap_err();
    assert!(matches!(err, LendingError::Risk(RiskError::CreditAccountLiquidation { .. })));

    h.protocol.repay_borrow(&dave, &usdt, units(400)).unwrap();
    assert_eq!(h.protocol.borrow_balance_stored(&usdt, &dave).unwrap(), Amount::ZERO);
}

#[test]
fn test_wrapped_native() {
    let mut h = Harness::new();
    let weth = h.add_market("crWETH", "WETH", MarketVersion::WrappedNative, dec!(2), dec!(0.5), dec!(0));
    let alice = account("alice");
    let native = AssetId::native();
    h.protocol.credit_native(&alice, units(100)).unwrap();

    let tokens = h.protocol.mint_native(&alice, &weth, units(60)).unwrap();
    assert_eq!(tokens, units(60));
    assert_eq!(h.protocol.underlying_balance(&native, &alice), units(40));
    assert_eq!(h.balance("WETH", &weth.holder()), units(60));

    let paid = h.protocol.redeem_native(&alice, &weth, units(20)).unwrap();
    assert_eq!(paid, units(20));
    assert_eq!(h.protocol.underlying_balance(&native, &alice), units(60));

    // 40 tokens * 2 * 0.5 = 40 of value, i.e. 20 WETH
    h.protocol.enter_markets(&alice, &[weth.clone()]).unwrap();
    h.protocol.borrow_native(&alice, &weth, units(10)).unwrap();
    assert_eq!(h.protocol.underlying_balance(&native, &alice), units(70));
    assert_eq!(h.balance("WETH", &alice), Amount::ZERO);

    h.protocol.repay_borrow_native(&alice, &weth, Amount::MAX).unwrap();
    assert_eq!(h.protocol.underlying_balance(&native, &alice), units(60));
    assert_eq!(h.protocol.borrow_balance_stored(&weth, &alice).unwrap(), Amount::ZERO);

    let burned = h.protocol.redeem_underlying_native(&alice, &weth, units(5)).unwrap();
    assert_eq!(burned, units(5));
}

#[test]
fn test_native_entry_points_need_wrapped_market() {
    let mut h = Harness::new();
    let usdc = h.add_market("crUSDC", "USDC", MarketVersion::Vanilla, dec!(1), dec!(0.8), dec!(0));
    let alice = account("alice");
    h.protocol.credit_native(&alice, units(1)).unwrap();

    let err = h.protocol.mint_native(&alice, &usdc, units(1)).unwrap_err();
    assert!(matches!(err, LendingError::NativeNotSupported { .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn test_no_interest_market() {
    let mut h = Harness::new();
    let dai = h.add_market("crDAI", "DAI", MarketVersion::CollateralCapNoInterest, dec!(1), dec!(0.5), dec!(0.0001));
    let alice = account("alice");
    h.supply("DAI", &dai, &account("bob"), units(1000));
    h.supply("DAI", &dai, &alice, units(1000));
    h.protocol.enter_markets(&alice, &[dai.clone()]).unwrap();
    h.protocol.borrow(&alice, &dai, units(100)).unwrap();

    h.advance(1000);
    assert_eq!(h.protocol.borrow_balance_current(&dai, &alice).unwrap(), units(100));
    assert_eq!(h.protocol.market(&dai).unwrap().state().accrual_block, 1000);
    assert_eq!(h.protocol.exchange_rate_stored(&dai).unwrap(), exp(dec!(1)));
}

#[test]
fn test_rate_exclusions() {
    let mut h = Harness::new();
    let usdc = h.add_market("crUSDC", "USDC", MarketVersion::Vanilla, dec!(1), dec!(0.8), dec!(0));
    let model = RateModel::Jump(JumpRateModel {
        base_rate_per_block: exp(dec!(0)),
        multiplier_per_block: exp(dec!(0.0001)),
        jump_multiplier_per_block: exp(dec!(0.0004)),
        kink: exp(dec!(0.8)),
    });
    let eth = h.add_market_with_model("crETH", "ETH", MarketVersion::Vanilla, dec!(1), dec!(0.5), model);
    let admin = h.admin.clone();
    let alice = account("alice");
    let evil = account("evil");
    h.supply("ETH", &eth, &account("bob"), units(1000));
    for who in [&alice, &evil] {
        h.supply("USDC", &usdc, who, units(1000));
        h.protocol.enter_markets(who, &[usdc.clone()]).unwrap();
    }
    h.protocol.borrow(&alice, &eth, units(100)).unwrap();
    h.protocol.borrow(&evil, &eth, units(500)).unwrap();

    // 600 / 1000 utilization
    assert_eq!(h.protocol.borrow_rate_per_block(&eth).unwrap(), exp(dec!(0.00006)));

    h.protocol.set_rate_exclusions(&admin, &eth, vec![evil.clone()]).unwrap();
    // 100 / (400 + 100)
    assert_eq!(h.protocol.borrow_rate_per_block(&eth).unwrap(), exp(dec!(0.00002)));

    // Interest still accrues on every borrow
    h.advance(10);
    h.protocol.accrue_interest(&eth).unwrap();
    let state = h.protocol.market(&eth).unwrap().state().clone();
    assert_eq!(state.total_borrows, Amount::new(600_120_000_000_000_000_000));
    assert_eq!(
        h.protocol.borrow_balance_stored(&eth, &evil).unwrap(),
        Amount::new(500_100_000_000_000_000_000)
    );
}

#[test]
fn test_delist_lifecycle() {
    let mut h = Harness::new();
    let usdc = h.add_market("crUSDC", "USDC", MarketVersion::Vanilla, dec!(1), dec!(0.8), dec!(0));
    let admin = h.admin.clone();
    let alice = account("alice");
    h.supply("USDC", &usdc, &alice, units(100));

    let err = h.protocol.delist_market(&admin, &usdc, false).unwrap_err();
    assert!(matches!(err, LendingError::Risk(RiskError::MarketNotPaused { .. })));

    for action in [
        ironbank_core::PauseAction::Mint,
        ironbank_core::PauseAction::Borrow,
        ironbank_core::PauseAction::Flashloan,
    ] {
        h.protocol.set_market_paused(&admin, &usdc, action, true).unwrap();
    }
    let err = h.protocol.delist_market(&admin, &usdc, false).unwrap_err();
    assert!(matches!(err, LendingError::Risk(RiskError::MarketHasCollateral { .. })));

    h.protocol.set_collateral_factor(&admin, &usdc, exp(dec!(0))).unwrap();
    let err = h.protocol.delist_market(&admin, &usdc, true).unwrap_err();
    assert!(matches!(err, LendingError::Risk(RiskError::InvalidListingTransition { .. })));
    h.protocol.delist_market(&admin, &usdc, false).unwrap();

    // Soft-delisted markets still let suppliers out
    h.protocol.redeem(&alice, &usdc, units(50)).unwrap();
    let err = h.protocol.mint(&alice, &usdc, units(1)).unwrap_err();
    assert!(matches!(err, LendingError::Risk(RiskError::ActionPaused { .. })));

    h.protocol.delist_market(&admin, &usdc, true).unwrap();
    assert!(h.protocol.redeem(&alice, &usdc, units(10)).is_err());
}

#[test]
fn test_admin_only_setters() {
    let mut h = Harness::new();
    let usdc = h.add_market("crUSDC", "USDC", MarketVersion::Vanilla, dec!(1), dec!(0.8), dec!(0));
    let mallory = account("mallory");

    let errors = vec![
        h.protocol.set_close_factor(&mallory, exp(dec!(0.6))).unwrap_err(),
        h.protocol.set_liquidation_incentive(&mallory, exp(dec!(1.1))).unwrap_err(),
        h.protocol.set_collateral_factor(&mallory, &usdc, exp(dec!(0.5))).unwrap_err(),
        h.protocol.set_interest_rate_model(&mallory, &usdc, RateModel::zero()).unwrap_err(),
        h.protocol.set_market_comptroller(&mallory, &usdc, "other").unwrap_err(),
        h.protocol.set_rate_exclusions(&mallory, &usdc, vec![]).unwrap_err(),
    ];
    for err in errors {
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }
}

#[test]
fn test_comptroller_mismatch_blocks_seize() {
    let mut h = Harness::new();
    let usdc = h.add_market("crUSDC", "USDC", MarketVersion::Vanilla, dec!(1), dec!(0.8), dec!(0));
    let eth = h.add_market("crETH", "ETH", MarketVersion::Vanilla, dec!(2), dec!(0.75), dec!(0));
    let admin = h.admin.clone();
    let alice = account("alice");
    let carol = account("carol");
    h.supply("ETH", &eth, &account("bob"), units(1000));
    h.supply("USDC", &usdc, &alice, units(1000));
    h.protocol.enter_markets(&alice, &[usdc.clone()]).unwrap();
    h.protocol.borrow(&alice, &eth, units(400)).unwrap();
    h.fund("ETH", &carol, units(100));
    h.set_price(&eth, dec!(2.5));

    h.protocol.set_market_comptroller(&admin, &usdc, "elsewhere").unwrap();
    let err = h
        .protocol
        .liquidate_borrow(&carol, &alice, &eth, units(100), &usdc)
        .unwrap_err();
    assert!(matches!(err, LendingError::Risk(RiskError::ComptrollerMismatch { .. })));
}
