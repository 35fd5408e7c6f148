//! Liquidation through the protocol

mod common;

use common::*;
use ironbank_core::{Amount, ErrorKind, MarketVersion, PauseAction};
use ironbank_events::ProtocolEvent;
use ironbank_ledger::LendingError;
use ironbank_risk::RiskError;
use rust_decimal_macros::dec;

/// alice: 1000 USDC collateral (cf 0.8), 400 ETH borrowed at price 2.
/// carol holds 500 ETH to liquidate with.
fn underwater() -> Harness {
    let mut h = Harness::new();
    let usdc = h.add_market("crUSDC", "USDC", MarketVersion::Vanilla, dec!(1), dec!(0.8), dec!(0));
    let eth = h.add_market("crETH", "ETH", MarketVersion::Vanilla, dec!(2), dec!(0.75), dec!(0));
    let alice = account("alice");

    h.supply("ETH", &eth, &account("bob"), units(1000));
    h.supply("USDC", &usdc, &alice, units(1000));
    h.protocol.enter_markets(&alice, &[usdc]).unwrap();
    h.protocol.borrow(&alice, &eth, units(400)).unwrap();
    h.fund("ETH", &account("carol"), units(500));

    // Borrow now worth 1000 against 800 of collateral
    h.set_price(&eth, dec!(2.5));
    h
}

#[test]
fn test_liquidate_seizes_at_incentive() {
    let mut h = underwater();
    let usdc = market("crUSDC");
    let eth = market("crETH");
    let alice = account("alice");
    let carol = account("carol");

    let shortfall = h.protocol.account_liquidity(&alice).unwrap().shortfall;
    assert_eq!(shortfall, units(200));

    let result = h
        .protocol
        .liquidate_borrow(&carol, &alice, &eth, units(100), &usdc)
        .unwrap();

    // 100 * 1.08 * 2.5 / (1 * 1)
    assert_eq!(result.repay_amount, units(100));
    assert_eq!(result.seize_tokens, units(270));
    assert_eq!(
        h.protocol
            .liquidate_calculate_seize_tokens(&eth, &usdc, units(100))
            .unwrap(),
        units(270)
    );
    assert_eq!(h.protocol.borrow_balance_stored(&eth, &alice).unwrap(), units(300));
    assert_eq!(h.protocol.balance_of(&usdc, &alice).unwrap(), units(730));
    assert_eq!(h.protocol.balance_of(&usdc, &carol).unwrap(), units(270));
    assert_eq!(h.balance("ETH", &carol), units(400));

    let last = h.protocol.events().events().last().unwrap().clone();
    assert_eq!(
        last,
        ProtocolEvent::LiquidateBorrow {
            market: eth,
            liquidator: carol,
            borrower: alice,
            repay_amount: units(100),
            collateral_market: usdc,
            seize_tokens: units(270),
        }
    );
}

#[test]
fn test_close_factor_caps_repay() {
    let mut h = underwater();
    let usdc = market("crUSDC");
    let eth = market("crETH");

    // Close factor 0.5 of 400
    let err = h
        .protocol
        .liquidate_borrow(&account("carol"), &account("alice"), &eth, units(201), &usdc)
        .unwrap_err();
    assert!(matches!(err, LendingError::Risk(RiskError::TooMuchRepay { .. })));
}

#[test]
fn test_healthy_account_cannot_be_liquidated() {
    let mut h = underwater();
    let usdc = market("crUSDC");
    let eth = market("crETH");
    h.set_price(&eth, dec!(2));

    let err = h
        .protocol
        .liquidate_borrow(&account("carol"), &account("alice"), &eth, units(10), &usdc)
        .unwrap_err();
    assert!(matches!(err, LendingError::Risk(RiskError::InsufficientShortfall { .. })));
}

#[test]
fn test_liquidation_input_checks() {
    let mut h = underwater();
    let usdc = market("crUSDC");
    let eth = market("crETH");
    let alice = account("alice");
    let carol = account("carol");

    let err = h.protocol.liquidate_borrow(&alice, &alice, &eth, units(10), &usdc).unwrap_err();
    assert_eq!(err, LendingError::LiquidatorIsBorrower);

    let err = h
        .protocol
        .liquidate_borrow(&carol, &alice, &eth, Amount::ZERO, &usdc)
        .unwrap_err();
    assert_eq!(err, LendingError::InvalidRepayAmount);

    let err = h
        .protocol
        .liquidate_borrow(&carol, &alice, &eth, Amount::MAX, &usdc)
        .unwrap_err();
    assert_eq!(err, LendingError::InvalidRepayAmount);
}

#[test]
fn test_liquidate_fresh_on_stale_market() {
    let mut h = underwater();
    let usdc = market("crUSDC");
    let eth = market("crETH");
    h.advance(1);

    let err = h
        .protocol
        .liquidate_borrow_fresh(&account("carol"), &account("alice"), &eth, units(10), &usdc)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Staleness);

    // Accruing entry point succeeds on the same block
    h.protocol
        .liquidate_borrow(&account("carol"), &account("alice"), &eth, units(10), &usdc)
        .unwrap();
}

#[test]
fn test_seize_pause_blocks_liquidation() {
    let mut h = underwater();
    let usdc = market("crUSDC");
    let eth = market("crETH");
    let admin = h.admin.clone();
    h.protocol.set_global_paused(&admin, PauseAction::Seize, true).unwrap();
    let before = h.state_json();

    let err = h
        .protocol
        .liquidate_borrow(&account("carol"), &account("alice"), &eth, units(10), &usdc)
        .unwrap_err();
    assert!(matches!(err, LendingError::Risk(RiskError::ActionPaused { .. })));
    // The repayment made before the seize check is undone
    assert_eq!(h.state_json(), before);
}

#[test]
fn test_same_market_liquidation() {
    let mut h = Harness::new();
    let eth = h.add_market("crETH", "ETH", MarketVersion::Vanilla, dec!(1), dec!(0.5), dec!(0));
    let alice = account("alice");
    let carol = account("carol");

    h.supply("ETH", &eth, &alice, units(100));
    h.protocol.enter_markets(&alice, &[eth.clone()]).unwrap();
    h.protocol.borrow(&alice, &eth, units(50)).unwrap();
    let admin = h.admin.clone();
    h.protocol
        .set_collateral_factor(&admin, &eth, exp(dec!(0.4)))
        .unwrap();
    h.fund("ETH", &carol, units(25));

    let result = h.protocol.liquidate_borrow(&carol, &alice, &eth, units(25), &eth).unwrap();
    // 25 * 1.08 at exchange rate 1
    assert_eq!(result.seize_tokens, Amount::new(27 * WAD));
    assert_eq!(h.protocol.balance_of(&eth, &carol).unwrap(), units(27));
}

#[test]
fn test_liquidation_at_fractional_price() {
    let mut h = Harness::new();
    let usdc = h.add_market("crUSDC", "USDC", MarketVersion::Vanilla, dec!(1), dec!(0.5), dec!(0));
    let eth = h.add_market("crETH", "ETH", MarketVersion::Vanilla, dec!(1), dec!(0.75), dec!(0));
    let alice = account("alice");
    let carol = account("carol");

    h.supply("ETH", &eth, &account("bob"), Amount::new(100));
    h.supply("USDC", &usdc, &alice, Amount::new(10));
    h.protocol.enter_markets(&alice, &[usdc.clone()]).unwrap();
    h.protocol.borrow(&alice, &eth, Amount::new(4)).unwrap();
    h.fund("ETH", &carol, Amount::new(10));

    // floor(4 * 1.5) = 6 of debt against 5 of collateral
    h.set_price(&eth, dec!(1.5));
    assert_eq!(h.protocol.account_liquidity(&alice).unwrap().shortfall, Amount::new(1));

    let result = h
        .protocol
        .liquidate_borrow(&carol, &alice, &eth, Amount::new(1), &usdc)
        .unwrap();
    assert_eq!(result.repay_amount, Amount::new(1));
    assert_eq!(h.protocol.borrow_balance_stored(&eth, &alice).unwrap(), Amount::new(3));
    assert_eq!(h.protocol.balance_of(&usdc, &carol).unwrap(), result.seize_tokens);
}
