//! CLI commands
//!
//! Amounts on the command line are whole-token decimals; every asset and
//! claim token carries 18 decimals.

use anyhow::Context;
use ironbank_core::{AccountId, Amount, AssetId, Exp, MarketId, MarketVersion};
use ironbank_ledger::{JumpRateModel, MarketSpec, RateModel};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::context::AppContext;

/// Whole-token decimal to base units
pub fn parse_units(value: Decimal) -> Result<Amount, anyhow::Error> {
    let exp = Exp::from_decimal(value).with_context(|| format!("invalid amount {}", value))?;
    Ok(Amount::from_raw(exp.mantissa()))
}

/// Like `parse_units`, but `max` selects the full outstanding balance
pub fn parse_amount(value: &str) -> Result<Amount, anyhow::Error> {
    if value.eq_ignore_ascii_case("max") {
        return Ok(Amount::MAX);
    }
    let decimal = Decimal::from_str(value).with_context(|| format!("invalid amount {}", value))?;
    parse_units(decimal)
}

/// Base units rendered as a whole-token decimal
pub fn format_units(amount: Amount) -> String {
    Exp::from_mantissa(amount.raw()).to_string()
}

fn ensure_initialized(ctx: &AppContext) -> Result<(), anyhow::Error> {
    if !ctx.is_initialized() {
        anyhow::bail!("Not initialized, run `ironbank init` first");
    }
    Ok(())
}

/// Write an empty protocol state
pub fn init(ctx: &mut AppContext) -> Result<(), anyhow::Error> {
    if ctx.is_initialized() {
        anyhow::bail!("Already initialized (block = {})", ctx.protocol.block_number());
    }
    ctx.commit()?;

    println!("✅ Initialized with admin {}", ctx.config.admin);
    Ok(())
}

/// Parameters of a new market, with annual jump-rate parameters
pub struct NewMarket<'a> {
    pub id: &'a str,
    pub underlying: &'a str,
    pub version: MarketVersion,
    pub base_rate: Decimal,
    pub multiplier: Decimal,
    pub jump_multiplier: Decimal,
    pub kink: Decimal,
    pub reserve_factor: Option<Decimal>,
}

/// Create an (unlisted) market
pub fn create_market(ctx: &mut AppContext, caller: &str, market: NewMarket<'_>) -> Result<(), anyhow::Error> {
    ensure_initialized(ctx)?;
    let model = JumpRateModel::from_annual(
        market.base_rate,
        market.multiplier,
        market.jump_multiplier,
        market.kink,
        ctx.config.blocks_per_year,
    )?;
    let spec = MarketSpec {
        id: MarketId::new(market.id),
        underlying: AssetId::new(market.underlying),
        version: market.version,
        rate_model: RateModel::Jump(model),
        initial_exchange_rate: Exp::from_decimal(ctx.config.initial_exchange_rate)?,
        reserve_factor: Exp::from_decimal(market.reserve_factor.unwrap_or(ctx.config.reserve_factor))?,
    };
    ctx.protocol.create_market(&AccountId::new(caller), spec)?;
    ctx.commit()?;

    println!(
        "✅ Created {} market {} over {}",
        market.version, market.id, market.underlying
    );
    Ok(())
}

pub fn list_market(ctx: &mut AppContext, caller: &str, market: &str) -> Result<(), anyhow::Error> {
    ensure_initialized(ctx)?;
    ctx.protocol
        .support_market(&AccountId::new(caller), &MarketId::new(market))?;
    ctx.commit()?;

    println!("✅ Listed {}", market);
    Ok(())
}

pub fn delist_market(ctx: &mut AppContext, caller: &str, market: &str, hard: bool) -> Result<(), anyhow::Error> {
    ensure_initialized(ctx)?;
    ctx.protocol
        .delist_market(&AccountId::new(caller), &MarketId::new(market), hard)?;
    ctx.commit()?;

    let mode = if hard { "Hard" } else { "Soft" };
    println!("✅ {} delisted {}", mode, market);
    Ok(())
}

/// Publish an underlying price for a market
pub fn set_price(ctx: &mut AppContext, market: &str, price: Decimal) -> Result<(), anyhow::Error> {
    ensure_initialized(ctx)?;
    ctx.oracle
        .set_price(MarketId::new(market), Exp::from_decimal(price)?);
    ctx.commit()?;

    println!("✅ Price of {} set to {}", market, price);
    Ok(())
}

pub fn set_collateral_factor(
    ctx: &mut AppContext,
    caller: &str,
    market: &str,
    factor: Decimal,
) -> Result<(), anyhow::Error> {
    ensure_initialized(ctx)?;
    ctx.protocol.set_collateral_factor(
        &AccountId::new(caller),
        &MarketId::new(market),
        Exp::from_decimal(factor)?,
    )?;
    ctx.commit()?;

    println!("✅ Collateral factor of {} set to {}", market, factor);
    Ok(())
}

/// Mint underlying (or native) out of thin air
pub fn faucet(ctx: &mut AppContext, account: &str, asset: &str, amount: Decimal) -> Result<(), anyhow::Error> {
    ensure_initialized(ctx)?;
    let asset = AssetId::new(asset);
    let account = AccountId::new(account);
    let units = parse_units(amount)?;
    if asset.is_native() {
        ctx.protocol.credit_native(&account, units)?;
    } else {
        ctx.protocol.credit_underlying(&asset, &account, units)?;
    }
    ctx.commit()?;

    println!("✅ Credited {} {} to {}", amount, asset, account);
    Ok(())
}

pub fn enter(ctx: &mut AppContext, account: &str, markets: &[String]) -> Result<(), anyhow::Error> {
    ensure_initialized(ctx)?;
    let markets: Vec<MarketId> = markets.iter().map(MarketId::new).collect();
    ctx.protocol.enter_markets(&AccountId::new(account), &markets)?;
    ctx.commit()?;

    println!("✅ {} entered {} market(s)", account, markets.len());
    Ok(())
}

pub fn exit(ctx: &mut AppContext, account: &str, market: &str) -> Result<(), anyhow::Error> {
    ensure_initialized(ctx)?;
    ctx.protocol
        .exit_market(&AccountId::new(account), &MarketId::new(market))?;
    ctx.commit()?;

    println!("✅ {} exited {}", account, market);
    Ok(())
}

pub fn mint(ctx: &mut AppContext, account: &str, market: &str, amount: Decimal) -> Result<(), anyhow::Error> {
    ensure_initialized(ctx)?;
    let tokens = ctx
        .protocol
        .mint(&AccountId::new(account), &MarketId::new(market), parse_units(amount)?)?;
    ctx.commit()?;

    println!("✅ {} supplied {} to {} for {} tokens", account, amount, market, format_units(tokens));
    Ok(())
}

/// Redeem claim tokens, or an exact underlying amount when `underlying` is set
pub fn redeem(
    ctx: &mut AppContext,
    account: &str,
    market: &str,
    amount: Decimal,
    underlying: bool,
) -> Result<(), anyhow::Error> {
    ensure_initialized(ctx)?;
    let account = AccountId::new(account);
    let market_id = MarketId::new(market);
    let units = parse_units(amount)?;
    let (tokens, paid) = if underlying {
        let tokens = ctx.protocol.redeem_underlying(&account, &market_id, units)?;
        (tokens, units)
    } else {
        let paid = ctx.protocol.redeem(&account, &market_id, units)?;
        (units, paid)
    };
    ctx.commit()?;

    println!(
        "✅ {} redeemed {} tokens of {} for {}",
        account,
        format_units(tokens),
        market,
        format_units(paid)
    );
    Ok(())
}

pub fn borrow(ctx: &mut AppContext, account: &str, market: &str, amount: Decimal) -> Result<(), anyhow::Error> {
    ensure_initialized(ctx)?;
    let update = ctx
        .protocol
        .borrow(&AccountId::new(account), &MarketId::new(market), parse_units(amount)?)?;
    ctx.commit()?;

    println!(
        "✅ {} borrowed {} from {} (owes {})",
        account,
        amount,
        market,
        format_units(update.account_borrows)
    );
    Ok(())
}

/// Repay `borrower`'s debt (the payer's own when `borrower` is `None`)
pub fn repay(
    ctx: &mut AppContext,
    payer: &str,
    borrower: Option<&str>,
    market: &str,
    amount: Amount,
) -> Result<(), anyhow::Error> {
    ensure_initialized(ctx)?;
    let payer = AccountId::new(payer);
    let borrower = borrower.map_or_else(|| payer.clone(), AccountId::new);
    let update = ctx
        .protocol
        .repay_borrow_behalf(&payer, &borrower, &MarketId::new(market), amount)?;
    ctx.commit()?;

    println!(
        "✅ {} repaid {} of {}'s {} debt (owes {})",
        payer,
        format_units(update.amount),
        borrower,
        market,
        format_units(update.account_borrows)
    );
    Ok(())
}

pub fn liquidate(
    ctx: &mut AppContext,
    liquidator: &str,
    borrower: &str,
    borrowed: &str,
    amount: Decimal,
    collateral: &str,
) -> Result<(), anyhow::Error> {
    ensure_initialized(ctx)?;
    let outcome = ctx.protocol.liquidate_borrow(
        &AccountId::new(liquidator),
        &AccountId::new(borrower),
        &MarketId::new(borrowed),
        parse_units(amount)?,
        &MarketId::new(collateral),
    )?;
    ctx.commit()?;

    println!(
        "✅ {} repaid {} {} for {}, seizing {} {} tokens",
        liquidator,
        format_units(outcome.repay_amount),
        borrowed,
        borrower,
        format_units(outcome.seize_tokens),
        collateral
    );
    Ok(())
}

pub fn advance(ctx: &mut AppContext, blocks: u64) -> Result<(), anyhow::Error> {
    ensure_initialized(ctx)?;
    let block = ctx.protocol.advance_blocks(blocks)?;
    ctx.commit()?;

    println!("✅ Advanced to block {}", block);
    Ok(())
}

/// Print an account's liquidity and shortfall
pub fn liquidity(ctx: &AppContext, account: &str) -> Result<(), anyhow::Error> {
    ensure_initialized(ctx)?;
    let account = AccountId::new(account);
    let liquidity = ctx.protocol.account_liquidity(&account)?;

    println!("📊 Liquidity for {}:", account);
    println!("   Liquidity: {}", format_units(liquidity.liquidity));
    println!("   Shortfall: {}", format_units(liquidity.shortfall));
    for market in ctx.protocol.comptroller().markets_of(&account) {
        let supplied = ctx.protocol.balance_of_underlying(market, &account)?;
        let borrowed = ctx.protocol.borrow_balance_stored(market, &account)?;
        println!(
            "   {}: supplied {}, borrowed {}",
            market,
            format_units(supplied),
            format_units(borrowed)
        );
    }
    Ok(())
}

/// Print a market's totals and rates
pub fn market(ctx: &AppContext, market: &str) -> Result<(), anyhow::Error> {
    ensure_initialized(ctx)?;
    let id = MarketId::new(market);
    let ledger = ctx.protocol.market(&id)?;
    let state = ledger.state();
    let registry = ctx.protocol.comptroller().registry();
    let collateral_factor = registry.get(&id).map_or(Exp::ZERO, |info| info.collateral_factor);

    println!("📊 {} ({} over {}):", id, ledger.version(), ledger.underlying());
    println!("   Listing: {}", registry.listing(&id));
    println!("   Collateral factor: {}", collateral_factor);
    println!("   Cash: {}", format_units(state.cash));
    println!("   Total borrows: {}", format_units(state.total_borrows));
    println!("   Total reserves: {}", format_units(state.total_reserves));
    println!("   Total supply: {}", format_units(state.total_supply));
    println!("   Exchange rate: {}", ctx.protocol.exchange_rate_stored(&id)?);
    println!("   Borrow rate/block: {}", ctx.protocol.borrow_rate_per_block(&id)?);
    println!("   Supply rate/block: {}", ctx.protocol.supply_rate_per_block(&id)?);
    println!("   Accrual block: {}", state.accrual_block);
    Ok(())
}
