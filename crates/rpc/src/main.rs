//! Iron Bank CLI - Main entry point

use clap::{Parser, Subcommand};
use ironbank_core::MarketVersion;
use ironbank_rpc::{commands, AppContext};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ironbank")]
#[command(about = "Iron Bank - over-collateralized lending engine", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize an empty protocol in the data directory
    Init,

    /// Create an unlisted market
    CreateMarket {
        /// Market ID (e.g. crUSDC)
        market: String,
        /// Underlying asset code
        underlying: String,
        /// Ledger variant
        #[arg(long, default_value = "vanilla")]
        version: MarketVersion,
        /// Annual base borrow rate
        #[arg(long, default_value = "0")]
        base_rate: Decimal,
        /// Annual rate slope below the kink
        #[arg(long, default_value = "0.2")]
        multiplier: Decimal,
        /// Annual rate slope above the kink
        #[arg(long, default_value = "2")]
        jump_multiplier: Decimal,
        /// Utilization where the jump slope starts
        #[arg(long, default_value = "0.8")]
        kink: Decimal,
        /// Reserve factor (config default when omitted)
        #[arg(long)]
        reserve_factor: Option<Decimal>,
        /// Calling account
        #[arg(long, default_value = "admin")]
        caller: String,
    },

    /// List a created or soft-delisted market
    ListMarket {
        market: String,
        #[arg(long, default_value = "admin")]
        caller: String,
    },

    /// Soft delist a market, or hard delist a soft-delisted one
    DelistMarket {
        market: String,
        #[arg(long)]
        hard: bool,
        #[arg(long, default_value = "admin")]
        caller: String,
    },

    /// Set the oracle price of a market's underlying
    SetPrice { market: String, price: Decimal },

    SetCollateralFactor {
        market: String,
        factor: Decimal,
        #[arg(long, default_value = "admin")]
        caller: String,
    },

    /// Credit an account with underlying (NATIVE for the native asset)
    Faucet {
        account: String,
        asset: String,
        amount: Decimal,
    },

    /// Enter markets as collateral
    Enter {
        account: String,
        #[arg(required = true)]
        markets: Vec<String>,
    },

    /// Exit a market
    Exit { account: String, market: String },

    /// Supply underlying
    Mint {
        account: String,
        market: String,
        amount: Decimal,
    },

    /// Redeem claim tokens
    Redeem {
        account: String,
        market: String,
        amount: Decimal,
        /// Treat the amount as underlying to withdraw
        #[arg(long)]
        underlying: bool,
    },

    Borrow {
        account: String,
        market: String,
        amount: Decimal,
    },

    /// Repay a borrow; `max` repays the whole balance
    Repay {
        account: String,
        market: String,
        amount: String,
        /// Repay this borrower's debt instead of the account's own
        #[arg(long)]
        behalf_of: Option<String>,
    },

    /// Liquidate an account in shortfall
    Liquidate {
        liquidator: String,
        borrower: String,
        /// Market of the debt being repaid
        borrowed: String,
        amount: Decimal,
        /// Market whose claim tokens are seized
        collateral: String,
    },

    /// Advance the block height
    Advance {
        #[arg(default_value = "1")]
        blocks: u64,
    },

    /// Show an account's liquidity
    Liquidity { account: String },

    /// Show a market's totals and rates
    Market { market: String },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut ctx = AppContext::new(&cli.data)?;

    match cli.command {
        Commands::Init => {
            commands::init(&mut ctx)?;
        }

        Commands::CreateMarket {
            market,
            underlying,
            version,
            base_rate,
            multiplier,
            jump_multiplier,
            kink,
            reserve_factor,
            caller,
        } => {
            commands::create_market(
                &mut ctx,
                &caller,
                commands::NewMarket {
                    id: &market,
                    underlying: &underlying,
                    version,
                    base_rate,
                    multiplier,
                    jump_multiplier,
                    kink,
                    reserve_factor,
                },
            )?;
        }

        Commands::ListMarket { market, caller } => {
            commands::list_market(&mut ctx, &caller, &market)?;
        }

        Commands::DelistMarket { market, hard, caller } => {
            commands::delist_market(&mut ctx, &caller, &market, hard)?;
        }

        Commands::SetPrice { market, price } => {
            commands::set_price(&mut ctx, &market, price)?;
        }

        Commands::SetCollateralFactor { market, factor, caller } => {
            commands::set_collateral_factor(&mut ctx, &caller, &market, factor)?;
        }

        Commands::Faucet { account, asset, amount } => {
            commands::faucet(&mut ctx, &account, &asset, amount)?;
        }

        Commands::Enter { account, markets } => {
            commands::enter(&mut ctx, &account, &markets)?;
        }

        Commands::Exit { account, market } => {
            commands::exit(&mut ctx, &account, &market)?;
        }

        Commands::Mint { account, market, amount } => {
            commands::mint(&mut ctx, &account, &market, amount)?;
        }

        Commands::Redeem {
            account,
            market,
            amount,
            underlying,
        } => {
            commands::redeem(&mut ctx, &account, &market, amount, underlying)?;
        }

        Commands::Borrow { account, market, amount } => {
            commands::borrow(&mut ctx, &account, &market, amount)?;
        }

        Commands::Repay {
            account,
            market,
            amount,
            behalf_of,
        } => {
            let amount = commands::parse_amount(&amount)?;
            commands::repay(&mut ctx, &account, behalf_of.as_deref(), &market, amount)?;
        }

        Commands::Liquidate {
            liquidator,
            borrower,
            borrowed,
            amount,
            collateral,
        } => {
            commands::liquidate(&mut ctx, &liquidator, &borrower, &borrowed, amount, &collateral)?;
        }

        Commands::Advance { blocks } => {
            commands::advance(&mut ctx, blocks)?;
        }

        Commands::Liquidity { account } => {
            commands::liquidity(&ctx, &account)?;
        }

        Commands::Market { market } => {
            commands::market(&ctx, &market)?;
        }
    }

    Ok(())
}
