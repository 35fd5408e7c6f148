//! Iron Bank Ledger - Market accounting and protocol orchestration
//!
//! Each market keeps its own ledger of cash, borrows, reserves and claim
//! tokens. `Protocol` ties the ledgers to the risk engine, the price oracle
//! and the underlying token balances, and runs every user action as one
//! atomic step.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use ironbank_core::{AccountId, Amount, AssetId, Exp, MarketId, MarketVersion};
//! use ironbank_ledger::{MarketSpec, Protocol, ProtocolConfig, RateModel};
//! use ironbank_oracle::MockOracle;
//!
//! let admin = AccountId::new("admin");
//! let alice = AccountId::new("alice");
//! let market = MarketId::new("crUSDC");
//! let usdc = AssetId::new("USDC");
//!
//! let oracle = Arc::new(MockOracle::with_prices([(market.clone(), Exp::ONE)]));
//! let mut protocol = Protocol::new(&ProtocolConfig::default(), oracle).unwrap();
//! protocol
//!     .create_market(&admin, MarketSpec {
//!         id: market.clone(),
//!         underlying: usdc.clone(),
//!         version: MarketVersion::Vanilla,
//!         rate_model: RateModel::zero(),
//!         initial_exchange_rate: Exp::ONE,
//!         reserve_factor: Exp::ZERO,
//!     })
//!     .unwrap();
//! protocol.support_market(&admin, &market).unwrap();
//!
//! protocol.credit_underlying(&usdc, &alice, Amount::new(100)).unwrap();
//! let tokens = protocol.mint(&alice, &market, Amount::new(100)).unwrap();
//! assert_eq!(tokens, Amount::new(100));
//! ```

pub mod bank;
pub mod book;
pub mod config;
pub mod error;
pub mod guard;
pub mod market;
pub mod protocol;
pub mod rate_model;
pub mod state;
pub mod variant;

pub use bank::TokenBank;
pub use book::MarketBook;
pub use config::{LedgerLimits, ProtocolConfig};
pub use error::{LendingError, TokenError};
pub use guard::ReentrancyGuard;
pub use market::{DebtUpdate, Market, MarketSpec};
pub use protocol::{FlashloanReceiver, Liquidation, Protocol, ProtocolState};
pub use rate_model::{FixedRateModel, InterestRateModel, JumpRateModel, RateModel};
pub use state::{AccountPosition, BorrowSnapshot, LedgerState};
pub use variant::{CappedLedger, PlainLedger, TokenAccounting, Variant};
