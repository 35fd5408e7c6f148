//! Iron Bank Price Oracle
//!
//! The risk engine consumes prices through the `PriceOracle` port; pricing
//! logic itself lives outside this workspace. `MockOracle` provides settable
//! prices for tests and the operator CLI.

mod error;
mod mock;
mod port;

pub use error::OracleError;
pub use mock::MockOracle;
pub use port::PriceOracle;
