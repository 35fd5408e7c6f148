//! Identifiers for accounts, markets and underlying assets
//!
//! All three are thin string newtypes. They serialize transparently so they
//! can be used as JSON map keys in persisted state.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// A user, liquidator, flashloan receiver or privileged operator
    AccountId
);

string_id!(
    /// A market (claim token) such as `crUSDC`
    MarketId
);

string_id!(
    /// An underlying asset such as `USDC` or `WETH`
    AssetId
);

impl AssetId {
    /// The chain's native asset, wrapped 1:1 by wrapped-native markets
    pub fn native() -> Self {
        Self::new("NATIVE")
    }

    pub fn is_native(&self) -> bool {
        self.0 == "NATIVE"
    }
}

impl MarketId {
    /// The account that holds this market's underlying cash
    pub fn holder(&self) -> AccountId {
        AccountId::new(format!("market:{}", self.0))
    }
}
