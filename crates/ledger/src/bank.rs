//! Underlying token balances
//!
//! Stands in for the ERC-20 contracts the markets custody. Each market holds
//! its underlying under `MarketId::holder()`.

use std::collections::BTreeMap;

use ironbank_core::{AccountId, Amount, AssetId};
use serde::{Deserialize, Serialize};

use crate::error::TokenError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenBank {
    balances: BTreeMap<AssetId, BTreeMap<AccountId, Amount>>,
}

impl TokenBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, asset: &AssetId, account: &AccountId) -> Amount {
        self.balances
            .get(asset)
            .and_then(|accounts| accounts.get(account))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Create `amount` out of thin air (faucet / bridge deposit)
    pub fn credit(&mut self, asset: &AssetId, account: &AccountId, amount: Amount) -> Result<(), TokenError> {
        let balance = self
            .balances
            .entry(asset.clone())
            .or_default()
            .entry(account.clone())
            .or_insert(Amount::ZERO);
        *balance = balance.checked_add(amount)?;
        Ok(())
    }

    /// Destroy `amount`
    pub fn debit(&mut self, asset: &AssetId, account: &AccountId, amount: Amount) -> Result<(), TokenError> {
        let available = self.balance_of(asset, account);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                asset: asset.clone(),
                account: account.clone(),
                available: available.to_string(),
                required: amount.to_string(),
            });
        }
        let remaining = available.checked_sub(amount)?;
        let accounts = self.balances.entry(asset.clone()).or_default();
        if remaining.is_zero() {
            accounts.remove(account);
        } else {
            accounts.insert(account.clone(), remaining);
        }
        Ok(())
    }

    pub fn transfer(
        &mut self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        if amount.is_zero() || from == to {
            return Ok(());
        }
        self.debit(asset, from, amount)?;
        self.credit(asset, to, amount)
    }

    /// Swap native for its wrapped form 1:1
    pub fn wrap(&mut self, wrapped: &AssetId, account: &AccountId, amount: Amount) -> Result<(), TokenError> {
        self.debit(&AssetId::native(), account, amount)?;
        self.credit(wrapped, account, amount)
    }

    pub fn unwrap_native(&mut self, wrapped: &AssetId, account: &AccountId, amount: Amount) -> Result<(), TokenError> {
        self.debit(wrapped, account, amount)?;
        self.credit(&AssetId::native(), account, amount)
    }

    /// Sum of all balances of `asset`
    pub fn total_of(&self, asset: &AssetId) -> Result<Amount, TokenError> {
        let mut total = Amount::ZERO;
        if let Some(accounts) = self.balances.get(asset) {
            for amount in accounts.values() {
                total = total.checked_add(*amount)?;
            }
        }
        Ok(total)
    }

    /// All holders of `asset`
    pub fn holders(&self, asset: &AssetId) -> impl Iterator<Item = (&AccountId, &Amount)> {
        self.balances.get(asset).into_iter().flat_map(|accounts| accounts.iter())
    }
}
