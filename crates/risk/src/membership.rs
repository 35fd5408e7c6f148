//! Account market membership
//!
//! Each account holds an ordered list of entered markets. Liquidity is
//! summed in this order, so insertion order is kept and removal shifts the
//! remaining markets down rather than swapping.

use ironbank_core::{AccountId, MarketId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    accounts: BTreeMap<AccountId, Vec<MarketId>>,
}

impl Membership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Markets the account has entered, in entry order
    pub fn markets_of(&self, account: &AccountId) -> &[MarketId] {
        self.accounts.get(account).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_member(&self, account: &AccountId, market: &MarketId) -> bool {
        self.markets_of(account).contains(market)
    }

    /// Add a market; returns false if the account was already a member
    pub fn insert(&mut self, account: &AccountId, market: &MarketId) -> bool {
        let markets = self.accounts.entry(account.clone()).or_default();
        if markets.contains(market) {
            return false;
        }
        markets.push(market.clone());
        true
    }

    /// Remove a market, keeping the relative order of the rest.
    ///
    /// Returns false if the account was not a member.
    pub fn remove(&mut self, account: &AccountId, market: &MarketId) -> bool {
        let Some(markets) = self.accounts.get_mut(account) else {
            return false;
        };
        let Some(index) = markets.iter().position(|m| m == market) else {
            return false;
        };
        markets.remove(index);
        if markets.is_empty() {
            self.accounts.remove(account);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markets(n: usize) -> Vec<MarketId> {
        (0..n).map(|i| MarketId::new(format!("cr{}", i))).collect()
    }

    #[test]
    fn test_no_memberships() {
        let membership = Membership::new();
        assert!(membership.markets_of(&AccountId::new("alice")).is_empty());
    }

    #[test]
    fn test_insert_once_in_order() {
        let mut membership = Membership::new();
        let alice = AccountId::new("alice");
        let ms = markets(3);

        assert!(membership.insert(&alice, &ms[2]));
        assert!(membership.insert(&alice, &ms[0]));
        assert!(!membership.insert(&alice, &ms[2]));
        assert!(membership.insert(&alice, &ms[1]));

        assert_eq!(
            membership.markets_of(&alice),
            &[ms[2].clone(), ms[0].clone(), ms[1].clone()]
        );
    }

    #[test]
    fn test_remove_every_position_every_size() {
        let alice = AccountId::new("alice");
        for size in 1..=6 {
            let ms = markets(size);
            for index in 0..size {
                let mut membership = Membership::new();
                for m in &ms {
                    membership.insert(&alice, m);
                }

                assert!(membership.remove(&alice, &ms[index]));

                let mut expected = ms.clone();
                expected.remove(index);
                assert_eq!(
                    membership.markets_of(&alice),
                    expected.as_slice(),
                    "size {} index {}",
                    size,
                    index
                );
                assert!(!membership.is_member(&alice, &ms[index]));
            }
        }
    }

    #[test]
    fn test_remove_non_member() {
        let mut membership = Membership::new();
        let alice = AccountId::new("alice");
        let ms = markets(2);
        assert!(!membership.remove(&alice, &ms[0]));

        membership.insert(&alice, &ms[0]);
        assert!(!membership.remove(&alice, &ms[1]));
        assert_eq!(membership.markets_of(&alice), &[ms[0].clone()]);
    }
}
