//! In-memory collaborators for simulation and tests
//!
//! `MemoryCustody` keeps per-account wallet balances and the pool's custody
//! balance per asset. `MemoryShareToken` is a plain fungible balance map.

use crate::error::{Result, StableSwapError};
use crate::host_traits::{AssetCustody, ShareToken};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Wallets plus pool custody, keyed by account and asset
#[derive(Debug, Clone)]
pub struct MemoryCustody<AccountId, AssetId> {
    wallets: HashMap<(AccountId, AssetId), u128>,
    custody: HashMap<AssetId, u128>,
}

impl<AccountId, AssetId> Default for MemoryCustody<AccountId, AssetId> {
    fn default() -> Self {
        Self {
            wallets: HashMap::new(),
            custody: HashMap::new(),
        }
    }
}

impl<AccountId, AssetId> MemoryCustody<AccountId, AssetId>
where
    AccountId: Clone + Eq + Hash,
    AssetId: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit a wallet out of thin air (faucet for simulations)
    pub fn fund(&mut self, who: &AccountId, asset: &AssetId, amount: u128) {
        *self
            .wallets
            .entry((who.clone(), asset.clone()))
            .or_insert(0) += amount;
    }

    pub fn wallet_balance(&self, who: &AccountId, asset: &AssetId) -> u128 {
        self.wallets
            .get(&(who.clone(), asset.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Total of `asset` held by the pool (LP funds plus accrued admin fees)
    pub fn custody_balance(&self, asset: &AssetId) -> u128 {
        self.custody.get(asset).copied().unwrap_or(0)
    }
}

impl<AccountId, AssetId> AssetCustody for MemoryCustody<AccountId, AssetId>
where
    AccountId: Clone + Eq + Hash + Debug,
    AssetId: Clone + Eq + Hash + Debug,
{
    type AccountId = AccountId;
    type AssetId = AssetId;

    fn ensure_transfer_in(&self, asset: &AssetId, from: &AccountId, amount: u128) -> Result<()> {
        let available = self.wallet_balance(from, asset);
        if available < amount {
            return Err(StableSwapError::TransferFailed(format!(
                "{from:?} holds {available} of {asset:?}, needs {amount}"
            )));
        }
        self.custody_balance(asset)
            .checked_add(amount)
            .ok_or(StableSwapError::Overflow)?;
        Ok(())
    }

    fn transfer_in(&mut self, asset: &AssetId, from: &AccountId, amount: u128) -> Result<()> {
        self.ensure_transfer_in(asset, from, amount)?;
        let key = (from.clone(), asset.clone());
        let available = self.wallets.get(&key).copied().unwrap_or(0);
        let held = self.custody_balance(asset);
        self.wallets.insert(key, available - amount);
        self.custody.insert(asset.clone(), held + amount);
        Ok(())
    }

    fn transfer_out(&mut self, asset: &AssetId, to: &AccountId, amount: u128) -> Result<()> {
        let held = self.custody.get(asset).copied().unwrap_or(0);
        if held < amount {
            return Err(StableSwapError::TransferFailed(format!(
                "custody holds {held} of {asset:?}, cannot pay {amount}"
            )));
        }
        self.custody.insert(asset.clone(), held - amount);
        *self.wallets.entry((to.clone(), asset.clone())).or_insert(0) += amount;
        Ok(())
    }
}

/// Share balances with a tracked total supply
#[derive(Debug, Clone)]
pub struct MemoryShareToken<AccountId> {
    balances: HashMap<AccountId, u128>,
    total_supply: u128,
}

impl<AccountId> Default for MemoryShareToken<AccountId> {
    fn default() -> Self {
        Self {
            balances: HashMap::new(),
            total_supply: 0,
        }
    }
}

impl<AccountId: Clone + Eq + Hash> MemoryShareToken<AccountId> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Move shares between holders, as a secondary-market transfer would
    pub fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: u128) -> Result<()> {
        self.burn(from, amount)?;
        self.mint(to, amount)
    }
}

impl<AccountId: Clone + Eq + Hash> ShareToken for MemoryShareToken<AccountId> {
    type AccountId = AccountId;

    fn mint(&mut self, to: &AccountId, amount: u128) -> Result<()> {
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(StableSwapError::Overflow)?;
        *self.balances.entry(to.clone()).or_insert(0) += amount;
        Ok(())
    }

    fn burn(&mut self, from: &AccountId, amount: u128) -> Result<()> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(StableSwapError::InsufficientShares {
                requested: amount,
                available,
            });
        }
        self.balances.insert(from.clone(), available - amount);
        self.total_supply -= amount;
        Ok(())
    }

    fn balance_of(&self, who: &AccountId) -> u128 {
        self.balances.get(who).copied().unwrap_or(0)
    }
}
