//! Collaborator interfaces consumed by the pool
//!
//! The hosting ledger supplies asset custody and the share token. Both are
//! called only after the pool has committed its own bookkeeping, and the host
//! guarantees they are atomic with the caller's transaction.

use crate::error::Result;

/// Moves pooled assets between accounts and the pool's custody
pub trait AssetCustody {
    type AccountId: Clone + PartialEq + std::fmt::Debug;
    type AssetId: Clone + PartialEq + std::fmt::Debug;

    /// Fail exactly when `transfer_in` would, without moving anything
    ///
    /// Hosts whose transfers already roll back with the caller's
    /// transaction can keep the default.
    fn ensure_transfer_in(
        &self,
        _asset: &Self::AssetId,
        _from: &Self::AccountId,
        _amount: u128,
    ) -> Result<()> {
        Ok(())
    }

    /// Pull `amount` of `asset` from `from` into custody
    fn transfer_in(&mut self, asset: &Self::AssetId, from: &Self::AccountId, amount: u128)
        -> Result<()>;

    /// Pay `amount` of `asset` out of custody to `to`
    fn transfer_out(&mut self, asset: &Self::AssetId, to: &Self::AccountId, amount: u128)
        -> Result<()>;
}

/// Fungible claim on the pool (mint/burn primitive only)
pub trait ShareToken {
    type AccountId;

    fn mint(&mut self, to: &Self::AccountId, amount: u128) -> Result<()>;

    /// Must fail with `InsufficientShares` when `from` holds less than `amount`
    fn burn(&mut self, from: &Self::AccountId, amount: u128) -> Result<()>;

    fn balance_of(&self, who: &Self::AccountId) -> u128;
}
