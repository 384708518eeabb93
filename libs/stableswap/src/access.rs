//! Owner gating, the pause switch, and the reentrancy lock
//!
//! Ownership and pause are two orthogonal switches held on the pool
//! aggregate. Pausing a paused pool and unpausing a running one are both
//! rejected rather than treated as no-ops.

use crate::error::{Result, StableSwapError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Owner identity plus the circuit breaker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessControl<AccountId> {
    owner: AccountId,
    paused: bool,
}

impl<AccountId: Clone + PartialEq> AccessControl<AccountId> {
    pub fn new(owner: AccountId) -> Self {
        Self {
            owner,
            paused: false,
        }
    }

    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn ensure_owner(&self, caller: &AccountId) -> Result<()> {
        if *caller != self.owner {
            return Err(StableSwapError::Unauthorized);
        }
        Ok(())
    }

    pub fn ensure_not_paused(&self) -> Result<()> {
        if self.paused {
            return Err(StableSwapError::PoolPaused);
        }
        Ok(())
    }

    pub fn pause(&mut self, caller: &AccountId) -> Result<()> {
        self.ensure_owner(caller)?;
        self.ensure_not_paused()?;
        self.paused = true;
        Ok(())
    }

    pub fn unpause(&mut self, caller: &AccountId) -> Result<()> {
        self.ensure_owner(caller)?;
        if !self.paused {
            return Err(StableSwapError::PoolNotPaused);
        }
        self.paused = false;
        Ok(())
    }

    pub fn transfer_ownership(&mut self, caller: &AccountId, new_owner: AccountId) -> Result<()> {
        self.ensure_owner(caller)?;
        self.owner = new_owner;
        Ok(())
    }
}

/// Rejects nested entry into state-mutating pool operations
///
/// Cloning shares the same lock, so a collaborator handed a clone can observe
/// (and is refused) an entry while the pool is mid-operation.
#[derive(Debug, Clone, Default)]
pub struct ReentrancyLock {
    entered: Arc<AtomicBool>,
}

impl ReentrancyLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock; released when the returned guard drops
    pub fn enter(&self) -> Result<EntryGuard> {
        if self
            .entered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(StableSwapError::Reentrancy);
        }
        Ok(EntryGuard {
            entered: Arc::clone(&self.entered),
        })
    }

    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

/// RAII release for [`ReentrancyLock`]
#[derive(Debug)]
pub struct EntryGuard {
    entered: Arc<AtomicBool>,
}

impl Drop for EntryGuard {
    fn drop(&mut self) {
        self.entered.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_only_transitions() {
        let mut access = AccessControl::new("owner");
        assert_eq!(access.pause(&"mallory"), Err(StableSwapError::Unauthorized));
        assert!(!access.is_paused());

        access.pause(&"owner").unwrap();
        assert!(access.is_paused());
        assert_eq!(
            access.ensure_not_paused(),
            Err(StableSwapError::PoolPaused)
        );
    }

    #[test]
    fn test_pause_is_not_idempotent() {
        let mut access = AccessControl::new(1u32);
        assert_eq!(access.unpause(&1), Err(StableSwapError::PoolNotPaused));
        access.pause(&1).unwrap();
        assert_eq!(access.pause(&1), Err(StableSwapError::PoolPaused));
        access.unpause(&1).unwrap();
        assert!(!access.is_paused());
    }

    #[test]
    fn test_ownership_transfer() {
        let mut access = AccessControl::new(1u32);
        access.transfer_ownership(&1, 2).unwrap();
        assert_eq!(*access.owner(), 2);
        assert_eq!(
            access.transfer_ownership(&1, 3),
            Err(StableSwapError::Unauthorized)
        );
        assert!(access.ensure_owner(&2).is_ok());
    }

    #[test]
    fn test_reentrancy_lock() {
        let lock = ReentrancyLock::new();
        let shared = lock.clone();
        {
            let _guard = lock.enter().unwrap();
            assert!(shared.is_entered());
            assert!(matches!(shared.enter(), Err(StableSwapError::Reentrancy)));
        }
        assert!(!lock.is_entered());
        assert!(shared.enter().is_ok());
    }
}
