//! Owner-gated parameter changes and admin fee withdrawal
//!
//! Every entry point checks the caller first, validates the new value, and
//! only then mutates. Out-of-range values are rejected, never clamped.

use super::{normalized_within_bounds, StableSwapPool};
use crate::constants::{MAX_A, MAX_A_CHANGE, MIN_A};
use crate::error::{Result, StableSwapError};
use crate::host_traits::{AssetCustody, ShareToken};
use crate::invariant::compute_d;
use tracing::{info, warn};

impl<C, S, const N: usize> StableSwapPool<C, S, N>
where
    C: AssetCustody,
    S: ShareToken<AccountId = C::AccountId>,
{
    pub fn pause(&mut self, caller: &C::AccountId) -> Result<()> {
        let _entered = self.lock.enter()?;
        self.access.pause(caller)?;
        info!(?caller, "pool paused");
        Ok(())
    }

    pub fn unpause(&mut self, caller: &C::AccountId) -> Result<()> {
        let _entered = self.lock.enter()?;
        self.access.unpause(caller)?;
        info!(?caller, "pool unpaused");
        Ok(())
    }

    pub fn set_fee(&mut self, caller: &C::AccountId, swap_fee: u128) -> Result<()> {
        let _entered = self.lock.enter()?;
        self.access.ensure_owner(caller)?;
        let previous = self.fees.swap_fee();
        self.fees.set_swap_fee(swap_fee)?;
        info!(previous, swap_fee, "swap fee updated");
        Ok(())
    }

    pub fn set_admin_fee(&mut self, caller: &C::AccountId, admin_fee: u128) -> Result<()> {
        let _entered = self.lock.enter()?;
        self.access.ensure_owner(caller)?;
        let previous = self.fees.admin_fee();
        self.fees.set_admin_fee(admin_fee)?;
        info!(previous, admin_fee, "admin fee updated");
        Ok(())
    }

    /// Replace the rate multiplier of asset `k`
    ///
    /// Raw balances stay put but D moves immediately, so this is an
    /// owner-trusted operation. The new rate must keep every normalised
    /// balance within range.
    pub fn set_rate_multiplier(
        &mut self,
        caller: &C::AccountId,
        k: usize,
        rate_multiplier: u128,
    ) -> Result<()> {
        let _entered = self.lock.enter()?;
        self.access.ensure_owner(caller)?;
        self.check_index(k)?;

        let mut rates = self.rates;
        rates.set(k, rate_multiplier)?;
        let xp = normalized_within_bounds(&rates, &self.state.balances)?;
        let d_after = compute_d(&xp, self.amplification)?;
        let d_before = self.invariant()?;

        let previous = self.rates.get(k);
        self.rates = rates;
        warn!(
            k,
            previous,
            rate_multiplier,
            d_before,
            d_after,
            "rate multiplier changed, invariant moved"
        );
        Ok(())
    }

    /// Change A, at most a factor of [`MAX_A_CHANGE`] per call
    pub fn set_amplification(&mut self, caller: &C::AccountId, amplification: u128) -> Result<()> {
        let _entered = self.lock.enter()?;
        self.access.ensure_owner(caller)?;

        let current = self.amplification;
        let out_of_bounds = !(MIN_A..=MAX_A).contains(&amplification)
            || amplification > current.saturating_mul(MAX_A_CHANGE)
            || amplification.saturating_mul(MAX_A_CHANGE) < current;
        if out_of_bounds {
            return Err(StableSwapError::ParameterOutOfBounds {
                parameter: "amplification",
                value: amplification,
            });
        }
        // The new curve must still solve for current balances
        compute_d(&self.normalized(&self.state.balances)?, amplification)?;

        self.amplification = amplification;
        info!(previous = current, amplification, "amplification updated");
        Ok(())
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &C::AccountId,
        new_owner: C::AccountId,
    ) -> Result<()> {
        let _entered = self.lock.enter()?;
        self.access.transfer_ownership(caller, new_owner)?;
        info!(?caller, new_owner = ?self.access.owner(), "ownership transferred");
        Ok(())
    }

    /// Pay `amount` of accrued admin fees in asset `k` to the owner
    ///
    /// Available while paused.
    pub fn withdraw_admin_fees(
        &mut self,
        caller: &C::AccountId,
        k: usize,
        amount: u128,
    ) -> Result<()> {
        let _entered = self.lock.enter()?;
        self.access.ensure_owner(caller)?;
        self.check_index(k)?;
        if amount == 0 {
            return Err(StableSwapError::ZeroAmount);
        }

        let mut next = self.state;
        next.admin_fees.debit(k, amount)?;

        self.settle(next, |assets, custody, _| {
            custody.transfer_out(&assets[k], caller, amount)
        })?;

        info!(k, amount, "admin fees withdrawn");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::constants::{FEE_DENOMINATOR, MAX_SWAP_FEE, RATE_PRECISION};
    use crate::error::StableSwapError;

    #[test]
    fn test_pause_cycle() {
        let mut pool = pool::<2>(100, 4_000_000, 0);
        assert_eq!(pool.pause(&ALICE), Err(StableSwapError::Unauthorized));
        assert_eq!(pool.unpause(&OWNER), Err(StableSwapError::PoolNotPaused));

        pool.pause(&OWNER).unwrap();
        assert!(pool.is_paused());
        assert_eq!(pool.pause(&OWNER), Err(StableSwapError::PoolPaused));

        pool.unpause(&OWNER).unwrap();
        assert!(!pool.is_paused());
    }

    #[test]
    fn test_paused_pool_allows_only_proportional_exit() {
        let mut pool = pool::<2>(100, 4_000_000, 0);
        let shares = pool.deposit(&ALICE, [100 * UNIT, 100 * UNIT], 0).unwrap();
        pool.pause(&OWNER).unwrap();

        assert_eq!(pool.swap(&ALICE, 0, 1, UNIT, 0), Err(StableSwapError::PoolPaused));
        assert_eq!(
            pool.deposit(&ALICE, [UNIT, UNIT], 0),
            Err(StableSwapError::PoolPaused)
        );
        assert_eq!(
            pool.withdraw_single_asset(&ALICE, UNIT, 0, 0),
            Err(StableSwapError::PoolPaused)
        );
        assert_eq!(
            pool.withdraw_imbalanced(&ALICE, [UNIT, 0], u128::MAX),
            Err(StableSwapError::PoolPaused)
        );

        let amounts = pool.withdraw_proportional(&ALICE, shares / 2, [0; 2]).unwrap();
        assert!(amounts[0] > 0 && amounts[1] > 0);
    }

    #[test]
    fn test_fee_updates() {
        let mut pool = pool::<2>(100, 4_000_000, 0);
        assert_eq!(pool.set_fee(&BOB, 1), Err(StableSwapError::Unauthorized));
        assert!(matches!(
            pool.set_fee(&OWNER, MAX_SWAP_FEE + 1),
            Err(StableSwapError::ParameterOutOfBounds { parameter: "swap_fee", .. })
        ));
        assert_eq!(pool.fee(), 4_000_000);

        pool.set_fee(&OWNER, MAX_SWAP_FEE).unwrap();
        pool.set_admin_fee(&OWNER, FEE_DENOMINATOR).unwrap();
        assert_eq!(pool.fee(), MAX_SWAP_FEE);
        assert_eq!(pool.admin_fee(), FEE_DENOMINATOR);
        assert!(pool.set_admin_fee(&OWNER, FEE_DENOMINATOR + 1).is_err());
    }

    #[test]
    fn test_rate_multiplier_updates() {
        let mut pool = pool::<2>(100, 4_000_000, 0);
        pool.deposit(&ALICE, [1_000 * UNIT, 1_000 * UNIT], 0).unwrap();

        assert_eq!(
            pool.set_rate_multiplier(&ALICE, 0, 2 * RATE_PRECISION),
            Err(StableSwapError::Unauthorized)
        );
        assert_eq!(
            pool.set_rate_multiplier(&OWNER, 0, 0),
            Err(StableSwapError::ParameterOutOfBounds {
                parameter: "rate_multiplier",
                value: 0
            })
        );
        assert!(matches!(
            pool.set_rate_multiplier(&OWNER, 0, 1_000_000_000_000_000 * RATE_PRECISION),
            Err(StableSwapError::ParameterOutOfBounds {
                parameter: "normalized_balance",
                ..
            })
        ));
        assert_eq!(pool.rate_multiplier(0).unwrap(), RATE_PRECISION);

        let d_before = pool.invariant().unwrap();
        pool.set_rate_multiplier(&OWNER, 1, RATE_PRECISION / 100 * 102).unwrap();
        assert_eq!(pool.balances(), [1_000 * UNIT, 1_000 * UNIT]);
        assert!(pool.invariant().unwrap() > d_before);
    }

    #[test]
    fn test_amplification_bounds() {
        let mut pool = pool::<2>(100, 4_000_000, 0);
        pool.deposit(&ALICE, [1_000 * UNIT, 500 * UNIT], 0).unwrap();

        assert!(pool.set_amplification(&OWNER, 1_001).is_err());
        assert!(pool.set_amplification(&OWNER, 9).is_err());
        assert!(pool.set_amplification(&OWNER, 0).is_err());
        assert_eq!(pool.amplification(), 100);

        let d_before = pool.invariant().unwrap();
        pool.set_amplification(&OWNER, 1_000).unwrap();
        assert_eq!(pool.amplification(), 1_000);
        // Higher A flattens the curve, which raises D for an unbalanced pool
        assert!(pool.invariant().unwrap() > d_before);
    }

    #[test]
    fn test_ownership_transfer() {
        let mut pool = pool::<2>(100, 0, 0);
        assert_eq!(
            pool.transfer_ownership(&ALICE, ALICE),
            Err(StableSwapError::Unauthorized)
        );
        pool.transfer_ownership(&OWNER, ALICE).unwrap();
        assert_eq!(*pool.owner(), ALICE);
        assert_eq!(pool.pause(&OWNER), Err(StableSwapError::Unauthorized));
        pool.pause(&ALICE).unwrap();
    }

    #[test]
    fn test_admin_fee_withdrawal() {
        let mut pool = pool::<2>(100, 4_000_000, FEE_DENOMINATOR / 2);
        pool.deposit(&ALICE, [100_000 * UNIT, 100_000 * UNIT], 0).unwrap();
        pool.swap(&BOB, 0, 1, 10_000 * UNIT, 0).unwrap();

        let owed = pool.admin_fees_accrued()[1];
        assert!(owed > 0);
        let lp_balances = pool.balances();

        assert_eq!(
            pool.withdraw_admin_fees(&BOB, 1, owed),
            Err(StableSwapError::Unauthorized)
        );
        assert_eq!(
            pool.withdraw_admin_fees(&OWNER, 1, owed + 1),
            Err(StableSwapError::InsufficientAdminFees {
                index: 1,
                requested: owed + 1,
                available: owed
            })
        );

        pool.pause(&OWNER).unwrap();
        let wallet_before = pool.custody().wallet_balance(&OWNER, &"USDC");
        pool.withdraw_admin_fees(&OWNER, 1, owed).unwrap();
        assert_eq!(pool.admin_fees_accrued(), [0, 0]);
        assert_eq!(pool.balances(), lp_balances);
        assert_eq!(
            pool.custody().wallet_balance(&OWNER, &"USDC"),
            wallet_before + owed
        );
    }
}
