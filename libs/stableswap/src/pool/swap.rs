//! Asset-to-asset exchange

use super::{PoolState, StableSwapPool};
use crate::error::{Result, StableSwapError};
use crate::host_traits::{AssetCustody, ShareToken};
use crate::invariant::{compute_d, compute_y};
use tracing::{debug, warn};

/// Priced swap, all amounts in raw units of the output asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapQuote {
    /// Amount paid to the trader
    pub dy: u128,
    /// Total fee withheld from the output
    pub fee: u128,
    /// Part of `fee` owed to the operator
    pub admin_fee: u128,
    /// Invariant before the trade
    pub d_before: u128,
}

impl<C, S, const N: usize> StableSwapPool<C, S, N>
where
    C: AssetCustody,
    S: ShareToken<AccountId = C::AccountId>,
{
    /// Exchange `dx` of asset `i` for at least `min_dy` of asset `j`
    pub fn swap(
        &mut self,
        caller: &C::AccountId,
        i: usize,
        j: usize,
        dx: u128,
        min_dy: u128,
    ) -> Result<u128> {
        let _entered = self.lock.enter()?;
        self.access.ensure_not_paused()?;

        let quote = self.price_swap(i, j, dx)?;
        if quote.dy < min_dy {
            return Err(StableSwapError::SlippageExceeded {
                actual: quote.dy,
                limit: min_dy,
            });
        }

        let mut next = self.state;
        next.balances[i] = next.balances[i]
            .checked_add(dx)
            .ok_or(StableSwapError::Overflow)?;
        let outflow = quote
            .dy
            .checked_add(quote.admin_fee)
            .ok_or(StableSwapError::Overflow)?;
        next.balances[j] = next.balances[j].checked_sub(outflow).ok_or(
            StableSwapError::InsufficientLiquidity {
                index: j,
                requested: outflow,
                available: next.balances[j],
            },
        )?;
        next.admin_fees.credit(j, quote.admin_fee)?;

        self.check_invariant_held(quote.d_before, &next)?;

        self.settle(next, |assets, custody, _| {
            custody.transfer_in(&assets[i], caller, dx)?;
            custody.transfer_out(&assets[j], caller, quote.dy)
        })?;

        debug!(
            ?caller,
            i,
            j,
            dx,
            dy = quote.dy,
            fee = quote.fee,
            admin_fee = quote.admin_fee,
            "swap executed"
        );
        Ok(quote.dy)
    }

    /// Price a swap against current state without mutating anything
    pub fn quote_swap(&self, i: usize, j: usize, dx: u128) -> Result<SwapQuote> {
        self.price_swap(i, j, dx)
    }

    fn price_swap(&self, i: usize, j: usize, dx: u128) -> Result<SwapQuote> {
        self.check_index(i)?;
        self.check_index(j)?;
        if i == j {
            return Err(StableSwapError::SameAssetIndex { index: i });
        }
        if dx == 0 {
            return Err(StableSwapError::ZeroAmount);
        }
        let balances = self.state.balances;
        if balances[j] == 0 {
            return Err(StableSwapError::InsufficientLiquidity {
                index: j,
                requested: 1,
                available: 0,
            });
        }

        let xp = self.normalized(&balances)?;
        let d_before = compute_d(&xp, self.amplification)?;

        let mut moved = balances;
        moved[i] = moved[i].checked_add(dx).ok_or(StableSwapError::Overflow)?;
        let x = self.normalized(&moved)?[i];

        let y = compute_y(i, j, x, &xp, self.amplification)?;
        // One unit stays in the pool to absorb solver truncation
        let dy_pre_fee = xp[j]
            .checked_sub(y)
            .and_then(|v| v.checked_sub(1))
            .ok_or(StableSwapError::ZeroAmount)?;

        let fee = self.fees.swap_fee_of(dy_pre_fee)?;
        let admin_portion = self.fees.admin_portion(fee)?;
        let dy_normalized = dy_pre_fee - fee;

        let dy = self.rates.denormalize(j, dy_normalized)?;
        if dy == 0 {
            return Err(StableSwapError::ZeroAmount);
        }

        Ok(SwapQuote {
            dy,
            fee: self.rates.denormalize(j, fee)?,
            admin_fee: self.rates.denormalize(j, admin_portion)?,
            d_before,
        })
    }

    /// D after the trade must not be below D before it
    fn check_invariant_held(&self, d_before: u128, next: &PoolState<N>) -> Result<()> {
        let d_after = self.invariant_of(next)?;
        if d_after < d_before {
            warn!(d_before, d_after, "swap would shrink the invariant");
            return Err(StableSwapError::InvariantViolation {
                before: d_before,
                after: d_after,
            });
        }
        Ok(())
    }
}
