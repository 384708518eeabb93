//! Fee parameters and the operator's fee ledger
//!
//! Fees are fractions of [`FEE_DENOMINATOR`]. The swap fee is taken from
//! the output side of a swap; the admin fee is the share of that revenue owed
//! to the operator. Whatever is not diverted stays in the pool and raises D
//! per share for liquidity providers.

use crate::constants::{FEE_DENOMINATOR, MAX_ADMIN_FEE, MAX_SWAP_FEE};
use crate::error::{Result, StableSwapError};
use crate::math::{div_down, mul_div_down};

/// Swap and admin fee settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fees {
    swap_fee: u128,
    admin_fee: u128,
}

impl Fees {
    pub fn new(swap_fee: u128, admin_fee: u128) -> Result<Self> {
        validate_swap_fee(swap_fee)?;
        validate_admin_fee(admin_fee)?;
        Ok(Self {
            swap_fee,
            admin_fee,
        })
    }

    pub fn swap_fee(&self) -> u128 {
        self.swap_fee
    }

    pub fn admin_fee(&self) -> u128 {
        self.admin_fee
    }

    pub fn set_swap_fee(&mut self, swap_fee: u128) -> Result<()> {
        validate_swap_fee(swap_fee)?;
        self.swap_fee = swap_fee;
        Ok(())
    }

    pub fn set_admin_fee(&mut self, admin_fee: u128) -> Result<()> {
        validate_admin_fee(admin_fee)?;
        self.admin_fee = admin_fee;
        Ok(())
    }

    /// Swap fee charged on `amount`
    pub fn swap_fee_of(&self, amount: u128) -> Result<u128> {
        mul_div_down(amount, self.swap_fee, FEE_DENOMINATOR)
    }

    /// Operator's share of an already-charged fee
    pub fn admin_portion(&self, fee: u128) -> Result<u128> {
        mul_div_down(fee, self.admin_fee, FEE_DENOMINATOR)
    }

    /// Fee rate applied to each asset's deviation from the balanced ideal
    /// during imbalanced deposits and withdrawals: `fee·n / (4·(n − 1))`.
    ///
    /// Half the swap fee for n = 2, tending to a quarter as n grows.
    pub fn imbalance_fee_rate<const N: usize>(&self) -> Result<u128> {
        let n = N as u128;
        let numerator = self
            .swap_fee
            .checked_mul(n)
            .ok_or(StableSwapError::Overflow)?;
        div_down(numerator, 4 * (n - 1))
    }

    /// Imbalance fee charged on a deviation `diff`
    pub fn imbalance_fee_of<const N: usize>(&self, diff: u128) -> Result<u128> {
        mul_div_down(self.imbalance_fee_rate::<N>()?, diff, FEE_DENOMINATOR)
    }
}

fn validate_swap_fee(fee: u128) -> Result<()> {
    if fee > MAX_SWAP_FEE {
        return Err(StableSwapError::ParameterOutOfBounds {
            parameter: "swap_fee",
            value: fee,
        });
    }
    Ok(())
}

fn validate_admin_fee(fee: u128) -> Result<()> {
    if fee > MAX_ADMIN_FEE {
        return Err(StableSwapError::ParameterOutOfBounds {
            parameter: "admin_fee",
            value: fee,
        });
    }
    Ok(())
}

/// Fee revenue owed to the pool operator, per asset, in raw units
///
/// These amounts sit in custody next to the liquidity providers' funds but
/// never enter the pool balances or the invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminFeeLedger<const N: usize> {
    accrued: [u128; N],
}

impl<const N: usize> Default for AdminFeeLedger<N> {
    fn default() -> Self {
        Self { accrued: [0; N] }
    }
}

impl<const N: usize> AdminFeeLedger<N> {
    pub fn accrued(&self) -> [u128; N] {
        self.accrued
    }

    pub fn get(&self, index: usize) -> u128 {
        self.accrued[index]
    }

    pub fn credit(&mut self, index: usize, amount: u128) -> Result<()> {
        self.accrued[index] = self.accrued[index]
            .checked_add(amount)
            .ok_or(StableSwapError::Overflow)?;
        Ok(())
    }

    pub fn debit(&mut self, index: usize, amount: u128) -> Result<()> {
        let available = self.accrued[index];
        if amount > available {
            return Err(StableSwapError::InsufficientAdminFees {
                index,
                requested: amount,
                available,
            });
        }
        self.accrued[index] = available - amount;
        Ok(())
    }
}
