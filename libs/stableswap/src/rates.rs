//! Rate multipliers: raw per-asset balances to the common internal unit
//!
//! `normalized = raw * rate / RATE_PRECISION`. A plain stablecoin with `d`
//! decimals carries `10^(18 - d) * RATE_PRECISION`; interest-bearing assets
//! scale that by their exchange rate.
//!
//! Rounding always favours the pool: amounts paid out are denormalised
//! down, amounts required in are denormalised up.

use crate::constants::{MAX_DECIMALS, POOL_DECIMALS, RATE_PRECISION};
use crate::error::{Result, StableSwapError};
use crate::math::{mul_div_down, mul_div_up, pow_small};

/// Per-asset scaling factors for an N-asset pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateMultipliers<const N: usize> {
    rates: [u128; N],
}

impl<const N: usize> RateMultipliers<N> {
    /// Build from explicit rates; every rate must be non-zero
    pub fn new(rates: [u128; N]) -> Result<Self> {
        for &rate in rates.iter() {
            if rate == 0 {
                return Err(StableSwapError::ParameterOutOfBounds {
                    parameter: "rate_multiplier",
                    value: 0,
                });
            }
        }
        Ok(Self { rates })
    }

    /// Build the plain decimal-alignment rates
    pub fn from_decimals(decimals: [u8; N]) -> Result<Self> {
        let mut rates = [0u128; N];
        for (rate, &d) in rates.iter_mut().zip(decimals.iter()) {
            *rate = default_rate_for_decimals(d)?;
        }
        Self::new(rates)
    }

    pub fn get(&self, i: usize) -> u128 {
        self.rates[i]
    }

    /// Raw → normalised, rounding down
    pub fn normalize(&self, i: usize, raw: u128) -> Result<u128> {
        mul_div_down(raw, self.rates[i], RATE_PRECISION)
    }

    /// Normalised → raw, rounding down (payouts)
    pub fn denormalize(&self, i: usize, normalized: u128) -> Result<u128> {
        mul_div_down(normalized, RATE_PRECISION, self.rates[i])
    }

    /// Normalised → raw, rounding up (amounts owed to the pool)
    pub fn denormalize_up(&self, i: usize, normalized: u128) -> Result<u128> {
        mul_div_up(normalized, RATE_PRECISION, self.rates[i])
    }

    /// Normalise a full balance vector
    pub fn normalize_all(&self, raw: &[u128; N]) -> Result<[u128; N]> {
        let mut xp = [0u128; N];
        for (i, x) in xp.iter_mut().enumerate() {
            *x = self.normalize(i, raw[i])?;
        }
        Ok(xp)
    }

    /// Replace one rate. Zero is rejected: it would erase the asset's weight
    /// and turn every later denormalisation into a division by zero.
    pub fn set(&mut self, i: usize, rate: u128) -> Result<()> {
        if rate == 0 {
            return Err(StableSwapError::ParameterOutOfBounds {
                parameter: "rate_multiplier",
                value: 0,
            });
        }
        self.rates[i] = rate;
        Ok(())
    }
}

/// `10^(18 - decimals) * RATE_PRECISION`
pub fn default_rate_for_decimals(decimals: u8) -> Result<u128> {
    if decimals > MAX_DECIMALS {
        return Err(StableSwapError::ParameterOutOfBounds {
            parameter: "decimals",
            value: decimals as u128,
        });
    }
    let scale = pow_small(10, POOL_DECIMALS - decimals as u32)?;
    scale
        .checked_mul(RATE_PRECISION)
        .ok_or(StableSwapError::Overflow)
}
