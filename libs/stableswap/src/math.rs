//! Deterministic integer helpers shared by every component
//!
//! Products are taken in a 256-bit accumulator and narrowed back to `u128`
//! with an explicit overflow check. Rounding is always explicit: `_down`
//! truncates, `_up` rounds toward positive infinity.

use crate::error::{Result, StableSwapError};
use primitive_types::U256;

/// Widen a `u128` into the 256-bit accumulator
#[inline]
pub fn wide(value: u128) -> U256 {
    U256::from(value)
}

/// Narrow a 256-bit value back to `u128`
#[inline]
pub fn narrow(value: U256) -> Result<u128> {
    if value > U256::from(u128::MAX) {
        return Err(StableSwapError::Overflow);
    }
    Ok(value.low_u128())
}

/// `a / b`, rounding down
#[inline]
pub fn div_down(a: u128, b: u128) -> Result<u128> {
    a.checked_div(b).ok_or(StableSwapError::DegenerateBalances)
}

/// `a / b`, rounding up
#[inline]
pub fn div_up(a: u128, b: u128) -> Result<u128> {
    if b == 0 {
        return Err(StableSwapError::DegenerateBalances);
    }
    let q = a / b;
    if a % b == 0 {
        Ok(q)
    } else {
        q.checked_add(1).ok_or(StableSwapError::Overflow)
    }
}

/// `a * b / d` with a 256-bit intermediate, rounding down
pub fn mul_div_down(a: u128, b: u128, d: u128) -> Result<u128> {
    if d == 0 {
        return Err(StableSwapError::DegenerateBalances);
    }
    // u128 * u128 always fits in 256 bits
    narrow(wide(a) * wide(b) / wide(d))
}

/// `a * b / d` with a 256-bit intermediate, rounding up
pub fn mul_div_up(a: u128, b: u128, d: u128) -> Result<u128> {
    if d == 0 {
        return Err(StableSwapError::DegenerateBalances);
    }
    let product = wide(a) * wide(b);
    let divisor = wide(d);
    let mut q = product / divisor;
    if !(product % divisor).is_zero() {
        q = q + U256::one();
    }
    narrow(q)
}

/// `|a - b|`
#[inline]
pub fn abs_diff(a: u128, b: u128) -> u128 {
    a.abs_diff(b)
}

/// `|a - b|` on the wide accumulator
#[inline]
pub fn abs_diff_wide(a: U256, b: U256) -> U256 {
    if a > b {
        a - b
    } else {
        b - a
    }
}

/// `base^exp` for the small exponents used in `n^n` terms
pub fn pow_small(base: u128, exp: u32) -> Result<u128> {
    base.checked_pow(exp).ok_or(StableSwapError::Overflow)
}

/// Overflow-checked sum
pub fn checked_sum(values: &[u128]) -> Result<u128> {
    values.iter().try_fold(0u128, |acc, &v| {
        acc.checked_add(v).ok_or(StableSwapError::Overflow)
    })
}

/// Checked `a * b` on the wide accumulator
#[inline]
pub fn wmul(a: U256, b: U256) -> Result<U256> {
    a.checked_mul(b).ok_or(StableSwapError::Overflow)
}

/// Checked `a + b` on the wide accumulator
#[inline]
pub fn wadd(a: U256, b: U256) -> Result<U256> {
    a.checked_add(b).ok_or(StableSwapError::Overflow)
}

/// Checked `a - b` on the wide accumulator
#[inline]
pub fn wsub(a: U256, b: U256) -> Result<U256> {
    a.checked_sub(b).ok_or(StableSwapError::Overflow)
}

/// Checked `a / b` on the wide accumulator, rounding down
#[inline]
pub fn wdiv(a: U256, b: U256) -> Result<U256> {
    a.checked_div(b).ok_or(StableSwapError::DegenerateBalances)
}
