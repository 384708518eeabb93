//! Fixed protocol constants for the StableSwap engine
//!
//! All invariant math runs on normalised balances scaled to [`PRECISION`].
//! Fees are expressed as integer fractions of [`FEE_DENOMINATOR`].

/// Decimal places of the common internal unit
pub const POOL_DECIMALS: u32 = 18;

/// One whole internal unit (10^18)
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

/// Scale of rate multipliers: normalised = raw * rate / RATE_PRECISION
pub const RATE_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Denominator for swap and admin fees (1e10 = 100%)
pub const FEE_DENOMINATOR: u128 = 10_000_000_000;

/// Swap fee ceiling: 1% of the denominator
pub const MAX_SWAP_FEE: u128 = 100_000_000;

/// Admin fee ceiling: the whole swap fee
pub const MAX_ADMIN_FEE: u128 = FEE_DENOMINATOR;

/// Amplification bounds
pub const MIN_A: u128 = 1;
pub const MAX_A: u128 = 1_000_000;

/// Largest factor a single `set_amplification` call may move A by
pub const MAX_A_CHANGE: u128 = 10;

/// Newton-Raphson iteration cap for both D and y
pub const MAX_ITERATIONS: u32 = 255;

/// Supported pool widths
pub const MIN_ASSETS: usize = 2;
pub const MAX_ASSETS: usize = 8;

/// Assets with more native decimals than the internal unit are rejected
pub const MAX_DECIMALS: u8 = 18;

/// Ceiling for any single normalised balance (10^12 whole tokens).
///
/// Balanced and moderately skewed pools stay well below 2^256 in every
/// intermediate of the D recurrence. The `Dⁿ⁺¹ / Πxᵢ` term grows with the
/// ratio between the largest and smallest balance, so extremely lopsided
/// states (e.g. `[10^30, 1]` at A = 10^6) exceed the accumulator and are
/// rejected with `Overflow`.
pub const MAX_NORMALIZED_BALANCE: u128 = 1_000_000_000_000_000_000_000_000_000_000;
