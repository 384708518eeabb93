//! Error types for the StableSwap engine
//!
//! Every variant is a distinct, caller-visible failure reason. Any error
//! aborts the whole operation: the pool's committed state is left untouched.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, StableSwapError>;

/// Errors returned by pool operations and the invariant solver
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StableSwapError {
    /// Asset index outside `[0, N)`
    #[error("Asset index {index} is out of range for a {n}-asset pool")]
    InvalidIndex { index: usize, n: usize },

    /// Operation needs two distinct assets but got the same index twice
    #[error("Asset index {index} used as both input and output")]
    SameAssetIndex { index: usize },

    /// Zero-amount request, or an output that rounds down to zero
    #[error("Amount must be non-zero")]
    ZeroAmount,

    /// Computed result is worse than the caller's limit
    #[error("Slippage exceeded: got {actual}, limit {limit}")]
    SlippageExceeded { actual: u128, limit: u128 },

    /// Pool is paused (also returned when pausing an already paused pool)
    #[error("Pool is paused")]
    PoolPaused,

    /// Unpause requested on a pool that is running
    #[error("Pool is not paused")]
    PoolNotPaused,

    /// Caller is not the pool owner
    #[error("Caller is not the pool owner")]
    Unauthorized,

    /// Parameter outside its allowed range; never clamped
    #[error("Parameter {parameter} out of bounds: {value}")]
    ParameterOutOfBounds {
        parameter: &'static str,
        value: u128,
    },

    /// Newton-Raphson iteration hit the cap without converging
    #[error("Solver did not converge after {iterations} iterations")]
    DidNotConverge { iterations: u32 },

    /// Post-operation invariant check failed
    #[error("Invariant violation: D went from {before} to {after}")]
    InvariantViolation { before: u128, after: u128 },

    /// Caller holds fewer pool shares than the operation burns
    #[error("Insufficient shares: requested {requested}, available {available}")]
    InsufficientShares { requested: u128, available: u128 },

    /// Pool holds less of an asset than the operation withdraws
    #[error("Insufficient liquidity for asset {index}: requested {requested}, available {available}")]
    InsufficientLiquidity {
        index: usize,
        requested: u128,
        available: u128,
    },

    /// Admin fee withdrawal exceeds what has accrued
    #[error("Insufficient admin fees for asset {index}: requested {requested}, available {available}")]
    InsufficientAdminFees {
        index: usize,
        requested: u128,
        available: u128,
    },

    /// A state-mutating entry point was entered while another was in progress
    #[error("Reentrant call rejected")]
    Reentrancy,

    /// Arithmetic exceeded the widened accumulator or the u128 result range
    #[error("Arithmetic overflow")]
    Overflow,

    /// Invariant math over balances containing a zero entry
    #[error("Degenerate balances: invariant undefined with a zero balance")]
    DegenerateBalances,

    /// Custody or share-token collaborator rejected a transfer
    #[error("Transfer failed: {0}")]
    TransferFailed(String),
}

impl StableSwapError {
    /// Solver failures reject the call but leave the pool usable
    pub fn is_computational(&self) -> bool {
        matches!(
            self,
            Self::DidNotConverge { .. }
                | Self::InvariantViolation { .. }
                | Self::Overflow
                | Self::DegenerateBalances
        )
    }
}
