//! # Torq StableSwap - Pegged Asset Liquidity Engine
//!
//! ## Purpose
//!
//! Invariant engine for a single liquidity pool holding N assets meant to trade
//! near 1:1 (stablecoins, wrapped variants of one asset). Implements the
//! amplified StableSwap invariant with exact integer arithmetic: swaps,
//! balanced and imbalanced deposits, proportional, single-asset and imbalanced
//! withdrawals, an operator fee ledger, and owner-gated parameter control.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Caller requests from the hosting ledger, pool settings from [`PoolConfig`]
//! - **Output Destinations**: Asset custody and share token collaborators ([`AssetCustody`], [`ShareToken`])
//! - **Precision**: Balances normalised to 18 decimals via per-asset rate multipliers
//! - **Arithmetic**: u128 balances, 256-bit intermediates, every operation checked
//! - **Validation**: Slippage limits, parameter bounds, post-swap invariant check
//!
//! ## Architecture Role
//!
//! ```text
//! request ─▶ StableSwapPool ─▶ RateMultipliers ─▶ invariant::{compute_d, compute_y}
//!                 │                                        │
//!                 ├─ Fees / AdminFeeLedger ◀───────────────┘
//!                 ├─ AccessControl + ReentrancyLock
//!                 └─ commit state ─▶ AssetCustody / ShareToken
//! ```
//!
//! All pool bookkeeping is committed before any collaborator is called. A
//! collaborator failure restores the pool's previous state, so an operation
//! either applies completely or not at all.

pub mod access;
pub mod config;
pub mod constants;
pub mod error;
pub mod fees;
pub mod host_traits;
pub mod invariant;
pub mod ledger;
pub mod math;
pub mod pool;
pub mod rates;

pub use access::{AccessControl, EntryGuard, ReentrancyLock};
pub use config::{AssetConfig, PoolConfig};
pub use error::{Result, StableSwapError};
pub use fees::{AdminFeeLedger, Fees};
pub use host_traits::{AssetCustody, ShareToken};
pub use invariant::{compute_d, compute_y, compute_y_d};
pub use ledger::{MemoryCustody, MemoryShareToken};
pub use pool::{
    AssetSlot, AssetSpec, LiquidityQuote, PoolParameters, PoolSnapshot, StableSwapPool,
    SwapQuote, WithdrawQuote,
};
pub use rates::RateMultipliers;

/// Common types for pool configuration
pub use rust_decimal::Decimal;
