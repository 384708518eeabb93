//! StableSwap pool aggregate
//!
//! Owns the raw balances, share supply, fee parameters, rate multipliers,
//! admin fee ledger and access control for one fixed-width pool, and drives
//! the invariant solver for swaps and liquidity operations.
//!
//! ## Execution model
//!
//! Every state-mutating entry point follows the same shape:
//!
//! 1. take the reentrancy lock
//! 2. validate and compute against committed state (pure)
//! 3. commit the new internal state
//! 4. call the custody and share-token collaborators
//!
//! Before step 3 the invariant is recomputed on the balances about to be
//! committed, so a call can never leave the pool in a state the solver
//! cannot price. Multi-asset pulls check every leg with
//! [`AssetCustody::ensure_transfer_in`] before the first one moves. If step 4
//! still fails the committed state is rolled back to the step 2 snapshot;
//! undoing whatever a collaborator already moved is the host's transaction.
//! Views read committed state and never touch the lock.

mod admin;
mod liquidity;
mod swap;

pub use liquidity::{LiquidityQuote, WithdrawQuote};
pub use swap::SwapQuote;

use crate::access::{AccessControl, ReentrancyLock};
use crate::constants::{
    MAX_A, MAX_ASSETS, MAX_DECIMALS, MAX_NORMALIZED_BALANCE, MIN_A, MIN_ASSETS, POOL_DECIMALS,
    PRECISION,
};
use crate::error::{Result, StableSwapError};
use crate::fees::{AdminFeeLedger, Fees};
use crate::host_traits::{AssetCustody, ShareToken};
use crate::invariant::compute_d;
use crate::math::mul_div_down;
use crate::rates::{default_rate_for_decimals, RateMultipliers};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Construction input for one pooled asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSpec<AssetId> {
    pub asset: AssetId,
    pub decimals: u8,
    /// Explicit rate; defaults to plain decimal alignment
    pub rate_multiplier: Option<u128>,
}

impl<AssetId> AssetSpec<AssetId> {
    pub fn new(asset: AssetId, decimals: u8) -> Self {
        Self {
            asset,
            decimals,
            rate_multiplier: None,
        }
    }

    pub fn with_rate(mut self, rate_multiplier: u128) -> Self {
        self.rate_multiplier = Some(rate_multiplier);
        self
    }
}

/// Share token metadata plus the initial curve and fee settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolParameters {
    pub share_name: String,
    pub share_symbol: String,
    pub amplification: u128,
    pub swap_fee: u128,
    pub admin_fee: u128,
}

/// One asset as seen from the outside
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSlot<AssetId> {
    pub asset: AssetId,
    pub balance: u128,
    pub rate_multiplier: u128,
    pub decimals: u8,
}

/// Point-in-time view of the whole pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot<AssetId> {
    pub share_name: String,
    pub share_symbol: String,
    pub assets: Vec<AssetSlot<AssetId>>,
    pub amplification: u128,
    pub swap_fee: u128,
    pub admin_fee: u128,
    pub total_shares: u128,
    pub admin_fees_accrued: Vec<u128>,
    pub invariant: u128,
    pub virtual_price: u128,
    pub paused: bool,
}

/// State that operations commit atomically
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PoolState<const N: usize> {
    pub balances: [u128; N],
    pub total_shares: u128,
    pub admin_fees: AdminFeeLedger<N>,
}

/// StableSwap pool over `N` pegged assets
pub struct StableSwapPool<C, S, const N: usize>
where
    C: AssetCustody,
    S: ShareToken<AccountId = C::AccountId>,
{
    assets: [C::AssetId; N],
    decimals: [u8; N],
    rates: RateMultipliers<N>,
    amplification: u128,
    fees: Fees,
    state: PoolState<N>,
    access: AccessControl<C::AccountId>,
    lock: ReentrancyLock,
    share_name: String,
    share_symbol: String,
    custody: C,
    share_token: S,
}

impl<C, S, const N: usize> StableSwapPool<C, S, N>
where
    C: AssetCustody,
    S: ShareToken<AccountId = C::AccountId>,
{
    /// Create an empty pool
    pub fn new(
        assets: [AssetSpec<C::AssetId>; N],
        params: PoolParameters,
        owner: C::AccountId,
        custody: C,
        share_token: S,
    ) -> Result<Self> {
        if !(MIN_ASSETS..=MAX_ASSETS).contains(&N) {
            return Err(StableSwapError::ParameterOutOfBounds {
                parameter: "asset_count",
                value: N as u128,
            });
        }
        if !(MIN_A..=MAX_A).contains(&params.amplification) {
            return Err(StableSwapError::ParameterOutOfBounds {
                parameter: "amplification",
                value: params.amplification,
            });
        }
        let fees = Fees::new(params.swap_fee, params.admin_fee)?;

        let mut rates = [0u128; N];
        for (rate, spec) in rates.iter_mut().zip(assets.iter()) {
            if spec.decimals > MAX_DECIMALS {
                return Err(StableSwapError::ParameterOutOfBounds {
                    parameter: "decimals",
                    value: spec.decimals as u128,
                });
            }
            *rate = match spec.rate_multiplier {
                Some(explicit) => explicit,
                None => default_rate_for_decimals(spec.decimals)?,
            };
        }
        let rates = RateMultipliers::new(rates)?;
        let decimals: [u8; N] = std::array::from_fn(|i| assets[i].decimals);
        let assets = assets.map(|spec| spec.asset);

        info!(
            n = N,
            amplification = params.amplification,
            swap_fee = params.swap_fee,
            admin_fee = params.admin_fee,
            share_symbol = %params.share_symbol,
            "stableswap pool created"
        );

        Ok(Self {
            assets,
            decimals,
            rates,
            amplification: params.amplification,
            fees,
            state: PoolState {
                balances: [0; N],
                total_shares: 0,
                admin_fees: AdminFeeLedger::default(),
            },
            access: AccessControl::new(owner),
            lock: ReentrancyLock::new(),
            share_name: params.share_name,
            share_symbol: params.share_symbol,
            custody,
            share_token,
        })
    }

    // ---------------------------------------------------------------------
    // Views
    // ---------------------------------------------------------------------

    /// Pool value per share at [`PRECISION`]; exactly one unit when empty
    pub fn virtual_price(&self) -> Result<u128> {
        if self.state.total_shares == 0 {
            return Ok(PRECISION);
        }
        let d = self.invariant()?;
        mul_div_down(d, PRECISION, self.state.total_shares)
    }

    /// Virtual price as a decimal for display
    pub fn virtual_price_decimal(&self) -> Result<Decimal> {
        let raw = i128::try_from(self.virtual_price()?).map_err(|_| StableSwapError::Overflow)?;
        Decimal::try_from_i128_with_scale(raw, POOL_DECIMALS).map_err(|_| StableSwapError::Overflow)
    }

    /// Current invariant D over committed balances
    pub fn invariant(&self) -> Result<u128> {
        compute_d(&self.normalized(&self.state.balances)?, self.amplification)
    }

    /// Raw liquidity-provider balances (accrued admin fees excluded)
    pub fn balances(&self) -> [u128; N] {
        self.state.balances
    }

    pub fn amplification(&self) -> u128 {
        self.amplification
    }

    pub fn fee(&self) -> u128 {
        self.fees.swap_fee()
    }

    pub fn admin_fee(&self) -> u128 {
        self.fees.admin_fee()
    }

    pub fn is_paused(&self) -> bool {
        self.access.is_paused()
    }

    pub fn total_shares(&self) -> u128 {
        self.state.total_shares
    }

    pub fn owner(&self) -> &C::AccountId {
        self.access.owner()
    }

    pub fn admin_fees_accrued(&self) -> [u128; N] {
        self.state.admin_fees.accrued()
    }

    pub fn share_token_name(&self) -> &str {
        &self.share_name
    }

    pub fn share_token_symbol(&self) -> &str {
        &self.share_symbol
    }

    pub fn rate_multiplier(&self, index: usize) -> Result<u128> {
        self.check_index(index)?;
        Ok(self.rates.get(index))
    }

    pub fn asset_slot(&self, index: usize) -> Result<AssetSlot<C::AssetId>> {
        self.check_index(index)?;
        Ok(AssetSlot {
            asset: self.assets[index].clone(),
            balance: self.state.balances[index],
            rate_multiplier: self.rates.get(index),
            decimals: self.decimals[index],
        })
    }

    pub fn snapshot(&self) -> Result<PoolSnapshot<C::AssetId>> {
        let assets = (0..N)
            .map(|i| self.asset_slot(i))
            .collect::<Result<Vec<_>>>()?;
        Ok(PoolSnapshot {
            share_name: self.share_name.clone(),
            share_symbol: self.share_symbol.clone(),
            assets,
            amplification: self.amplification,
            swap_fee: self.fees.swap_fee(),
            admin_fee: self.fees.admin_fee(),
            total_shares: self.state.total_shares,
            admin_fees_accrued: self.state.admin_fees.accrued().to_vec(),
            invariant: self.invariant()?,
            virtual_price: self.virtual_price()?,
            paused: self.access.is_paused(),
        })
    }

    /// Shared handle on the reentrancy lock, for collaborators that need to
    /// detect an in-flight operation
    pub fn reentrancy_lock(&self) -> ReentrancyLock {
        self.lock.clone()
    }

    pub fn custody(&self) -> &C {
        &self.custody
    }

    /// Host-side access to custody (funding wallets, settlement bookkeeping)
    pub fn custody_mut(&mut self) -> &mut C {
        &mut self.custody
    }

    pub fn share_token(&self) -> &S {
        &self.share_token
    }

    pub fn share_token_mut(&mut self) -> &mut S {
        &mut self.share_token
    }

    // ---------------------------------------------------------------------
    // Internal helpers
    // ---------------------------------------------------------------------

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= N {
            return Err(StableSwapError::InvalidIndex { index, n: N });
        }
        Ok(())
    }

    /// Normalise balances, rejecting any beyond the supported magnitude
    fn normalized(&self, balances: &[u128; N]) -> Result<[u128; N]> {
        normalized_within_bounds(&self.rates, balances)
    }

    /// D of the balances in `next`; fails when the solver cannot price them
    fn invariant_of(&self, next: &PoolState<N>) -> Result<u128> {
        let xp = self.normalized(&next.balances)?;
        compute_d(&xp, self.amplification).map_err(|err| {
            if err.is_computational() {
                warn!(
                    error = %err,
                    balances = ?next.balances,
                    "rejecting unpriceable pool state"
                );
            }
            err
        })
    }

    /// Pull every non-zero amount from `from`, checking all legs first
    fn pull_in(
        assets: &[C::AssetId; N],
        custody: &mut C,
        from: &C::AccountId,
        amounts: &[u128; N],
    ) -> Result<()> {
        for (asset, &amount) in assets.iter().zip(amounts.iter()) {
            if amount > 0 {
                custody.ensure_transfer_in(asset, from, amount)?;
            }
        }
        for (asset, &amount) in assets.iter().zip(amounts.iter()) {
            if amount > 0 {
                custody.transfer_in(asset, from, amount)?;
            }
        }
        Ok(())
    }

    /// Swap in `next`, run the external interactions, restore on failure
    fn settle<F>(&mut self, next: PoolState<N>, interactions: F) -> Result<()>
    where
        F: FnOnce(&[C::AssetId; N], &mut C, &mut S) -> Result<()>,
    {
        let previous = std::mem::replace(&mut self.state, next);
        if let Err(err) = interactions(&self.assets, &mut self.custody, &mut self.share_token) {
            warn!(error = %err, "settlement failed, restoring pool state");
            self.state = previous;
            return Err(err);
        }
        Ok(())
    }
}

pub(crate) fn normalized_within_bounds<const N: usize>(
    rates: &RateMultipliers<N>,
    balances: &[u128; N],
) -> Result<[u128; N]> {
    let xp = rates.normalize_all(balances)?;
    if let Some(&too_large) = xp.iter().find(|&&x| x > MAX_NORMALIZED_BALANCE) {
        return Err(StableSwapError::ParameterOutOfBounds {
            parameter: "normalized_balance",
            value: too_large,
        });
    }
    Ok(xp)
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::constants::RATE_PRECISION;
    use crate::ledger::{MemoryCustody, MemoryShareToken};

    #[test]
    fn test_empty_pool_views() {
        let pool = pool::<3>(100, 3_000_000, 0);
        assert_eq!(pool.virtual_price().unwrap(), PRECISION);
        assert_eq!(pool.virtual_price_decimal().unwrap(), Decimal::ONE);
        assert_eq!(pool.balances(), [0; 3]);
        assert_eq!(pool.total_shares(), 0);
        assert_eq!(pool.invariant().unwrap(), 0);
        assert_eq!(pool.share_token_symbol(), "tsLP");
        assert!(!pool.is_paused());
    }

    #[test]
    fn test_construction_rejects_bad_parameters() {
        let params = |amplification, swap_fee| PoolParameters {
            share_name: "LP".into(),
            share_symbol: "LP".into(),
            amplification,
            swap_fee,
            admin_fee: 0,
        };
        let specs = || [AssetSpec::new("A", 18), AssetSpec::new("B", 6)];

        let zero_a = StableSwapPool::<_, _, 2>::new(
            specs(),
            params(0, 0),
            OWNER,
            MemoryCustody::<u32, &str>::new(),
            MemoryShareToken::new(),
        );
        assert!(matches!(
            zero_a,
            Err(StableSwapError::ParameterOutOfBounds {
                parameter: "amplification",
                ..
            })
        ));

        let high_fee = StableSwapPool::<_, _, 2>::new(
            specs(),
            params(100, 200_000_000),
            OWNER,
            MemoryCustody::<u32, &str>::new(),
            MemoryShareToken::new(),
        );
        assert!(high_fee.is_err());

        let single = StableSwapPool::<_, _, 1>::new(
            [AssetSpec::new("A", 18)],
            params(100, 0),
            OWNER,
            MemoryCustody::<u32, &str>::new(),
            MemoryShareToken::new(),
        );
        assert!(matches!(
            single,
            Err(StableSwapError::ParameterOutOfBounds {
                parameter: "asset_count",
                ..
            })
        ));

        let too_precise = StableSwapPool::<_, _, 2>::new(
            [AssetSpec::new("A", 18), AssetSpec::new("B", 24)],
            params(100, 0),
            OWNER,
            MemoryCustody::<u32, &str>::new(),
            MemoryShareToken::new(),
        );
        assert!(too_precise.is_err());
    }

    #[test]
    fn test_asset_slots_and_rates() {
        let pool = StableSwapPool::<_, _, 2>::new(
            [
                AssetSpec::new("USDC", 6),
                AssetSpec::new("sDAI", 18).with_rate(RATE_PRECISION / 100 * 105),
            ],
            PoolParameters {
                share_name: "LP".into(),
                share_symbol: "LP".into(),
                amplification: 100,
                swap_fee: 0,
                admin_fee: 0,
            },
            OWNER,
            MemoryCustody::<u32, &str>::new(),
            MemoryShareToken::new(),
        )
        .unwrap();

        let usdc = pool.asset_slot(0).unwrap();
        assert_eq!(usdc.asset, "USDC");
        assert_eq!(usdc.rate_multiplier, 1_000_000_000_000 * RATE_PRECISION);
        assert_eq!(pool.rate_multiplier(1).unwrap(), RATE_PRECISION / 100 * 105);
        assert_eq!(
            pool.asset_slot(2),
            Err(StableSwapError::InvalidIndex { index: 2, n: 2 })
        );
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut pool = pool::<2>(100, 3_000_000, 0);
        pool.deposit(&ALICE, [1_000 * UNIT, 1_000 * UNIT], 0).unwrap();
        let snapshot = pool.snapshot().unwrap();
        assert_eq!(snapshot.assets.len(), 2);
        assert_eq!(snapshot.total_shares, pool.total_shares());

        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: PoolSnapshot<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.assets[1].asset, "USDC");
        assert_eq!(decoded.virtual_price, snapshot.virtual_price);
    }
}
