//! Deposits and withdrawals
//!
//! Proportional withdrawal is fee-free and stays open while the pool is
//! paused, so liquidity providers can always exit. Every path that changes
//! the pool's composition (imbalanced deposit, single-asset or imbalanced
//! withdrawal) pays the imbalance fee on each asset's deviation from the
//! proportional ideal, which makes it equivalent to a balanced operation
//! followed by swaps.

use super::StableSwapPool;
use crate::constants::FEE_DENOMINATOR;
use crate::error::{Result, StableSwapError};
use crate::host_traits::{AssetCustody, ShareToken};
use crate::invariant::{compute_d, compute_y_d};
use crate::math::{abs_diff, mul_div_down};
use tracing::debug;

/// Shares minted (deposit) or burned (imbalanced withdrawal) plus the
/// imbalance fee charged per asset, in raw units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityQuote<const N: usize> {
    pub shares: u128,
    pub fees: [u128; N],
    pub admin_fees: [u128; N],
}

/// Single-asset withdrawal pricing, in raw units of the withdrawn asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawQuote {
    pub amount: u128,
    pub fee: u128,
    pub admin_fee: u128,
}

/// Balances after the imbalance fee
struct Rebalanced<const N: usize> {
    /// What the pool keeps on its books (admin share removed)
    stored: [u128; N],
    /// What the invariant is measured on (whole fee removed)
    adjusted: [u128; N],
    fees: [u128; N],
    admin_fees: [u128; N],
}

impl<C, S, const N: usize> StableSwapPool<C, S, N>
where
    C: AssetCustody,
    S: ShareToken<AccountId = C::AccountId>,
{
    /// Deposit `amounts` and mint at least `min_shares`
    pub fn deposit(
        &mut self,
        caller: &C::AccountId,
        amounts: [u128; N],
        min_shares: u128,
    ) -> Result<u128> {
        let _entered = self.lock.enter()?;
        self.access.ensure_not_paused()?;

        let (quote, stored) = self.price_deposit(&amounts)?;
        if quote.shares < min_shares {
            return Err(StableSwapError::SlippageExceeded {
                actual: quote.shares,
                limit: min_shares,
            });
        }

        let mut next = self.state;
        next.balances = stored;
        for (k, &admin) in quote.admin_fees.iter().enumerate() {
            next.admin_fees.credit(k, admin)?;
        }
        next.total_shares = next
            .total_shares
            .checked_add(quote.shares)
            .ok_or(StableSwapError::Overflow)?;
        self.invariant_of(&next)?;

        self.settle(next, |assets, custody, shares| {
            Self::pull_in(assets, custody, caller, &amounts)?;
            shares.mint(caller, quote.shares)
        })?;

        debug!(?caller, ?amounts, minted = quote.shares, "liquidity added");
        Ok(quote.shares)
    }

    /// Burn `shares` and receive every asset pro rata
    ///
    /// Available while paused.
    pub fn withdraw_proportional(
        &mut self,
        caller: &C::AccountId,
        shares: u128,
        min_amounts: [u128; N],
    ) -> Result<[u128; N]> {
        let _entered = self.lock.enter()?;
        if shares == 0 {
            return Err(StableSwapError::ZeroAmount);
        }
        self.ensure_share_balance(caller, shares)?;

        let total = self.state.total_shares;
        let mut amounts = [0u128; N];
        for (k, amount) in amounts.iter_mut().enumerate() {
            *amount = mul_div_down(self.state.balances[k], shares, total)?;
            if *amount < min_amounts[k] {
                return Err(StableSwapError::SlippageExceeded {
                    actual: *amount,
                    limit: min_amounts[k],
                });
            }
        }
        if amounts.iter().all(|&a| a == 0) {
            return Err(StableSwapError::ZeroAmount);
        }

        let mut next = self.state;
        for (balance, &amount) in next.balances.iter_mut().zip(amounts.iter()) {
            *balance -= amount;
        }
        next.total_shares -= shares;

        self.settle(next, |assets, custody, share_token| {
            share_token.burn(caller, shares)?;
            for (asset, &amount) in assets.iter().zip(amounts.iter()) {
                if amount > 0 {
                    custody.transfer_out(asset, caller, amount)?;
                }
            }
            Ok(())
        })?;

        debug!(?caller, shares, ?amounts, "liquidity removed proportionally");
        Ok(amounts)
    }

    /// Burn `shares` and receive only asset `k`
    pub fn withdraw_single_asset(
        &mut self,
        caller: &C::AccountId,
        shares: u128,
        k: usize,
        min_amount: u128,
    ) -> Result<u128> {
        let _entered = self.lock.enter()?;
        self.access.ensure_not_paused()?;
        self.check_index(k)?;
        if shares == 0 {
            return Err(StableSwapError::ZeroAmount);
        }
        self.ensure_share_balance(caller, shares)?;

        let quote = self.price_withdraw_single(shares, k)?;
        if quote.amount < min_amount {
            return Err(StableSwapError::SlippageExceeded {
                actual: quote.amount,
                limit: min_amount,
            });
        }

        let mut next = self.state;
        let outflow = quote
            .amount
            .checked_add(quote.admin_fee)
            .ok_or(StableSwapError::Overflow)?;
        next.balances[k] = next.balances[k].checked_sub(outflow).ok_or(
            StableSwapError::InsufficientLiquidity {
                index: k,
                requested: outflow,
                available: next.balances[k],
            },
        )?;
        next.admin_fees.credit(k, quote.admin_fee)?;
        next.total_shares -= shares;
        self.invariant_of(&next)?;

        self.settle(next, |assets, custody, share_token| {
            share_token.burn(caller, shares)?;
            custody.transfer_out(&assets[k], caller, quote.amount)
        })?;

        debug!(
            ?caller,
            shares,
            k,
            amount = quote.amount,
            fee = quote.fee,
            "liquidity removed in one asset"
        );
        Ok(quote.amount)
    }

    /// Withdraw exactly `amounts`, burning at most `max_shares`
    pub fn withdraw_imbalanced(
        &mut self,
        caller: &C::AccountId,
        amounts: [u128; N],
        max_shares: u128,
    ) -> Result<u128> {
        let _entered = self.lock.enter()?;
        self.access.ensure_not_paused()?;

        let (quote, stored) = self.price_withdraw_imbalanced(&amounts)?;
        if quote.shares > max_shares {
            return Err(StableSwapError::SlippageExceeded {
                actual: quote.shares,
                limit: max_shares,
            });
        }
        self.ensure_share_balance(caller, quote.shares)?;

        let mut next = self.state;
        next.balances = stored;
        for (k, &admin) in quote.admin_fees.iter().enumerate() {
            next.admin_fees.credit(k, admin)?;
        }
        next.total_shares -= quote.shares;
        self.invariant_of(&next)?;

        self.settle(next, |assets, custody, share_token| {
            share_token.burn(caller, quote.shares)?;
            for (asset, &amount) in assets.iter().zip(amounts.iter()) {
                if amount > 0 {
                    custody.transfer_out(asset, caller, amount)?;
                }
            }
            Ok(())
        })?;

        debug!(?caller, ?amounts, burned = quote.shares, "liquidity removed imbalanced");
        Ok(quote.shares)
    }

    /// Shares a deposit of `amounts` would mint, fees included
    pub fn quote_deposit(&self, amounts: [u128; N]) -> Result<LiquidityQuote<N>> {
        self.price_deposit(&amounts).map(|(quote, _)| quote)
    }

    /// Amount of asset `k` that burning `shares` would pay out
    pub fn quote_withdraw_single_asset(&self, shares: u128, k: usize) -> Result<WithdrawQuote> {
        self.check_index(k)?;
        if shares == 0 {
            return Err(StableSwapError::ZeroAmount);
        }
        self.price_withdraw_single(shares, k)
    }

    /// Shares an imbalanced withdrawal of `amounts` would burn
    pub fn quote_withdraw_imbalanced(&self, amounts: [u128; N]) -> Result<LiquidityQuote<N>> {
        self.price_withdraw_imbalanced(&amounts).map(|(quote, _)| quote)
    }

    // ---------------------------------------------------------------------
    // Pricing
    // ---------------------------------------------------------------------

    fn price_deposit(&self, amounts: &[u128; N]) -> Result<(LiquidityQuote<N>, [u128; N])> {
        if amounts.iter().all(|&a| a == 0) {
            return Err(StableSwapError::ZeroAmount);
        }
        let amp = self.amplification;
        let old = self.state.balances;
        let total = self.state.total_shares;

        // The first deposit has to seed every asset or D is undefined
        if total == 0 && amounts.iter().any(|&a| a == 0) {
            return Err(StableSwapError::ZeroAmount);
        }
        let d0 = if total > 0 {
            compute_d(&self.normalized(&old)?, amp)?
        } else {
            0
        };

        let mut new = old;
        for (balance, &amount) in new.iter_mut().zip(amounts.iter()) {
            *balance = balance
                .checked_add(amount)
                .ok_or(StableSwapError::Overflow)?;
        }
        let d1 = compute_d(&self.normalized(&new)?, amp)?;
        if d1 <= d0 {
            return Err(StableSwapError::ZeroAmount);
        }

        if total == 0 {
            return Ok((
                LiquidityQuote {
                    shares: d1,
                    fees: [0; N],
                    admin_fees: [0; N],
                },
                new,
            ));
        }

        let rebalanced = self.apply_imbalance_fee(&old, &new, d0, d1)?;
        let d2 = compute_d(&self.normalized(&rebalanced.adjusted)?, amp)?;
        let gained = d2.checked_sub(d0).ok_or(StableSwapError::ZeroAmount)?;
        let shares = mul_div_down(total, gained, d0)?;
        if shares == 0 {
            return Err(StableSwapError::ZeroAmount);
        }

        Ok((
            LiquidityQuote {
                shares,
                fees: rebalanced.fees,
                admin_fees: rebalanced.admin_fees,
            },
            rebalanced.stored,
        ))
    }

    fn price_withdraw_single(&self, shares: u128, k: usize) -> Result<WithdrawQuote> {
        let total = self.state.total_shares;
        if shares > total {
            return Err(StableSwapError::InsufficientShares {
                requested: shares,
                available: total,
            });
        }
        // Draining the whole supply into one asset would strand the others
        if shares == total {
            return Err(StableSwapError::ParameterOutOfBounds {
                parameter: "shares",
                value: shares,
            });
        }

        let amp = self.amplification;
        let xp = self.normalized(&self.state.balances)?;
        let d0 = compute_d(&xp, amp)?;
        let d1 = d0 - mul_div_down(shares, d0, total)?;
        let new_y = compute_y_d(k, &xp, d1, amp)?;

        let fee_rate = self.fees.imbalance_fee_rate::<N>()?;
        let mut reduced = xp;
        for (j, x) in reduced.iter_mut().enumerate() {
            let proportional = mul_div_down(xp[j], d1, d0)?;
            let expected = if j == k {
                proportional.saturating_sub(new_y)
            } else {
                xp[j] - proportional
            };
            *x -= mul_div_down(fee_rate, expected, FEE_DENOMINATOR)?;
        }

        let y_after_fee = compute_y_d(k, &reduced, d1, amp)?;
        let dy_normalized = reduced[k]
            .checked_sub(y_after_fee)
            .and_then(|v| v.checked_sub(1))
            .ok_or(StableSwapError::ZeroAmount)?;
        let amount = self.rates.denormalize(k, dy_normalized)?;
        if amount == 0 {
            return Err(StableSwapError::ZeroAmount);
        }

        let without_fee = self.rates.denormalize(k, xp[k].saturating_sub(new_y))?;
        let fee = without_fee.saturating_sub(amount);
        Ok(WithdrawQuote {
            amount,
            fee,
            admin_fee: self.fees.admin_portion(fee)?,
        })
    }

    fn price_withdraw_imbalanced(
        &self,
        amounts: &[u128; N],
    ) -> Result<(LiquidityQuote<N>, [u128; N])> {
        if amounts.iter().all(|&a| a == 0) {
            return Err(StableSwapError::ZeroAmount);
        }
        let amp = self.amplification;
        let old = self.state.balances;
        let total = self.state.total_shares;

        let mut new = old;
        for (k, (balance, &amount)) in new.iter_mut().zip(amounts.iter()).enumerate() {
            *balance = balance.checked_sub(amount).ok_or(
                StableSwapError::InsufficientLiquidity {
                    index: k,
                    requested: amount,
                    available: *balance,
                },
            )?;
        }

        let d0 = compute_d(&self.normalized(&old)?, amp)?;
        let d1 = compute_d(&self.normalized(&new)?, amp)?;
        let rebalanced = self.apply_imbalance_fee(&old, &new, d0, d1)?;
        let d2 = compute_d(&self.normalized(&rebalanced.adjusted)?, amp)?;

        let lost = d0.checked_sub(d2).ok_or(StableSwapError::InvariantViolation {
            before: d0,
            after: d2,
        })?;
        // Round the burn up by one share in the pool's favour
        let shares = mul_div_down(lost, total, d0)?
            .checked_add(1)
            .ok_or(StableSwapError::Overflow)?;
        if shares >= total {
            return Err(StableSwapError::ParameterOutOfBounds {
                parameter: "shares",
                value: shares,
            });
        }

        Ok((
            LiquidityQuote {
                shares,
                fees: rebalanced.fees,
                admin_fees: rebalanced.admin_fees,
            },
            rebalanced.stored,
        ))
    }

    /// Charge each asset `fee_rate · |ideal − new|` where
    /// `ideal = old · D1 / D0` is the balance a proportional change would give
    fn apply_imbalance_fee(
        &self,
        old: &[u128; N],
        new: &[u128; N],
        d0: u128,
        d1: u128,
    ) -> Result<Rebalanced<N>> {
        let mut out = Rebalanced {
            stored: *new,
            adjusted: *new,
            fees: [0; N],
            admin_fees: [0; N],
        };
        for k in 0..N {
            let ideal = mul_div_down(d1, old[k], d0)?;
            let fee = self.fees.imbalance_fee_of::<N>(abs_diff(ideal, new[k]))?;
            let admin = self.fees.admin_portion(fee)?;
            out.fees[k] = fee;
            out.admin_fees[k] = admin;
            out.stored[k] = new[k].checked_sub(admin).ok_or(StableSwapError::Overflow)?;
            out.adjusted[k] = new[k].checked_sub(fee).ok_or(StableSwapError::Overflow)?;
        }
        Ok(out)
    }

    fn ensure_share_balance(&self, caller: &C::AccountId, shares: u128) -> Result<()> {
        let available = self.share_token.balance_of(caller);
        if available < shares {
            return Err(StableSwapError::InsufficientShares {
                requested: shares,
                available,
            });
        }
        if shares > self.state.total_shares {
            return Err(StableSwapError::InsufficientShares {
                requested: shares,
                available: self.state.total_shares,
            });
        }
        Ok(())
    }
}
