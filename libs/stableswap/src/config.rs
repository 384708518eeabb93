//! Pool Configuration Module
//!
//! Describes a pool in TOML: share token metadata, amplification, fee
//! fractions and the asset list. Loading from a file layers `STABLESWAP_*`
//! environment variables on top, so a deployment can override single values
//! without editing the file.
//!
//! Fees are written as plain fractions (`0.0004` for 4 bps) and converted to
//! [`FEE_DENOMINATOR`] units when the pool is built.

use crate::constants::FEE_DENOMINATOR;
use crate::host_traits::{AssetCustody, ShareToken};
use crate::math::{mul_div_down, pow_small};
use crate::pool::{AssetSpec, PoolParameters, StableSwapPool};
use crate::rates::default_rate_for_decimals;
use anyhow::{anyhow, bail, Context, Result};
use config_crate::{Config, Environment, File};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Full description of one pool
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub share_name: String,
    pub share_symbol: String,
    pub amplification: u64,

    /// Fraction of swap output withheld as fee
    pub swap_fee: Decimal,

    /// Fraction of fee revenue owed to the operator
    #[serde(default)]
    pub admin_fee: Decimal,

    pub assets: Vec<AssetConfig>,
}

/// One pooled asset
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct AssetConfig {
    pub symbol: String,
    pub decimals: u8,

    /// Value of one unit against the peg, for interest-bearing assets.
    /// Omitted means plain decimal alignment.
    #[serde(default)]
    pub exchange_rate: Option<Decimal>,
}

impl PoolConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Failed to parse pool configuration")
    }

    /// Load from a TOML file with `STABLESWAP_*` environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path).required(true))
            .add_source(Environment::with_prefix("STABLESWAP").try_parsing(true))
            .build()
            .with_context(|| format!("Failed to read pool configuration from {:?}", path))?;

        let config: Self = settings
            .try_deserialize()
            .context("Invalid pool configuration")?;

        info!(
            share_symbol = %config.share_symbol,
            assets = config.assets.len(),
            amplification = config.amplification,
            "Loaded pool configuration from {:?}",
            path
        );
        Ok(config)
    }

    /// Curve and fee settings in pool units
    pub fn pool_parameters(&self) -> Result<PoolParameters> {
        Ok(PoolParameters {
            share_name: self.share_name.clone(),
            share_symbol: self.share_symbol.clone(),
            amplification: u128::from(self.amplification),
            swap_fee: fee_units(self.swap_fee, "swap_fee")?,
            admin_fee: fee_units(self.admin_fee, "admin_fee")?,
        })
    }

    /// Asset list as a fixed-width array; the count must match `N`
    pub fn asset_specs<const N: usize>(&self) -> Result<[AssetSpec<String>; N]> {
        if self.assets.len() != N {
            bail!(
                "Pool configuration lists {} assets, pool width is {}",
                self.assets.len(),
                N
            );
        }
        let specs = self
            .assets
            .iter()
            .map(|asset| {
                let rate_multiplier = asset
                    .exchange_rate
                    .map(|rate| scaled_rate(asset, rate))
                    .transpose()?;
                Ok(AssetSpec {
                    asset: asset.symbol.clone(),
                    decimals: asset.decimals,
                    rate_multiplier,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        specs
            .try_into()
            .map_err(|_| anyhow!("Asset list does not fit a pool of width {}", N))
    }
}

/// Decimal-alignment rate scaled by `exchange_rate`
fn scaled_rate(asset: &AssetConfig, exchange_rate: Decimal) -> Result<u128> {
    if exchange_rate <= Decimal::ZERO {
        bail!(
            "{} exchange_rate must be positive, got {}",
            asset.symbol,
            exchange_rate
        );
    }
    let base = default_rate_for_decimals(asset.decimals)
        .with_context(|| format!("{} has unsupported decimals", asset.symbol))?;
    let mantissa = u128::try_from(exchange_rate.mantissa())
        .with_context(|| format!("{} exchange_rate out of range", asset.symbol))?;
    let scale = pow_small(10, exchange_rate.scale())?;
    let rate = mul_div_down(base, mantissa, scale)?;
    if rate == 0 {
        bail!("{} exchange_rate {} rounds to zero", asset.symbol, exchange_rate);
    }
    Ok(rate)
}

/// Convert a fee fraction to [`FEE_DENOMINATOR`] units, exactly
fn fee_units(fraction: Decimal, name: &str) -> Result<u128> {
    if fraction.is_sign_negative() {
        bail!("{} must not be negative, got {}", name, fraction);
    }
    let scaled = fraction
        .checked_mul(Decimal::from(FEE_DENOMINATOR as u64))
        .with_context(|| format!("{} {} is out of range", name, fraction))?;
    if !scaled.fract().is_zero() {
        bail!(
            "{} {} is finer than 1/{} resolution",
            name,
            fraction,
            FEE_DENOMINATOR
        );
    }
    let units = scaled
        .to_u128()
        .with_context(|| format!("{} {} is out of range", name, fraction))?;
    debug!(name, %fraction, units, "fee converted");
    Ok(units)
}

impl<C, S, const N: usize> StableSwapPool<C, S, N>
where
    C: AssetCustody,
    C::AssetId: From<String>,
    S: ShareToken<AccountId = C::AccountId>,
{
    /// Build an empty pool from its configuration
    pub fn from_config(
        config: &PoolConfig,
        owner: C::AccountId,
        custody: C,
        share_token: S,
    ) -> Result<Self> {
        let params = config.pool_parameters()?;
        let assets = config.asset_specs::<N>()?.map(|spec| AssetSpec {
            asset: C::AssetId::from(spec.asset),
            decimals: spec.decimals,
            rate_multiplier: spec.rate_multiplier,
        });
        StableSwapPool::new(assets, params, owner, custody, share_token)
            .with_context(|| format!("Failed to build pool {}", config.share_symbol))
    }
}
