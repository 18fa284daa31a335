//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section has defaults, so a missing file or a partial file still yields
//! a usable configuration. Decimal values are written as strings so they
//! reach the engine without passing through floating point.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::engine::fee::{FeeSchedule, FeeTier};
use crate::engine::reconcile::ReconcileConfig;
use crate::engine::SettlementEngine;
use crate::money::ratio_from_decimal;
use crate::types::OutcomeLabels;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub contract: ContractConfig,
    pub currency: CurrencyConfig,
    pub fees: FeesConfig,
    pub reconciliation: ReconciliationConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ContractConfig {
    pub outcome_a: String,
    pub outcome_b: String,
    pub refund_marker: String,
    /// Declared outcome used when the caller supplies none.
    pub default_outcome: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        let labels = OutcomeLabels::default();
        Self {
            default_outcome: labels.a.clone(),
            outcome_a: labels.a,
            outcome_b: labels.b,
            refund_marker: labels.refund,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CurrencyConfig {
    pub symbol: String,
    /// Number of decimal places in one whole unit (8 for BTC).
    pub decimals: u32,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            symbol: "BTC".to_string(),
            decimals: 8,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeesConfig {
    pub base_rate: Decimal,
    pub tiers: Vec<FeeTierConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeeTierConfig {
    pub effective_from: NaiveDate,
    pub rate: Decimal,
}

impl Default for FeesConfig {
    fn default() -> Self {
        Self {
            base_rate: Decimal::new(1, 2),
            tiers: vec![FeeTierConfig {
                effective_from: NaiveDate::from_ymd_opt(2016, 8, 1).unwrap_or_default(),
                rate: Decimal::new(2, 2),
            }],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReconciliationConfig {
    /// Accepted |computed − reported| in whole currency units.
    pub tolerance: Decimal,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            tolerance: Decimal::ONE,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load configuration from a TOML file, or fall back to defaults when
    /// the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parse and validate configuration text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot settle with.
    pub fn validate(&self) -> Result<()> {
        let c = &self.contract;
        if c.outcome_a == c.outcome_b {
            bail!("outcome_a and outcome_b are both {:?}", c.outcome_a);
        }
        if c.refund_marker == c.outcome_a || c.refund_marker == c.outcome_b {
            bail!("refund_marker {:?} collides with an outcome label", c.refund_marker);
        }
        if c.default_outcome != c.outcome_a && c.default_outcome != c.outcome_b {
            bail!(
                "default_outcome {:?} is neither {:?} nor {:?}",
                c.default_outcome,
                c.outcome_a,
                c.outcome_b
            );
        }

        check_rate(self.fees.base_rate).context("fees.base_rate")?;
        for (i, tier) in self.fees.tiers.iter().enumerate() {
            check_rate(tier.rate).with_context(|| format!("fees.tiers[{i}].rate"))?;
        }
        for pair in self.fees.tiers.windows(2) {
            if pair[0].effective_from >= pair[1].effective_from {
                bail!(
                    "fee tiers must be in increasing date order ({} then {})",
                    pair[0].effective_from,
                    pair[1].effective_from
                );
            }
        }

        if self.reconciliation.tolerance.is_sign_negative() {
            bail!("reconciliation.tolerance must not be negative");
        }
        Ok(())
    }

    pub fn labels(&self) -> OutcomeLabels {
        OutcomeLabels::new(
            self.contract.outcome_a.clone(),
            self.contract.outcome_b.clone(),
            self.contract.refund_marker.clone(),
        )
    }

    pub fn fee_schedule(&self) -> FeeSchedule {
        FeeSchedule {
            base_rate: ratio_from_decimal(self.fees.base_rate),
            tiers: self
                .fees
                .tiers
                .iter()
                .map(|t| FeeTier {
                    effective_from: t.effective_from,
                    rate: ratio_from_decimal(t.rate),
                })
                .collect(),
        }
    }

    /// Reconciliation settings in minor units.
    pub fn reconcile_config(&self) -> ReconcileConfig {
        ReconcileConfig::whole_units(
            ratio_from_decimal(self.reconciliation.tolerance),
            self.currency.decimals,
        )
    }

    /// Build a settlement engine from this configuration.
    pub fn engine(&self) -> SettlementEngine {
        SettlementEngine::new(self.labels(), self.fee_schedule(), self.reconcile_config())
    }
}

fn check_rate(rate: Decimal) -> Result<()> {
    if rate.is_sign_negative() || rate >= Decimal::ONE {
        bail!("fee rate {rate} must be in [0, 1)");
    }
    Ok(())
}
