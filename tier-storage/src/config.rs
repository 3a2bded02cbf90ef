//! Engine configuration
//!
//! Sources, lowest to highest precedence: built-in defaults, a JSON file,
//! then `TIER_*` environment variables. Command-line flags are applied
//! on top by the caller.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use tier_core::{
    default_tax_rate, validate_tax_rate, CostEngine, Currency, HibernationPolicyConfig, RateTable,
    StorageTier,
};

use crate::error::{StorageError, StorageResult};
use crate::rates::StaticRateSource;
use crate::telemetry::LogConfig;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TIER_";

/// Pricing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Built-in rate preset
    pub currency: Currency,
    /// Per-tier rates replacing the preset's
    pub rate_overrides: BTreeMap<StorageTier, Decimal>,
    /// Tax rate in percent
    pub tax_rate: Decimal,
    /// Decimal places money is rounded to
    pub precision: u32,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            currency: Currency::Usd,
            rate_overrides: BTreeMap::new(),
            tax_rate: default_tax_rate(),
            precision: tier_core::cost::DEFAULT_PRECISION,
        }
    }
}

impl PricingConfig {
    /// Preset for the currency with overrides applied
    pub fn rate_table(&self) -> RateTable {
        self.rate_overrides
            .iter()
            .fold(RateTable::for_currency(self.currency), |table, (tier, rate)| {
                table.with_rate(*tier, *rate)
            })
    }
}

/// Job reconciliation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Jobs polled per reconcile pass
    pub max_polls_per_pass: usize,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            max_polls_per_pass: 100,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub pricing: PricingConfig,
    pub hibernation: HibernationPolicyConfig,
    pub jobs: JobConfig,
    pub logging: LogConfig,
}

impl EngineConfig {
    /// Defaults overlaid with a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> StorageResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Defaults overlaid with the environment
    pub fn from_env() -> StorageResult<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Defaults, then the optional file, then the environment
    pub fn load(path: Option<&Path>) -> StorageResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Overlay `TIER_*` environment variables
    pub fn apply_env(&mut self) -> StorageResult<()> {
        self.apply_vars(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    /// Overlay variables from a lookup keyed by the unprefixed name
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> StorageResult<()> {
        if let Some(v) = lookup("CURRENCY") {
            self.pricing.currency = Currency::from_str(&v)?;
        }
        if let Some(v) = lookup("TAX_RATE") {
            self.pricing.tax_rate = parse_var("TAX_RATE", &v)?;
        }
        if let Some(v) = lookup("DAYS_THRESHOLD") {
            self.hibernation.days_threshold = parse_var("DAYS_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("MIN_SIZE_BYTES") {
            self.hibernation.min_size_bytes = parse_var("MIN_SIZE_BYTES", &v)?;
        }
        if let Some(v) = lookup("DRY_RUN") {
            self.hibernation.dry_run = parse_bool("DRY_RUN", &v)?;
        }
        if let Some(v) = lookup("MAX_PARALLELISM") {
            self.hibernation.max_parallelism = parse_var("MAX_PARALLELISM", &v)?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.logging.level = v.parse()?;
        }
        if let Some(v) = lookup("LOG_FORMAT") {
            self.logging.format = v.parse()?;
        }
        Ok(())
    }

    /// Reject values no engine component accepts
    pub fn validate(&self) -> StorageResult<()> {
        validate_tax_rate(self.pricing.tax_rate)?;
        self.pricing.rate_table().validate()?;
        self.hibernation.validate()?;
        if self.jobs.max_polls_per_pass == 0 {
            return Err(StorageError::Configuration(
                "jobs.max_polls_per_pass must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Rate source for this configuration
    pub fn rate_source(&self) -> StorageResult<StaticRateSource> {
        StaticRateSource::new(self.pricing.rate_table(), self.pricing.tax_rate)
    }

    /// Cost engine for this configuration
    pub fn cost_engine(&self) -> CostEngine {
        CostEngine::new(self.pricing.rate_table()).with_precision(self.pricing.precision)
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> StorageResult<T> {
    value.trim().parse().map_err(|_| {
        StorageError::Configuration(format!("{ENV_PREFIX}{name}: invalid value {value:?}"))
    })
}

fn parse_bool(name: &str, value: &str) -> StorageResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(StorageError::Configuration(format!(
            "{ENV_PREFIX}{name}: invalid boolean {value:?}"
        ))),
    }
}
