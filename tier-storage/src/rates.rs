//! Rate and tax configuration source

use rust_decimal::Decimal;
use tier_core::{default_tax_rate, validate_tax_rate, CostEngine, Currency, RateTable};

use crate::error::StorageResult;

/// Read-only source of tier rates and the tax rate
pub trait RateSource: Send + Sync {
    /// Cost per GiB per month for every tier
    fn tier_rates(&self) -> RateTable;

    /// Tax rate in percent
    fn tax_rate(&self) -> Decimal;
}

/// Fixed rates, typically loaded from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRateSource {
    rates: RateTable,
    tax_rate: Decimal,
}

impl Default for StaticRateSource {
    fn default() -> Self {
        Self::for_currency(Currency::Usd)
    }
}

impl StaticRateSource {
    /// Validated source
    pub fn new(rates: RateTable, tax_rate: Decimal) -> StorageResult<Self> {
        rates.validate()?;
        validate_tax_rate(tax_rate)?;
        Ok(Self { rates, tax_rate })
    }

    /// Built-in preset with the default tax rate
    pub fn for_currency(currency: Currency) -> Self {
        Self {
            rates: RateTable::for_currency(currency),
            tax_rate: default_tax_rate(),
        }
    }

    /// Cost engine over these rates
    pub fn cost_engine(&self, precision: u32) -> CostEngine {
        CostEngine::new(self.rates.clone()).with_precision(precision)
    }
}

impl RateSource for StaticRateSource {
    fn tier_rates(&self) -> RateTable {
        self.rates.clone()
    }

    fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }
}
