//! Tiering Cost Engine
//!
//! Computes monthly storage costs per tier, tax and totals for an
//! inventory, and per-file savings when moving between tiers.
//!
//! Intermediate sums are kept at full precision; values are rounded to
//! the currency's minor unit only when they are placed in an output.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{TierError, TierResult};
use crate::types::{bytes_to_gb, Currency, FileRecord, RateTable, StorageTier, BYTES_PER_GIB};

/// Default minor-unit precision for money
pub const DEFAULT_PRECISION: u32 = 2;

/// Default tax rate (GST) in percent
pub fn default_tax_rate() -> Decimal {
    Decimal::from(18)
}

/// Reject negative tax rates
pub fn validate_tax_rate(tax_rate: Decimal) -> TierResult<()> {
    if tax_rate.is_sign_negative() && !tax_rate.is_zero() {
        return Err(TierError::configuration(format!(
            "tax rate must not be negative, got {tax_rate}"
        )));
    }
    Ok(())
}

/// Monthly cost of the files held in one tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCost {
    pub tier: StorageTier,
    /// Number of files billed at this tier
    pub files: usize,
    /// Total size in bytes
    pub size_bytes: u64,
    /// Total size in GiB, rounded for display
    pub size_gb: Decimal,
    /// Rate applied
    pub rate_per_gb: Decimal,
    /// Monthly cost, rounded to the minor unit
    pub monthly_cost: Decimal,
    /// Effective cost per GiB; zero for an empty tier
    pub cost_per_gb: Decimal,
}

/// Costs of an inventory, broken down by tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub currency: Currency,
    /// One entry per tier, hottest first
    pub tiers: Vec<TierCost>,
    /// Sum of the tier entries
    pub subtotal: Decimal,
    /// Tax rate in percent
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

impl CostBreakdown {
    /// Entry for a tier
    pub fn tier(&self, tier: StorageTier) -> Option<&TierCost> {
        self.tiers.iter().find(|t| t.tier == tier)
    }

    /// Monthly cost of a tier (zero if absent)
    pub fn tier_cost(&self, tier: StorageTier) -> Decimal {
        self.tier(tier).map(|t| t.monthly_cost).unwrap_or_default()
    }

    /// Total number of files across all tiers
    pub fn total_files(&self) -> usize {
        self.tiers.iter().map(|t| t.files).sum()
    }
}

/// Base cost, tax and total for a single file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxedCost {
    pub base: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Savings available by sending all standard-tier files to deep-archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotentialSavings {
    pub eligible_files: usize,
    pub size_gb: Decimal,
    pub current_cost: Decimal,
    pub archived_cost: Decimal,
    pub monthly_savings: Decimal,
}

/// Placement hint for a new upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRecommendation {
    pub tier: StorageTier,
    pub reason: String,
    /// Monthly savings against keeping the file in standard
    pub monthly_savings: Decimal,
    pub retrieval_time: String,
}

/// Cost engine over a read-only rate table
#[derive(Debug, Clone)]
pub struct CostEngine {
    rates: RateTable,
    precision: u32,
}

impl Default for CostEngine {
    fn default() -> Self {
        Self::new(RateTable::default())
    }
}

impl CostEngine {
    /// Create a new engine with the default precision
    pub fn new(rates: RateTable) -> Self {
        Self {
            rates,
            precision: DEFAULT_PRECISION,
        }
    }

    /// Override minor-unit precision
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    /// Rate table in use
    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Compute the cost breakdown of an inventory
    pub fn compute_cost_breakdown(
        &self,
        inventory: &[FileRecord],
        tax_rate: Decimal,
    ) -> TierResult<CostBreakdown> {
        validate_tax_rate(tax_rate)?;

        let mut tiers: Vec<TierCost> = StorageTier::ALL
            .iter()
            .map(|tier| TierCost {
                tier: *tier,
                files: 0,
                size_bytes: 0,
                size_gb: Decimal::ZERO,
                rate_per_gb: self.rates.rate(*tier),
                monthly_cost: Decimal::ZERO,
                cost_per_gb: Decimal::ZERO,
            })
            .collect();

        for file in inventory {
            let tier = file.storage_tier();
            if let Some(entry) = tiers.iter_mut().find(|t| t.tier == tier) {
                entry.files += 1;
                entry.size_bytes = entry
                    .size_bytes
                    .checked_add(file.size_bytes)
                    .ok_or_else(|| size_overflow(tier))?;
            }
        }

        let mut subtotal = Decimal::ZERO;
        for entry in &mut tiers {
            let size_gb = bytes_to_gb(entry.size_bytes);
            let cost = size_gb * entry.rate_per_gb;
            entry.size_gb = size_gb.round_dp(4);
            entry.monthly_cost = self.round(cost);
            entry.cost_per_gb = if size_gb.is_zero() {
                Decimal::ZERO
            } else {
                self.round(cost / size_gb)
            };
            subtotal += entry.monthly_cost;
        }

        let tax_amount = self.round(subtotal * tax_rate / Decimal::ONE_HUNDRED);

        Ok(CostBreakdown {
            currency: self.rates.currency,
            tiers,
            subtotal,
            tax_rate,
            tax_amount,
            total: subtotal + tax_amount,
        })
    }

    /// Monthly savings of moving `file` from one tier to another.
    ///
    /// Negative when the target tier is more expensive.
    pub fn estimate_savings(&self, file: &FileRecord, from: StorageTier, to: StorageTier) -> Decimal {
        self.round(self.raw_savings(file.size_bytes, from, to))
    }

    /// Unrounded savings for a size, for callers that aggregate
    pub fn raw_savings(&self, size_bytes: u64, from: StorageTier, to: StorageTier) -> Decimal {
        bytes_to_gb(size_bytes) * (self.rates.rate(from) - self.rates.rate(to))
    }

    /// Monthly cost of a single file with tax
    pub fn cost_with_tax(
        &self,
        size_bytes: u64,
        tier: StorageTier,
        tax_rate: Decimal,
    ) -> TierResult<TaxedCost> {
        validate_tax_rate(tax_rate)?;
        let base = self.round(bytes_to_gb(size_bytes) * self.rates.rate(tier));
        let tax = self.round(base * tax_rate / Decimal::ONE_HUNDRED);
        Ok(TaxedCost {
            base,
            tax,
            total: base + tax,
        })
    }

    /// Savings if every standard-tier file were archived
    pub fn potential_savings(&self, inventory: &[FileRecord]) -> TierResult<PotentialSavings> {
        let eligible: Vec<&FileRecord> = inventory
            .iter()
            .filter(|f| f.storage_tier() == StorageTier::Standard)
            .collect();
        let size_bytes = eligible
            .iter()
            .try_fold(0u64, |total, f| total.checked_add(f.size_bytes))
            .ok_or_else(|| size_overflow(StorageTier::Standard))?;
        let size_gb = bytes_to_gb(size_bytes);
        let current = size_gb * self.rates.rate(StorageTier::Standard);
        let archived = size_gb * self.rates.rate(StorageTier::DeepArchive);

        Ok(PotentialSavings {
            eligible_files: eligible.len(),
            size_gb: size_gb.round_dp(4),
            current_cost: self.round(current),
            archived_cost: self.round(archived),
            monthly_savings: self.round(current - archived),
        })
    }

    /// Suggest a tier for a file about to be stored
    pub fn recommend_tier(&self, size_bytes: u64, content_type: Option<&str>) -> TierRecommendation {
        let size_gb = bytes_to_gb(size_bytes);
        let media = content_type
            .map(|ct| ct.starts_with("video/") || ct.starts_with("audio/"))
            .unwrap_or(false);
        let tenth_gib = Decimal::from(BYTES_PER_GIB / 10) / Decimal::from(BYTES_PER_GIB);

        let (tier, reason) = if size_gb > Decimal::ONE {
            (StorageTier::DeepArchive, "Large file, cheapest long-term storage")
        } else if media && size_gb > tenth_gib {
            (StorageTier::Glacier, "Media file, cheaper storage with moderate retrieval time")
        } else {
            (StorageTier::Standard, "Small or frequently accessed file, keep instantly available")
        };

        TierRecommendation {
            tier,
            reason: reason.to_string(),
            monthly_savings: self.round(self.raw_savings(size_bytes, StorageTier::Standard, tier)),
            retrieval_time: tier.retrieval_hint().to_string(),
        }
    }

    /// Round to the minor unit
    pub fn round(&self, value: Decimal) -> Decimal {
        value.round_dp(self.precision)
    }
}

fn size_overflow(tier: StorageTier) -> TierError {
    TierError::InvalidInput {
        reason: format!("total size of {tier} files overflows 64 bits"),
    }
}
