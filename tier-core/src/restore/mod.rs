//! Restore Tier Selector
//!
//! Resolves a user's restore speed choice to its time and cost
//! characteristics. Selecting a tier starts nothing; the caller hands the
//! tier to the storage backend.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{TierError, TierResult};
use crate::types::bytes_to_gb;

/// Restore speed/cost variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RestoreTier {
    /// Minutes, most expensive
    Expedited,
    /// Hours, default
    #[default]
    Standard,
    /// Half a day, cheapest
    Bulk,
}

impl RestoreTier {
    /// All variants, fastest first
    pub const ALL: [RestoreTier; 3] = [RestoreTier::Expedited, RestoreTier::Standard, RestoreTier::Bulk];

    /// Lowercase key
    pub fn key(&self) -> &'static str {
        match self {
            RestoreTier::Expedited => "expedited",
            RestoreTier::Standard => "standard",
            RestoreTier::Bulk => "bulk",
        }
    }

    /// Fixed descriptor for this tier
    pub fn info(&self) -> RestoreTierInfo {
        match self {
            RestoreTier::Expedited => RestoreTierInfo {
                tier: *self,
                min_minutes: 1,
                max_minutes: 5,
                cost_multiplier: Decimal::new(300, 2),
                description: "Fastest restore option",
            },
            RestoreTier::Standard => RestoreTierInfo {
                tier: *self,
                min_minutes: 3 * 60,
                max_minutes: 5 * 60,
                cost_multiplier: Decimal::ONE,
                description: "Default restore option",
            },
            RestoreTier::Bulk => RestoreTierInfo {
                tier: *self,
                min_minutes: 5 * 60,
                max_minutes: 12 * 60,
                cost_multiplier: Decimal::new(25, 2),
                description: "Cheapest restore option",
            },
        }
    }
}

impl std::fmt::Display for RestoreTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for RestoreTier {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RestoreTier::ALL
            .into_iter()
            .find(|tier| tier.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| TierError::UnknownRestoreTier { key: s.to_string() })
    }
}

/// Completion window and relative cost of a restore tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreTierInfo {
    /// The tier described
    pub tier: RestoreTier,
    /// Fastest expected completion
    pub min_minutes: u32,
    /// Slowest expected completion
    pub max_minutes: u32,
    /// Retrieval cost relative to the standard tier
    pub cost_multiplier: Decimal,
    /// Human readable summary
    pub description: &'static str,
}

impl RestoreTierInfo {
    /// Lower bound of the window in hours
    pub fn min_hours(&self) -> Decimal {
        Decimal::from(self.min_minutes) / Decimal::from(60)
    }

    /// Upper bound of the window in hours
    pub fn max_hours(&self) -> Decimal {
        Decimal::from(self.max_minutes) / Decimal::from(60)
    }

    /// Window as display text ("3-5 hours", "1-5 minutes")
    pub fn window_label(&self) -> String {
        if self.max_minutes < 60 {
            format!("{}-{} minutes", self.min_minutes, self.max_minutes)
        } else {
            format!("{}-{} hours", self.min_minutes / 60, self.max_minutes / 60)
        }
    }

    /// Retrieval cost for a file given the per-GiB base retrieval rate
    pub fn estimate_cost(&self, size_bytes: u64, base_rate_per_gb: Decimal) -> Decimal {
        bytes_to_gb(size_bytes) * base_rate_per_gb * self.cost_multiplier
    }
}

/// Resolve a restore tier key (case-insensitive)
pub fn select_restore_tier(key: &str) -> TierResult<RestoreTierInfo> {
    let tier: RestoreTier = key.parse()?;
    Ok(tier.info())
}
