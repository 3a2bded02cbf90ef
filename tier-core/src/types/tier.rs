//! Storage tiers and rate tables

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{TierError, TierResult};

/// Storage class with its own cost-per-GB rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageTier {
    /// Hot, instantly accessible
    Standard,
    /// Hot, cheaper storage but billed retrievals
    #[serde(alias = "ia", alias = "infrequent_access")]
    InfrequentAccess,
    /// Cold, hours to restore
    Glacier,
    /// Coldest and cheapest
    #[serde(alias = "deep_archive")]
    DeepArchive,
}

impl StorageTier {
    /// All tiers, hottest first
    pub const ALL: [StorageTier; 4] = [
        StorageTier::Standard,
        StorageTier::InfrequentAccess,
        StorageTier::Glacier,
        StorageTier::DeepArchive,
    ];

    /// Kebab-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageTier::Standard => "standard",
            StorageTier::InfrequentAccess => "infrequent-access",
            StorageTier::Glacier => "glacier",
            StorageTier::DeepArchive => "deep-archive",
        }
    }

    /// Whether data in this tier must be restored before reading
    pub fn is_archival(&self) -> bool {
        matches!(self, StorageTier::Glacier | StorageTier::DeepArchive)
    }

    /// Typical retrieval latency
    pub fn retrieval_hint(&self) -> &'static str {
        match self {
            StorageTier::Standard | StorageTier::InfrequentAccess => "Instant",
            StorageTier::Glacier => "3-5 hours",
            StorageTier::DeepArchive => "12+ hours",
        }
    }
}

impl std::fmt::Display for StorageTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StorageTier {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "standard" => Ok(StorageTier::Standard),
            "infrequent-access" | "ia" => Ok(StorageTier::InfrequentAccess),
            "glacier" => Ok(StorageTier::Glacier),
            "deep-archive" => Ok(StorageTier::DeepArchive),
            _ => Err(TierError::InvalidInput {
                reason: format!("unknown storage tier: {s}"),
            }),
        }
    }
}

/// Billing currency of a rate table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    /// US dollar
    #[default]
    Usd,
    /// Indian rupee
    Inr,
}

impl Currency {
    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Inr => "INR",
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "usd" => Ok(Currency::Usd),
            "inr" => Ok(Currency::Inr),
            _ => Err(TierError::InvalidInput {
                reason: format!("unsupported currency: {s}"),
            }),
        }
    }
}

/// Cost per GiB per month for every tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RateTable {
    /// Currency the rates are expressed in
    #[serde(default)]
    pub currency: Currency,
    pub standard: Decimal,
    pub infrequent_access: Decimal,
    pub glacier: Decimal,
    pub deep_archive: Decimal,
}

impl Default for RateTable {
    fn default() -> Self {
        Self::usd()
    }
}

impl RateTable {
    /// S3 list prices in USD
    pub fn usd() -> Self {
        Self {
            currency: Currency::Usd,
            standard: Decimal::new(23, 3),
            infrequent_access: Decimal::new(125, 4),
            glacier: Decimal::new(4, 3),
            deep_archive: Decimal::new(99, 5),
        }
    }

    /// S3 list prices in INR
    pub fn inr() -> Self {
        Self {
            currency: Currency::Inr,
            standard: Decimal::new(192, 2),
            infrequent_access: Decimal::new(104, 2),
            glacier: Decimal::new(33, 2),
            deep_archive: Decimal::new(8, 2),
        }
    }

    /// Preset for a currency
    pub fn for_currency(currency: Currency) -> Self {
        match currency {
            Currency::Usd => Self::usd(),
            Currency::Inr => Self::inr(),
        }
    }

    /// Rate for a tier
    pub fn rate(&self, tier: StorageTier) -> Decimal {
        match tier {
            StorageTier::Standard => self.standard,
            StorageTier::InfrequentAccess => self.infrequent_access,
            StorageTier::Glacier => self.glacier,
            StorageTier::DeepArchive => self.deep_archive,
        }
    }

    /// Override the rate for one tier
    pub fn with_rate(mut self, tier: StorageTier, rate: Decimal) -> Self {
        match tier {
            StorageTier::Standard => self.standard = rate,
            StorageTier::InfrequentAccess => self.infrequent_access = rate,
            StorageTier::Glacier => self.glacier = rate,
            StorageTier::DeepArchive => self.deep_archive = rate,
        }
        self
    }

    /// Reject negative rates
    pub fn validate(&self) -> TierResult<()> {
        for tier in StorageTier::ALL {
            if self.rate(tier).is_sign_negative() {
                return Err(TierError::configuration(format!(
                    "rate for {tier} must not be negative"
                )));
            }
        }
        Ok(())
    }
}
