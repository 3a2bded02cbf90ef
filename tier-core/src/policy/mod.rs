//! Batch auto-hibernation policy
//!
//! The pure half of a hibernation run: validate the policy, select
//! candidates in inventory order and price them. Applying the plan
//! against a repository and storage backend happens in `tier-storage`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cost::CostEngine;
use crate::error::{TierError, TierResult};
use crate::lifecycle::FileStatus;
use crate::suggestion::{should_suggest, HibernationThresholds, DEFAULT_DAYS_THRESHOLD, DEFAULT_MIN_SIZE_BYTES};
use crate::types::{FileRecord, StorageTier};

/// Default number of candidates processed concurrently
pub const DEFAULT_MAX_PARALLELISM: usize = 4;

/// Auto-hibernation policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HibernationPolicyConfig {
    /// Idle days before a file qualifies; must be positive
    pub days_threshold: i64,
    /// Size floor in bytes; must not be negative
    pub min_size_bytes: i64,
    /// Simulate only
    pub dry_run: bool,
    /// Upper bound on concurrent archive calls
    pub max_parallelism: usize,
    /// Content-type prefixes never hibernated (e.g. `text/`)
    pub excluded_content_prefixes: Vec<String>,
}

impl Default for HibernationPolicyConfig {
    fn default() -> Self {
        Self {
            days_threshold: i64::from(DEFAULT_DAYS_THRESHOLD),
            min_size_bytes: DEFAULT_MIN_SIZE_BYTES as i64,
            dry_run: true,
            max_parallelism: DEFAULT_MAX_PARALLELISM,
            excluded_content_prefixes: vec!["text/".to_string()],
        }
    }
}

impl HibernationPolicyConfig {
    /// Validate and convert to heuristic thresholds
    pub fn validate(&self) -> TierResult<HibernationThresholds> {
        if self.days_threshold <= 0 {
            return Err(TierError::configuration(format!(
                "days_threshold must be positive, got {}",
                self.days_threshold
            )));
        }
        let days = u32::try_from(self.days_threshold).map_err(|_| {
            TierError::configuration(format!("days_threshold too large: {}", self.days_threshold))
        })?;
        if self.min_size_bytes < 0 {
            return Err(TierError::configuration(format!(
                "min_size_bytes must not be negative, got {}",
                self.min_size_bytes
            )));
        }
        if self.max_parallelism == 0 {
            return Err(TierError::configuration("max_parallelism must be at least 1"));
        }
        Ok(HibernationThresholds::new(days, self.min_size_bytes as u64))
    }

    /// Whether the file's content type is excluded from hibernation
    pub fn is_excluded(&self, file: &FileRecord) -> bool {
        file.content_type_matches(&self.excluded_content_prefixes)
    }
}

/// A candidate selected by the policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HibernationCandidate {
    pub id: String,
    pub size_bytes: u64,
    /// Tier the file is billed at today
    pub from_tier: StorageTier,
    /// Monthly savings once in deep-archive
    pub savings: Decimal,
}

/// Candidates of a run, priced, in inventory order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HibernationPlan {
    pub thresholds: HibernationThresholds,
    pub candidates: Vec<HibernationCandidate>,
}

impl HibernationPlan {
    pub fn candidates_found(&self) -> usize {
        self.candidates.len()
    }

    /// Predicted savings over every candidate
    pub fn predicted_savings(&self) -> Decimal {
        self.candidates.iter().map(|c| c.savings).sum()
    }

    /// Result of a dry run: every candidate listed, nothing moved
    pub fn into_dry_run_result(self) -> HibernationResult {
        let mut result = HibernationResult::new(self.candidates.len(), true);
        result.total_monthly_savings = self.predicted_savings();
        result.transitioned_files = self
            .candidates
            .into_iter()
            .map(|c| TransitionedFile {
                id: c.id,
                size_bytes: c.size_bytes,
                savings: c.savings,
                status: FileStatus::Active,
            })
            .collect();
        result
    }
}

/// Select and price the candidates of a run.
///
/// Fails only when the policy itself is invalid.
pub fn plan_hibernation(
    inventory: &[FileRecord],
    config: &HibernationPolicyConfig,
    engine: &CostEngine,
    now: DateTime<Utc>,
) -> TierResult<HibernationPlan> {
    let thresholds = config.validate()?;

    let candidates = inventory
        .iter()
        .filter(|file| should_suggest(file, now, &thresholds))
        .filter(|file| !config.is_excluded(file))
        .map(|file| {
            let from_tier = file.storage_tier();
            HibernationCandidate {
                id: file.id.clone(),
                size_bytes: file.size_bytes,
                from_tier,
                savings: engine.estimate_savings(file, from_tier, StorageTier::DeepArchive),
            }
        })
        .collect();

    Ok(HibernationPlan {
        thresholds,
        candidates,
    })
}

/// A file moved (or, in a dry run, that would be moved)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionedFile {
    pub id: String,
    pub size_bytes: u64,
    pub savings: Decimal,
    /// State the file ended the run in
    pub status: FileStatus,
}

/// A candidate that could not be moved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HibernationFailure {
    pub id: String,
    pub reason: String,
}

/// Outcome of a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HibernationResult {
    pub candidates_found: usize,
    pub files_transitioned: usize,
    pub total_monthly_savings: Decimal,
    pub transitioned_files: Vec<TransitionedFile>,
    pub failures: Vec<HibernationFailure>,
    pub dry_run: bool,
}

impl HibernationResult {
    /// Empty result for a run over `candidates_found` candidates
    pub fn new(candidates_found: usize, dry_run: bool) -> Self {
        Self {
            candidates_found,
            files_transitioned: 0,
            total_monthly_savings: Decimal::ZERO,
            transitioned_files: Vec::new(),
            failures: Vec::new(),
            dry_run,
        }
    }

    /// Record a moved file and count its savings
    pub fn record_success(&mut self, file: TransitionedFile) {
        self.files_transitioned += 1;
        self.total_monthly_savings += file.savings;
        self.transitioned_files.push(file);
    }

    /// Record a per-file failure; the batch carries on
    pub fn record_failure(&mut self, id: impl Into<String>, error: &TierError) {
        self.failures.push(HibernationFailure {
            id: id.into(),
            reason: error.to_string(),
        });
    }

    /// Whether any candidate failed
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RateTable, BYTES_PER_GIB};
    use chrono::Duration;

    fn engine() -> CostEngine {
        // Savings equal size in GiB
        CostEngine::new(
            RateTable::usd()
                .with_rate(StorageTier::Standard, Decimal::ONE)
                .with_rate(StorageTier::DeepArchive, Decimal::ZERO),
        )
    }

    fn inventory(now: DateTime<Utc>) -> Vec<FileRecord> {
        vec![
            FileRecord::new("big-old", 50 * BYTES_PER_GIB, FileStatus::Active, now - Duration::days(120)),
            FileRecord::new("fresh", 80 * BYTES_PER_GIB, FileStatus::Active, now - Duration::days(2)),
            FileRecord::new("mid-old", 30 * BYTES_PER_GIB, FileStatus::Active, now - Duration::days(45)),
        ]
    }

    #[test]
    fn test_dry_run_plan() {
        let now = Utc::now();
        let plan = plan_hibernation(&inventory(now), &HibernationPolicyConfig::default(), &engine(), now)
            .unwrap();

        let result = plan.into_dry_run_result();
        assert_eq!(result.candidates_found, 2);
        assert_eq!(result.files_transitioned, 0);
        assert_eq!(result.total_monthly_savings, Decimal::from(80));
        assert!(result.failures.is_empty());
        let ids: Vec<_> = result.transitioned_files.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["big-old", "mid-old"]);
        assert_eq!(result.transitioned_files[0].savings, Decimal::from(50));
    }

    #[test]
    fn test_invalid_config() {
        let now = Utc::now();
        for config in [
            HibernationPolicyConfig {
                days_threshold: 0,
                ..Default::default()
            },
            HibernationPolicyConfig {
                days_threshold: -5,
                ..Default::default()
            },
            HibernationPolicyConfig {
                min_size_bytes: -1,
                ..Default::default()
            },
            HibernationPolicyConfig {
                max_parallelism: 0,
                ..Default::default()
            },
        ] {
            let err = plan_hibernation(&inventory(now), &config, &engine(), now).unwrap_err();
            assert!(matches!(err, TierError::ConfigurationError { .. }));
        }
    }

    #[test]
    fn test_zero_size_floor_allowed() {
        let config = HibernationPolicyConfig {
            min_size_bytes: 0,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap().min_size_bytes, 0);
    }

    #[test]
    fn test_excluded_content_types() {
        let now = Utc::now();
        let mut files = inventory(now);
        files[0] = files[0].clone().with_content_type("text/csv");
        let config = HibernationPolicyConfig {
            excluded_content_prefixes: vec!["text/".to_string()],
            ..Default::default()
        };
        let plan = plan_hibernation(&files, &config, &engine(), now).unwrap();
        assert_eq!(plan.candidates_found(), 1);
        assert_eq!(plan.candidates[0].id, "mid-old");
    }

    #[test]
    fn test_text_skipped_by_default() {
        let now = Utc::now();
        let mut files = inventory(now);
        files[2] = files[2].clone().with_content_type("text/plain");

        let defaults = HibernationPolicyConfig::default();
        assert_eq!(defaults.excluded_content_prefixes, vec!["text/".to_string()]);
        let plan = plan_hibernation(&files, &defaults, &engine(), now).unwrap();
        let ids: Vec<_> = plan.candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["big-old"]);

        // An explicit empty list opts back in
        let everything = HibernationPolicyConfig {
            excluded_content_prefixes: Vec::new(),
            ..Default::default()
        };
        let plan = plan_hibernation(&files, &everything, &engine(), now).unwrap();
        assert_eq!(plan.candidates_found(), 2);
    }

    #[test]
    fn test_record_outcomes() {
        let mut result = HibernationResult::new(2, false);
        result.record_success(TransitionedFile {
            id: "a".into(),
            size_bytes: 1,
            savings: Decimal::new(125, 2),
            status: FileStatus::Archiving,
        });
        result.record_failure(
            "b",
            &TierError::external("b", "backend unavailable"),
        );
        assert_eq!(result.files_transitioned, 1);
        assert_eq!(result.total_monthly_savings, Decimal::new(125, 2));
        assert!(result.has_failures());
        assert!(result.failures[0].reason.contains("backend unavailable"));
    }
}
