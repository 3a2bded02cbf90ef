//! Hibernation suggestion heuristic
//!
//! Pure decision: should a file be proposed for archival, based on how
//! long it has been idle and how large it is. Never mutates the file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lifecycle::FileStatus;
use crate::types::{FileRecord, SECONDS_PER_DAY};

/// Default idle threshold in days
pub const DEFAULT_DAYS_THRESHOLD: u32 = 30;

/// Default size floor in bytes (10 MiB)
pub const DEFAULT_MIN_SIZE_BYTES: u64 = 10_485_760;

/// Days after which an idle file counts as long dormant
pub const LONG_DORMANT_DAYS: i64 = 90;

/// Thresholds shared by the heuristic and the batch policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HibernationThresholds {
    pub days_threshold: u32,
    pub min_size_bytes: u64,
}

impl Default for HibernationThresholds {
    fn default() -> Self {
        Self {
            days_threshold: DEFAULT_DAYS_THRESHOLD,
            min_size_bytes: DEFAULT_MIN_SIZE_BYTES,
        }
    }
}

impl HibernationThresholds {
    pub fn new(days_threshold: u32, min_size_bytes: u64) -> Self {
        Self {
            days_threshold,
            min_size_bytes,
        }
    }
}

/// Whether `file` should be proposed for archival at `now`.
///
/// Both comparisons are strict: a file idle for exactly the threshold,
/// or exactly at the size floor, is not suggested.
pub fn should_suggest(file: &FileRecord, now: DateTime<Utc>, thresholds: &HibernationThresholds) -> bool {
    let idle_secs = file.idle_for(now).num_seconds();
    let threshold_secs = i64::from(thresholds.days_threshold) * SECONDS_PER_DAY;

    file.status == FileStatus::Active
        && idle_secs > threshold_secs
        && file.size_bytes > thresholds.min_size_bytes
}

/// How dormant a file is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DormancyLevel {
    /// Suggested and idle for more than 90 days
    LongDormant,
    /// Suggested
    Dormant,
    /// Not suggested
    Active,
}

impl DormancyLevel {
    /// Level for a heuristic verdict and the whole days idle.
    ///
    /// `Active` exactly when the file is not suggested.
    pub fn classify(suggested: bool, days: i64) -> Self {
        if !suggested {
            DormancyLevel::Active
        } else if days > LONG_DORMANT_DAYS {
            DormancyLevel::LongDormant
        } else {
            DormancyLevel::Dormant
        }
    }
}

/// Display message for a file's dormancy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionMessage {
    pub days_since_access: i64,
    pub level: DormancyLevel,
    pub text: String,
}

/// Build the dormancy message for a file under `thresholds`
pub fn suggestion_message(
    file: &FileRecord,
    now: DateTime<Utc>,
    thresholds: &HibernationThresholds,
) -> SuggestionMessage {
    let days = file.days_since_access(now);
    let level = DormancyLevel::classify(should_suggest(file, now, thresholds), days);
    let text = match level {
        DormancyLevel::LongDormant => {
            format!("Not accessed in {days} days. Hibernate it to cut storage costs.")
        }
        DormancyLevel::Dormant => {
            format!("Not accessed in {days} days. Consider hibernating it.")
        }
        DormancyLevel::Active => format!("Accessed {days} days ago. Keep it awake."),
    };

    SuggestionMessage {
        days_since_access: days,
        level,
        text,
    }
}

/// Heuristic decision plus its display message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub file_id: String,
    pub suggested: bool,
    pub message: SuggestionMessage,
}

/// Evaluate the heuristic and message together
pub fn suggest(file: &FileRecord, now: DateTime<Utc>, thresholds: &HibernationThresholds) -> Suggestion {
    let message = suggestion_message(file, now, thresholds);
    Suggestion {
        file_id: file.id.clone(),
        suggested: message.level != DormancyLevel::Active,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn active(size: u64, idle: Duration, now: DateTime<Utc>) -> FileRecord {
        FileRecord::new("f", size, FileStatus::Active, now - idle)
    }

    #[test]
    fn test_large_stale_file_suggested() {
        let now = Utc::now();
        let f = active(20_000_000, Duration::days(95), now);
        let s = suggest(&f, now, &HibernationThresholds::default());
        assert!(s.suggested);
        assert_eq!(s.message.days_since_access, 95);
        assert_eq!(s.message.level, DormancyLevel::LongDormant);
        assert!(s.message.text.contains("95"));
    }

    #[test]
    fn test_small_file_never_suggested() {
        let now = Utc::now();
        for days in [0, 31, 95, 10_000] {
            let f = active(5_000_000, Duration::days(days), now);
            assert!(!should_suggest(&f, now, &HibernationThresholds::default()));
        }
    }

    #[test]
    fn test_exact_boundaries_not_suggested() {
        let now = Utc::now();
        let t = HibernationThresholds::default();
        let at_age = active(20_000_000, Duration::days(30), now);
        assert!(!should_suggest(&at_age, now, &t));

        let just_past = active(20_000_000, Duration::days(30) + Duration::seconds(1), now);
        assert!(should_suggest(&just_past, now, &t));

        let at_size = active(DEFAULT_MIN_SIZE_BYTES, Duration::days(95), now);
        assert!(!should_suggest(&at_size, now, &t));
    }

    #[test]
    fn test_only_active_files() {
        let now = Utc::now();
        for status in FileStatus::ALL.iter().filter(|s| **s != FileStatus::Active) {
            let f = FileRecord::new("f", 20_000_000, *status, now - Duration::days(95));
            assert!(!should_suggest(&f, now, &HibernationThresholds::default()));
        }
    }

    #[test]
    fn test_message_levels() {
        let now = Utc::now();
        let t = HibernationThresholds::default();
        let level = |size, days| suggestion_message(&active(size, Duration::days(days), now), now, &t).level;

        assert_eq!(level(20_000_000, 90), DormancyLevel::Dormant);
        assert_eq!(level(20_000_000, 91), DormancyLevel::LongDormant);
        assert_eq!(level(20_000_000, 30), DormancyLevel::Active);
        // Old but below the size floor
        assert_eq!(level(1, 365), DormancyLevel::Active);
    }

    #[test]
    fn test_custom_thresholds() {
        let now = Utc::now();
        let f = active(2_000, Duration::days(8), now);
        assert!(should_suggest(&f, now, &HibernationThresholds::new(7, 1_000)));
        assert!(!should_suggest(&f, now, &HibernationThresholds::default()));
    }

    #[test]
    fn test_message_follows_custom_thresholds() {
        let now = Utc::now();
        let f = active(2_000, Duration::days(8), now);

        let s = suggest(&f, now, &HibernationThresholds::new(7, 1_000));
        assert!(s.suggested);
        assert_eq!(s.message.level, DormancyLevel::Dormant);
        assert_eq!(s.message.text, "Not accessed in 8 days. Consider hibernating it.");

        let relaxed = HibernationThresholds::new(120, 1_000);
        let old = active(2_000, Duration::days(100), now);
        let s = suggest(&old, now, &relaxed);
        assert!(!s.suggested);
        assert_eq!(s.message.level, DormancyLevel::Active);
    }

    proptest! {
        #[test]
        fn prop_monotonic_in_age(
            extra in 1u64..u32::MAX as u64,
            age in 0i64..(400 * SECONDS_PER_DAY),
            older_by in 0i64..(400 * SECONDS_PER_DAY),
            days in 0u32..365,
        ) {
            let now = Utc::now();
            let t = HibernationThresholds::new(days, DEFAULT_MIN_SIZE_BYTES);
            let size = DEFAULT_MIN_SIZE_BYTES + extra;
            let younger = active(size, Duration::seconds(age), now);
            let older = active(size, Duration::seconds(age + older_by), now);
            if should_suggest(&younger, now, &t) {
                prop_assert!(should_suggest(&older, now, &t));
            }
        }

        #[test]
        fn prop_level_agrees_with_verdict(
            size in 0u64..(1u64 << 30),
            age in 0i64..(400 * SECONDS_PER_DAY),
            days in 1u32..365,
            floor in 0u64..(1u64 << 30),
        ) {
            let now = Utc::now();
            let t = HibernationThresholds::new(days, floor);
            let s = suggest(&active(size, Duration::seconds(age), now), now, &t);
            prop_assert_eq!(s.suggested, should_suggest(&active(size, Duration::seconds(age), now), now, &t));
            prop_assert_eq!(s.suggested, s.message.level != DormancyLevel::Active);
        }

        #[test]
        fn prop_size_floor_never_suggested(
            age in 0i64..(10_000 * SECONDS_PER_DAY),
            floor in 0u64..(1u64 << 40),
        ) {
            let now = Utc::now();
            let t = HibernationThresholds::new(DEFAULT_DAYS_THRESHOLD, floor);
            let f = active(floor, Duration::seconds(age), now);
            prop_assert!(!should_suggest(&f, now, &t));
        }
    }
}
