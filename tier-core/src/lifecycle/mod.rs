//! Lifecycle State Machine
//!
//! Defines the states a stored file moves through and the only legal
//! transitions between them.
//!
//! # State machine
//!
//! ```text
//! pending ──→ uploading ──→ active ──→ archiving ──→ archived ──→ restoring ──→ restored
//!                 │                      ↑  │                        │            │
//!                 │                      │  └──────→ failed ←────────┘            │
//!                 └────────────────→ failed          │                            │
//!                                        └───────────┼──── re-hibernation ────────┘
//!                                                    ↓
//!                                      retry re-enters the operation's source state
//! ```
//!
//! Completion of `archiving`/`restoring` is reported by the storage backend
//! and applied as its own guarded transition; nothing here waits for it.

use serde::{Deserialize, Serialize};

use crate::error::{TierError, TierResult};
use crate::types::FileRecord;

/// File lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Registered, upload not started
    #[default]
    Pending,
    /// Upload in progress
    Uploading,
    /// Resident in the hot tier ("awake")
    Active,
    /// Archive job accepted by the backend
    Archiving,
    /// Resident in the cold tier ("hibernating")
    Archived,
    /// Restore job accepted by the backend
    Restoring,
    /// Back in the hot tier after a restore
    Restored,
    /// The last external operation failed
    Failed,
}

impl FileStatus {
    /// All states, in lifecycle order
    pub const ALL: [FileStatus; 8] = [
        FileStatus::Pending,
        FileStatus::Uploading,
        FileStatus::Active,
        FileStatus::Archiving,
        FileStatus::Archived,
        FileStatus::Restoring,
        FileStatus::Restored,
        FileStatus::Failed,
    ];

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Pending => "pending",
            FileStatus::Uploading => "uploading",
            FileStatus::Active => "active",
            FileStatus::Archiving => "archiving",
            FileStatus::Archived => "archived",
            FileStatus::Restoring => "restoring",
            FileStatus::Restored => "restored",
            FileStatus::Failed => "failed",
        }
    }

    /// Capability class of this state
    pub fn capability(&self) -> Capability {
        match self {
            FileStatus::Active | FileStatus::Restored => Capability::Awake,
            FileStatus::Archived => Capability::Hibernating,
            FileStatus::Uploading | FileStatus::Archiving | FileStatus::Restoring => {
                Capability::InFlight
            }
            FileStatus::Pending | FileStatus::Failed => Capability::Unavailable,
        }
    }

    /// Whether the file can be downloaded directly
    pub fn is_downloadable(&self) -> bool {
        self.capability() == Capability::Awake
    }

    /// Whether an external operation is running for the file
    pub fn is_in_flight(&self) -> bool {
        self.capability() == Capability::InFlight
    }

    /// Terminal for the operation that failed; only a retry leaves it
    pub fn is_terminal(&self) -> bool {
        matches!(self, FileStatus::Failed)
    }

    /// Legal targets from this state, excluding retries out of `Failed`
    pub fn valid_transitions(&self) -> Vec<FileStatus> {
        TRANSITIONS
            .iter()
            .filter(|(from, _)| from == self)
            .map(|(_, to)| *to)
            .collect()
    }

    /// Whether `self -> target` is an edge of the lifecycle graph
    pub fn can_transition_to(&self, target: FileStatus) -> bool {
        TRANSITIONS.contains(&(*self, target))
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability class derived from a lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Hot tier, downloadable
    Awake,
    /// Cold tier, must be restored first
    Hibernating,
    /// Upload, archive or restore running
    InFlight,
    /// Not yet uploaded, or failed
    Unavailable,
}

/// The lifecycle graph. No other edges are permitted.
pub const TRANSITIONS: &[(FileStatus, FileStatus)] = &[
    (FileStatus::Pending, FileStatus::Uploading),
    (FileStatus::Uploading, FileStatus::Active),
    (FileStatus::Uploading, FileStatus::Failed),
    (FileStatus::Active, FileStatus::Archiving),
    (FileStatus::Archiving, FileStatus::Archived),
    (FileStatus::Archiving, FileStatus::Failed),
    (FileStatus::Archived, FileStatus::Restoring),
    (FileStatus::Restoring, FileStatus::Restored),
    (FileStatus::Restoring, FileStatus::Failed),
    (FileStatus::Restored, FileStatus::Archiving),
];

/// Validates and applies lifecycle transitions
pub struct LifecycleStateMachine;

impl LifecycleStateMachine {
    /// Check that `from -> to` is an edge of the graph
    pub fn validate(from: FileStatus, to: FileStatus) -> TierResult<()> {
        if from.can_transition_to(to) {
            Ok(())
        } else {
            Err(TierError::InvalidTransition { from, to })
        }
    }

    /// Check a retry out of `Failed` into `target`.
    ///
    /// The only legal target is the source state of the operation that
    /// failed, recorded on the file as its origin.
    pub fn validate_retry(
        status: FileStatus,
        origin: Option<FileStatus>,
        target: FileStatus,
    ) -> TierResult<()> {
        match (status, origin) {
            (FileStatus::Failed, Some(origin)) if origin == target => Ok(()),
            _ => Err(TierError::InvalidTransition {
                from: status,
                to: target,
            }),
        }
    }

    /// Source state a failed file would re-enter on retry
    pub fn retry_target(file: &FileRecord) -> TierResult<FileStatus> {
        match (file.status, file.origin) {
            (FileStatus::Failed, Some(origin)) => Ok(origin),
            (status, _) => Err(TierError::InvalidInput {
                reason: format!("file {} is {} and has nothing to retry", file.id, status),
            }),
        }
    }

    /// Whether a file in this state may still be cancelled
    pub fn can_cancel(status: FileStatus) -> bool {
        status == FileStatus::Pending
    }

    /// Attempt `expected -> target` on an owned record.
    ///
    /// The edge is checked first, so an illegal request fails with
    /// `InvalidTransition` whatever the stored state is. The optimistic
    /// guard then requires the stored state to still equal `expected`.
    pub fn attempt_transition(
        file: &mut FileRecord,
        expected: FileStatus,
        target: FileStatus,
    ) -> TierResult<FileStatus> {
        if expected == FileStatus::Failed {
            Self::validate_retry(expected, file.origin, target)?;
        } else {
            Self::validate(expected, target)?;
        }

        if file.status != expected {
            return Err(TierError::ConcurrentModification {
                file_id: file.id.clone(),
                expected,
                actual: file.status,
            });
        }

        file.apply_status(target);
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn file(status: FileStatus) -> FileRecord {
        FileRecord::new("file-1", 1024, status, Utc::now())
    }

    #[test]
    fn test_happy_path() {
        let mut f = file(FileStatus::Pending);
        for (from, to) in [
            (FileStatus::Pending, FileStatus::Uploading),
            (FileStatus::Uploading, FileStatus::Active),
            (FileStatus::Active, FileStatus::Archiving),
            (FileStatus::Archiving, FileStatus::Archived),
            (FileStatus::Archived, FileStatus::Restoring),
            (FileStatus::Restoring, FileStatus::Restored),
            (FileStatus::Restored, FileStatus::Archiving),
            (FileStatus::Archiving, FileStatus::Archived),
        ] {
            assert_eq!(
                LifecycleStateMachine::attempt_transition(&mut f, from, to).unwrap(),
                to
            );
        }
        assert_eq!(f.status, FileStatus::Archived);
    }

    #[test]
    fn test_archived_to_active_rejected() {
        let mut f = file(FileStatus::Archived);
        let err =
            LifecycleStateMachine::attempt_transition(&mut f, FileStatus::Archived, FileStatus::Active)
                .unwrap_err();
        assert_eq!(
            err,
            TierError::InvalidTransition {
                from: FileStatus::Archived,
                to: FileStatus::Active
            }
        );
        assert_eq!(f.status, FileStatus::Archived);
    }

    #[test]
    fn test_active_to_restored_rejected() {
        assert!(LifecycleStateMachine::validate(FileStatus::Active, FileStatus::Restored).is_err());
        assert!(LifecycleStateMachine::validate(FileStatus::Active, FileStatus::Restoring).is_err());
        assert!(LifecycleStateMachine::validate(FileStatus::Archived, FileStatus::Archiving).is_err());
    }

    #[test]
    fn test_guard_mismatch() {
        let mut f = file(FileStatus::Archiving);
        let err =
            LifecycleStateMachine::attempt_transition(&mut f, FileStatus::Active, FileStatus::Archiving)
                .unwrap_err();
        assert!(matches!(err, TierError::ConcurrentModification { .. }));
        assert_eq!(f.status, FileStatus::Archiving);
    }

    #[test]
    fn test_invalid_edge_wins_over_guard() {
        // Stored state differs from expected, but the edge itself is illegal
        let mut f = file(FileStatus::Active);
        let err =
            LifecycleStateMachine::attempt_transition(&mut f, FileStatus::Archived, FileStatus::Active)
                .unwrap_err();
        assert!(matches!(err, TierError::InvalidTransition { .. }));
    }

    #[test]
    fn test_failure_edges() {
        for from in [FileStatus::Uploading, FileStatus::Archiving, FileStatus::Restoring] {
            assert!(from.can_transition_to(FileStatus::Failed));
        }
        for from in [FileStatus::Pending, FileStatus::Active, FileStatus::Archived, FileStatus::Restored] {
            assert!(!from.can_transition_to(FileStatus::Failed));
        }
        assert!(FileStatus::Failed.valid_transitions().is_empty());
    }

    #[test]
    fn test_retry_reenters_origin() {
        let mut f = file(FileStatus::Active);
        LifecycleStateMachine::attempt_transition(&mut f, FileStatus::Active, FileStatus::Archiving).unwrap();
        LifecycleStateMachine::attempt_transition(&mut f, FileStatus::Archiving, FileStatus::Failed).unwrap();
        assert_eq!(f.origin, Some(FileStatus::Active));
        assert_eq!(LifecycleStateMachine::retry_target(&f).unwrap(), FileStatus::Active);

        // Retrying into anything but the origin is rejected
        let err =
            LifecycleStateMachine::attempt_transition(&mut f, FileStatus::Failed, FileStatus::Archived)
                .unwrap_err();
        assert!(matches!(err, TierError::InvalidTransition { .. }));

        LifecycleStateMachine::attempt_transition(&mut f, FileStatus::Failed, FileStatus::Active).unwrap();
        assert_eq!(f.status, FileStatus::Active);
        assert_eq!(f.origin, None);
    }

    #[test]
    fn test_restore_failure_origin_is_archived() {
        let mut f = file(FileStatus::Archived);
        LifecycleStateMachine::attempt_transition(&mut f, FileStatus::Archived, FileStatus::Restoring).unwrap();
        LifecycleStateMachine::attempt_transition(&mut f, FileStatus::Restoring, FileStatus::Failed).unwrap();
        assert_eq!(LifecycleStateMachine::retry_target(&f).unwrap(), FileStatus::Archived);
    }

    #[test]
    fn test_capabilities() {
        assert!(FileStatus::Active.is_downloadable());
        assert!(FileStatus::Restored.is_downloadable());
        assert!(!FileStatus::Archived.is_downloadable());
        assert_eq!(FileStatus::Archived.capability(), Capability::Hibernating);
        assert!(FileStatus::Restoring.is_in_flight());
        assert!(FileStatus::Failed.is_terminal());
    }

    #[test]
    fn test_cancel_only_pending() {
        assert!(LifecycleStateMachine::can_cancel(FileStatus::Pending));
        for status in FileStatus::ALL.iter().filter(|s| **s != FileStatus::Pending) {
            assert!(!LifecycleStateMachine::can_cancel(*status));
        }
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&FileStatus::Archiving).unwrap();
        assert_eq!(json, "\"archiving\"");
    }
}
