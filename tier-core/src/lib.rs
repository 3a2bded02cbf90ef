//! Tier Core - Storage Lifecycle and Tiering Cost/Policy Engine
//!
//! Pure, synchronous domain logic for moving stored files between a hot
//! tier and a cold (archival) tier:
//! - **Lifecycle**: file states and the only legal transitions between them
//! - **Cost**: per-tier monthly costs, tax and totals; per-file savings
//! - **Suggestion**: whether an idle, large file should be hibernated
//! - **Restore**: restore speed/cost tiers
//! - **Policy**: candidate selection and pricing for batch hibernation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        tier-cli (tierctl)                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │   tier-storage: repository, backend, jobs, batch executor    │
//! ├─────────────────────────────────────────────────────────────┤
//! │   tier-core (this crate): state machine, cost, heuristics    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing in this crate performs I/O or mutates shared state; every
//! function is safe to call concurrently.

pub mod error;
pub mod types;
pub mod lifecycle;
pub mod cost;
pub mod suggestion;
pub mod restore;
pub mod policy;

pub use error::{TierError, TierResult};

pub use types::*;

pub use lifecycle::{Capability, FileStatus, LifecycleStateMachine, TRANSITIONS};

pub use cost::{
    default_tax_rate, validate_tax_rate, CostBreakdown, CostEngine, PotentialSavings, TaxedCost,
    TierCost, TierRecommendation,
};

pub use suggestion::{
    should_suggest, suggest, suggestion_message, DormancyLevel, HibernationThresholds,
    Suggestion, SuggestionMessage,
};

pub use restore::{select_restore_tier, RestoreTier, RestoreTierInfo};

pub use policy::{
    plan_hibernation, HibernationCandidate, HibernationFailure, HibernationPlan,
    HibernationPolicyConfig, HibernationResult, TransitionedFile,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
