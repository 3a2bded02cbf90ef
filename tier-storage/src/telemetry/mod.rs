//! Telemetry Module
//!
//! Structured logging and in-process lifecycle metrics.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
pub use metrics::{Counter, Gauge, LifecycleMetrics};
