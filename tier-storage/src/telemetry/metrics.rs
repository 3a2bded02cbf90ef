//! Lifecycle Metrics
//!
//! Lock-free counters and gauges rendered in the Prometheus text format.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Metric name prefix
pub const METRICS_PREFIX: &str = "tier";

/// Counter metric (only increases)
#[derive(Debug)]
pub struct Counter {
    name: String,
    help: String,
    value: AtomicU64,
}

impl Counter {
    /// Create a new counter
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            value: AtomicU64::new(0),
        }
    }

    /// Increment by 1
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment by n
    pub fn inc_by(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    /// Get current value
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, out: &mut String) {
        out.push_str(&format!("# HELP {} {}\n", self.name, self.help));
        out.push_str(&format!("# TYPE {} counter\n", self.name));
        out.push_str(&format!("{} {}\n", self.name, self.get()));
    }
}

/// Gauge metric (can increase or decrease)
#[derive(Debug)]
pub struct Gauge {
    name: String,
    help: String,
    value: AtomicI64,
}

impl Gauge {
    /// Create a new gauge
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            value: AtomicI64::new(0),
        }
    }

    /// Set value
    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }

    /// Increment by 1
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement by 1
    pub fn dec(&self) {
        self.value.fetch_sub(1, Ordering::Relaxed);
    }

    /// Get current value
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, out: &mut String) {
        out.push_str(&format!("# HELP {} {}\n", self.name, self.help));
        out.push_str(&format!("# TYPE {} gauge\n", self.name));
        out.push_str(&format!("{} {}\n", self.name, self.get()));
    }
}

/// Metrics for lifecycle transitions, jobs and hibernation runs
#[derive(Debug)]
pub struct LifecycleMetrics {
    pub transitions_applied: Counter,
    pub transitions_rejected: Counter,
    pub guard_conflicts: Counter,
    pub archive_jobs_started: Counter,
    pub restore_jobs_started: Counter,
    pub jobs_succeeded: Counter,
    pub jobs_failed: Counter,
    pub hibernation_runs: Counter,
    pub jobs_in_flight: Gauge,
}

impl Default for LifecycleMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleMetrics {
    pub fn new() -> Self {
        let name = |n: &str| format!("{METRICS_PREFIX}_{n}");
        Self {
            transitions_applied: Counter::new(
                &name("transitions_applied_total"),
                "Lifecycle transitions applied",
            ),
            transitions_rejected: Counter::new(
                &name("transitions_rejected_total"),
                "Lifecycle transitions rejected as invalid",
            ),
            guard_conflicts: Counter::new(
                &name("guard_conflicts_total"),
                "Transitions lost to a concurrent modification",
            ),
            archive_jobs_started: Counter::new(
                &name("archive_jobs_started_total"),
                "Archive jobs accepted by the backend",
            ),
            restore_jobs_started: Counter::new(
                &name("restore_jobs_started_total"),
                "Restore jobs accepted by the backend",
            ),
            jobs_succeeded: Counter::new(&name("jobs_succeeded_total"), "Jobs completed successfully"),
            jobs_failed: Counter::new(&name("jobs_failed_total"), "Jobs that failed or were refused"),
            hibernation_runs: Counter::new(&name("hibernation_runs_total"), "Auto-hibernation runs"),
            jobs_in_flight: Gauge::new(&name("jobs_in_flight"), "Archive/restore jobs being tracked"),
        }
    }

    /// Render in the Prometheus text exposition format
    pub fn render_prometheus(&self) -> String {
        let mut out = String::new();
        for counter in [
            &self.transitions_applied,
            &self.transitions_rejected,
            &self.guard_conflicts,
            &self.archive_jobs_started,
            &self.restore_jobs_started,
            &self.jobs_succeeded,
            &self.jobs_failed,
            &self.hibernation_runs,
        ] {
            counter.render(&mut out);
        }
        self.jobs_in_flight.render(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter() {
        let counter = Counter::new("test_counter", "Test counter");
        assert_eq!(counter.get(), 0);

        counter.inc();
        counter.inc_by(5);
        assert_eq!(counter.get(), 6);
    }

    #[test]
    fn test_gauge() {
        let gauge = Gauge::new("test_gauge", "Test gauge");
        gauge.set(100);
        gauge.inc();
        gauge.dec();
        gauge.dec();
        assert_eq!(gauge.get(), 99);
    }

    #[test]
    fn test_render_prometheus() {
        let metrics = LifecycleMetrics::new();
        metrics.transitions_applied.inc_by(3);
        metrics.jobs_in_flight.set(2);

        let output = metrics.render_prometheus();
        assert!(output.contains("# TYPE tier_transitions_applied_total counter"));
        assert!(output.contains("tier_transitions_applied_total 3\n"));
        assert!(output.contains("tier_jobs_in_flight 2\n"));
    }
}
