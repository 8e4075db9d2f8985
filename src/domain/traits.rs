// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The trainer only talks to these seams, so tests can swap in
// in-memory implementations.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

// ─── MetricsSink ──────────────────────────────────────────────────────────────
/// Receives named scalar summaries tagged with the global step.
///
/// Implementations:
///   - CsvMetricsSink → appends rows to <log_dir>/metrics.csv
pub trait MetricsSink {
    /// Record one scalar value (e.g. "loss") at `step`.
    fn scalar(&mut self, tag: &str, value: f64, step: u64) -> Result<()>;
}

impl<S: MetricsSink + ?Sized> MetricsSink for Box<S> {
    fn scalar(&mut self, tag: &str, value: f64, step: u64) -> Result<()> {
        (**self).scalar(tag, value, step)
    }
}
