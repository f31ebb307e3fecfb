//! Global atomic counters for grading runs.
//!
//! Counters are bumped at the call site; [`Metrics::flush`] emits the
//! current values as one `tracing::info!` event at the end of a run.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    criteria_evaluated: AtomicU64,
    evidence_persisted: AtomicU64,
    evidence_omitted: AtomicU64,
    references_dropped: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            criteria_evaluated: AtomicU64::new(0),
            evidence_persisted: AtomicU64::new(0),
            evidence_omitted: AtomicU64::new(0),
            references_dropped: AtomicU64::new(0),
        }
    }

    pub fn inc_criteria_evaluated(&self) {
        self.criteria_evaluated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_evidence_persisted(&self) {
        self.evidence_persisted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_evidence_omitted(&self) {
        self.evidence_omitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_references_dropped(&self, n: u64) {
        self.references_dropped.fetch_add(n, Ordering::Relaxed);
    }

    /// Emit all counters as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            criteria_evaluated = self.criteria_evaluated(),
            evidence_persisted = self.evidence_persisted(),
            evidence_omitted = self.evidence_omitted(),
            references_dropped = self.references_dropped(),
        );
    }

    pub fn criteria_evaluated(&self) -> u64 {
        self.criteria_evaluated.load(Ordering::Relaxed)
    }

    pub fn evidence_persisted(&self) -> u64 {
        self.evidence_persisted.load(Ordering::Relaxed)
    }

    pub fn evidence_omitted(&self) -> u64 {
        self.evidence_omitted.load(Ordering::Relaxed)
    }

    pub fn references_dropped(&self) -> u64 {
        self.references_dropped.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.criteria_evaluated.store(0, Ordering::Relaxed);
        self.evidence_persisted.store(0, Ordering::Relaxed);
        self.evidence_omitted.store(0, Ordering::Relaxed);
        self.references_dropped.store(0, Ordering::Relaxed);
    }
}
