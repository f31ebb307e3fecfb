//! Structured observability hooks for the grading run lifecycle.
//!
//! - `RunSpan`: RAII guard entering a run-scoped span
//! - `emit_*`: one function per lifecycle event, each logging an `event` field
//!
//! Filtering follows `RUST_LOG`; see [`crate::telemetry::init_tracing`].

use std::path::Path;

use tracing::{debug, info, warn};

use crate::domain::{CriterionStatus, Dimension, LetterGrade};

/// RAII guard that enters a run-scoped tracing span for the duration of a run.
///
/// ```ignore
/// let _span = RunSpan::enter("python");
/// // every event below carries language = "python"
/// ```
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    pub fn enter(language: &str) -> Self {
        Self {
            _span: run_span(language).entered(),
        }
    }
}

/// The run-scoped span itself, for instrumenting futures that cross threads.
pub fn run_span(language: &str) -> tracing::Span {
    tracing::info_span!("gradewise.run", language = %language)
}

pub fn emit_evaluation_started(language: &str, criteria: usize, workers: usize) {
    info!(
        event = "evaluation.started",
        language = %language,
        criteria = criteria,
        workers = workers,
    );
}

/// Emit event: one criterion decided.
pub fn emit_criterion_evaluated(
    criterion_id: &str,
    dimension: Dimension,
    status: CriterionStatus,
    score: f64,
    evidence: usize,
) {
    debug!(
        event = "criterion.evaluated",
        criterion = %criterion_id,
        dimension = dimension.key(),
        status = status.as_str(),
        score = score,
        evidence = evidence,
    );
}

pub fn emit_evaluation_finished(total_score: f64, max_possible_score: f64, evidence: usize) {
    info!(
        event = "evaluation.finished",
        total_score = total_score,
        max_possible_score = max_possible_score,
        evidence = evidence,
    );
}

pub fn emit_evidence_persisted(id: &str, path: &Path, digest: &str) {
    debug!(
        event = "evidence.persisted",
        id = %id,
        path = %path.display(),
        sha256 = %digest,
    );
}

/// Emit event: evidence item dropped from the manifest (warning level).
pub fn emit_evidence_omitted(id: &str, reason: &str) {
    warn!(event = "evidence.omitted", id = %id, reason = %reason);
}

pub fn emit_index_written(path: &Path, entries: usize) {
    info!(
        event = "evidence.index_written",
        path = %path.display(),
        entries = entries,
    );
}

/// Emit event: the aggregate index could not be written or verified (warning level).
pub fn emit_index_failed(reason: &str) {
    warn!(event = "evidence.index_failed", reason = %reason);
}

/// Emit event: references dropped during reconciliation.
pub fn emit_references_dropped(dropped: &[String]) {
    debug!(
        event = "publish.references_dropped",
        count = dropped.len(),
        ids = ?dropped,
    );
}

pub fn emit_score_published(total_score: f64, percentage: f64, grade: LetterGrade, paths: usize) {
    info!(
        event = "score.published",
        total_score = total_score,
        percentage = percentage,
        grade = grade.as_str(),
        evidence_paths = paths,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_run_span_create() {
        let _span = RunSpan::enter("rust");
    }

    #[test]
    #[traced_test]
    fn test_omission_is_logged_as_warning() {
        emit_evidence_omitted("lint_clean-01", "permission denied");
        assert!(logs_contain("evidence.omitted"));
        assert!(logs_contain("permission denied"));
    }
}
