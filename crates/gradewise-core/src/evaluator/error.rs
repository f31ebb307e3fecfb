//! Error types for criterion evaluation.

use crate::domain::{CriterionStatus, SnapshotError};
use crate::rubric::RubricConfigError;
use crate::rules::RuleError;

/// Errors that abort an evaluation run.
///
/// Apart from `InvalidSnapshot`, each variant points at a rubric or rule
/// defect rather than at the repository being graded.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("rubric failed validation: {0}")]
    InvalidRubric(#[from] RubricConfigError),

    #[error("snapshot failed validation: {0}")]
    InvalidSnapshot(#[from] SnapshotError),

    #[error("could not start evaluation workers: {0}")]
    WorkerPool(String),

    #[error("criterion {criterion:?} references unregistered rule {rule:?}")]
    UnknownRule { criterion: String, rule: String },

    #[error("rule for criterion {criterion:?} failed: {source}")]
    Rule {
        criterion: String,
        #[source]
        source: RuleError,
    },

    #[error(
        "criterion {criterion:?} returned score {score} for status {status} (max {max_points})"
    )]
    InconsistentScore {
        criterion: String,
        status: CriterionStatus,
        score: f64,
        max_points: f64,
    },

    #[error("rule {rule:?} returned partial for criterion {criterion:?} without a partial threshold")]
    ImplicitPartial { criterion: String, rule: String },

    #[error("criterion {criterion:?} produced no evidence")]
    MissingEvidence { criterion: String },

    #[error("evidence {id:?} is not referenced by any criterion")]
    OrphanEvidence { id: String },

    #[error("evidence {id:?} is referenced more than once")]
    DuplicateEvidenceReference { id: String },
}

/// Result type for evaluation.
pub type EvaluationResult<T> = std::result::Result<T, EvaluationError>;
