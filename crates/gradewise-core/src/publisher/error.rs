//! Error types for score publishing.

use crate::domain::{CriterionStatus, Dimension};

/// A malformed evaluation outcome. Always fatal; reconciliation problems
/// are warnings, not errors.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("outcome has {actual} criteria, rubric has {expected}")]
    CriterionCountMismatch { expected: usize, actual: usize },

    #[error("outcome position {position} is {actual:?}, rubric expects {expected:?}")]
    CriterionOrderMismatch {
        position: usize,
        expected: String,
        actual: String,
    },

    #[error("criterion {criterion:?} reports max {actual}, rubric says {expected}")]
    MaxPointsMismatch {
        criterion: String,
        expected: f64,
        actual: f64,
    },

    #[error("criterion {criterion:?} reports dimension {actual}, rubric says {expected}")]
    DimensionMismatch {
        criterion: String,
        expected: Dimension,
        actual: Dimension,
    },

    #[error("criterion {criterion:?} has score {score} for status {status} (max {max_points})")]
    InconsistentScore {
        criterion: String,
        status: CriterionStatus,
        score: f64,
        max_points: f64,
    },

    #[error("outcome total {reported} differs from the sum of criterion scores {computed}")]
    TotalMismatch { reported: f64, computed: f64 },

    #[error("outcome max {reported} differs from the rubric total {expected}")]
    MaxPossibleMismatch { reported: f64, expected: f64 },

    #[error("rubric totals {total} points; scores are only published out of {expected}")]
    RubricTotal { total: f64, expected: f64 },
}
