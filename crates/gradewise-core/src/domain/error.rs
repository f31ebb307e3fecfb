//! Top-level error taxonomy for Gradewise.

use crate::evaluator::EvaluationError;
use crate::publisher::PublishError;
use crate::rubric::RubricConfigError;

use super::snapshot::SnapshotError;

/// Errors surfaced to callers of the grading pipeline.
///
/// Evidence persistence and reconciliation problems are never errors; they
/// travel as warnings on the published score.
#[derive(Debug, thiserror::Error)]
pub enum GradewiseError {
    #[error("rubric configuration error: {0}")]
    Rubric(#[from] RubricConfigError),

    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GradewiseError {
    /// Process exit code a command-line front end should use for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            GradewiseError::Rubric(_) => 2,
            GradewiseError::Evaluation(EvaluationError::InvalidRubric(_)) => 2,
            GradewiseError::Snapshot(_) => 3,
            GradewiseError::Evaluation(EvaluationError::InvalidSnapshot(_)) => 3,
            GradewiseError::Evaluation(_) => 4,
            GradewiseError::Publish(_) => 5,
            GradewiseError::Serialization(_) | GradewiseError::Io(_) => 1,
        }
    }
}

/// Result type for Gradewise operations.
pub type Result<T> = std::result::Result<T, GradewiseError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rubric::ValidationIssue;

    #[test]
    fn test_exit_codes() {
        let err = GradewiseError::from(RubricConfigError::Invalid {
            issues: vec![ValidationIssue::EmptyRubric],
        });
        assert_eq!(err.exit_code(), 2);

        let err = GradewiseError::from(EvaluationError::from(RubricConfigError::Invalid {
            issues: vec![ValidationIssue::EmptyRubric],
        }));
        assert_eq!(err.exit_code(), 2);

        let err = GradewiseError::from(SnapshotError::EmptyLanguage);
        assert_eq!(err.exit_code(), 3);

        let err = GradewiseError::from(EvaluationError::InvalidSnapshot(
            SnapshotError::EmptyLanguage,
        ));
        assert_eq!(err.exit_code(), 3);

        let err = GradewiseError::from(EvaluationError::UnknownRule {
            criterion: "x".to_string(),
            rule: "nope".to_string(),
        });
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_error_display_mentions_cause() {
        let err = GradewiseError::from(SnapshotError::MissingKey {
            key: "lint".to_string(),
        });
        let msg = err.to_string();
        assert!(msg.contains("invalid snapshot"));
        assert!(msg.contains("lint"));
    }
}
