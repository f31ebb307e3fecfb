//! Error types for rubric loading and validation.

use std::path::PathBuf;

use crate::domain::Dimension;

/// A single rubric violation. Validation collects all of them.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationIssue {
    #[error("rubric defines no criteria")]
    EmptyRubric,

    #[error("criterion id {id:?} must match [a-z0-9][a-z0-9_-]*")]
    InvalidCriterionId { id: String },

    #[error("criterion id {id:?} is defined more than once")]
    DuplicateCriterion { id: String },

    #[error("criterion {criterion:?} references unknown rule {rule:?}")]
    UnknownRule { criterion: String, rule: String },

    #[error("criterion {criterion:?} has non-positive max_points {points}")]
    NonPositivePoints { criterion: String, points: f64 },

    #[error("dimension table names unknown dimension {name:?}")]
    UnknownDimension { name: String },

    #[error("dimension {dimension} declares weight {declared} but its criteria sum to {derived}")]
    DimensionWeightMismatch {
        dimension: Dimension,
        declared: f64,
        derived: f64,
    },

    #[error("criteria max_points sum to {actual}, expected {expected}")]
    TotalPointsMismatch { expected: f64, actual: f64 },

    #[error("override for language {language:?} references unknown criterion {criterion:?}")]
    OverrideForUnknownCriterion { language: String, criterion: String },

    #[error("criterion {criterion:?}{} has invalid params: {reason}", language_suffix(.language))]
    InvalidParams {
        criterion: String,
        language: Option<String>,
        reason: String,
    },
}

fn language_suffix(language: &Option<String>) -> String {
    language
        .as_deref()
        .map(|l| format!(" (language {l})"))
        .unwrap_or_default()
}

/// Errors produced while loading a rubric.
#[derive(Debug, thiserror::Error)]
pub enum RubricConfigError {
    #[error("failed to read rubric {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rubric TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid rubric JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rubric failed validation with {} issue(s): {}", .issues.len(), join_issues(.issues))]
    Invalid { issues: Vec<ValidationIssue> },
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_lists_every_issue() {
        let err = RubricConfigError::Invalid {
            issues: vec![
                ValidationIssue::DuplicateCriterion {
                    id: "lint".to_string(),
                },
                ValidationIssue::UnknownRule {
                    criterion: "docs".to_string(),
                    rule: "magic".to_string(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 issue(s)"));
        assert!(msg.contains("\"lint\" is defined more than once"));
        assert!(msg.contains("unknown rule \"magic\""));
    }

    #[test]
    fn test_invalid_params_mentions_language() {
        let issue = ValidationIssue::InvalidParams {
            criterion: "coverage".to_string(),
            language: Some("python".to_string()),
            reason: "min_percent must be within [0, 100], got 120".to_string(),
        };
        assert!(issue.to_string().contains("(language python)"));
    }
}
