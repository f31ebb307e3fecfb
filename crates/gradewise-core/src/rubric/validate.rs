use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::domain::{points_eq, Dimension};
use crate::rules::RuleRegistry;

use super::{RubricDefinition, ValidationIssue, RUBRIC_TOTAL_POINTS};

const CRITERION_ID_PATTERN: &str = r"^[a-z0-9][a-z0-9_-]*$";

fn criterion_id_regex() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(CRITERION_ID_PATTERN).ok())
        .as_ref()
}

/// Criterion ids double as directory names, so they are kept path-safe.
pub fn is_valid_criterion_id(id: &str) -> bool {
    criterion_id_regex().is_some_and(|re| re.is_match(id))
}

/// Collect every violation in `def`. An empty list means the rubric is usable.
pub fn validate(def: &RubricDefinition, registry: &RuleRegistry) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if def.criteria.is_empty() {
        issues.push(ValidationIssue::EmptyRubric);
    }

    let mut seen = BTreeSet::new();
    for criterion in &def.criteria {
        if !is_valid_criterion_id(&criterion.id) {
            issues.push(ValidationIssue::InvalidCriterionId {
                id: criterion.id.clone(),
            });
        }
        if !seen.insert(criterion.id.as_str()) {
            issues.push(ValidationIssue::DuplicateCriterion {
                id: criterion.id.clone(),
            });
        }
        if !(criterion.max_points.is_finite() && criterion.max_points > 0.0) {
            issues.push(ValidationIssue::NonPositivePoints {
                criterion: criterion.id.clone(),
                points: criterion.max_points,
            });
        }

        let Some(rule) = registry.get(&criterion.rule) else {
            issues.push(ValidationIssue::UnknownRule {
                criterion: criterion.id.clone(),
                rule: criterion.rule.clone(),
            });
            continue;
        };

        if let Err(e) = rule.validate_params(&criterion.params) {
            issues.push(ValidationIssue::InvalidParams {
                criterion: criterion.id.clone(),
                language: None,
                reason: e.to_string(),
            });
        }
        for language in criterion.language_overrides.keys() {
            if let Err(e) = rule.validate_params(&criterion.effective_params(language)) {
                issues.push(ValidationIssue::InvalidParams {
                    criterion: criterion.id.clone(),
                    language: Some(language.clone()),
                    reason: e.to_string(),
                });
            }
        }
    }

    for (language, criterion) in &def.dangling_overrides {
        issues.push(ValidationIssue::OverrideForUnknownCriterion {
            language: language.clone(),
            criterion: criterion.clone(),
        });
    }

    for (name, declared) in &def.declared_weights {
        match Dimension::from_key(name) {
            Some(dimension) => {
                let derived = def.dimension_weight(dimension);
                if !points_eq(*declared, derived) {
                    issues.push(ValidationIssue::DimensionWeightMismatch {
                        dimension,
                        declared: *declared,
                        derived,
                    });
                }
            }
            None => issues.push(ValidationIssue::UnknownDimension { name: name.clone() }),
        }
    }

    if !def.criteria.is_empty() {
        let total = def.total_points();
        if !points_eq(total, RUBRIC_TOTAL_POINTS) {
            issues.push(ValidationIssue::TotalPointsMismatch {
                expected: RUBRIC_TOTAL_POINTS,
                actual: total,
            });
        }
    }

    issues
}
