//! Score publishing.
//!
//! [`ScorePublisher`] turns an [`EvaluationOutcome`] into the final
//! [`ScoreOutput`]. The outcome is checked against the rubric first; a
//! malformed outcome is an error. Evidence references are then reconciled
//! against the [`EvidenceManifest`]: only ids the store actually wrote are
//! published, and everything dropped becomes a warning.

pub mod error;
pub mod summary;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{
    percentage, points_eq, CriterionStatus, Dimension, EvaluationOutcome, EvidenceManifest,
    LetterGrade, INDEX_KEY,
};
use crate::metrics::METRICS;
use crate::obs;
use crate::rubric::{RubricDefinition, RUBRIC_TOTAL_POINTS};

pub use error::PublishError;
pub use summary::render_summary;

/// Per-dimension slice of the published score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionBreakdown {
    pub score: f64,
    pub max: f64,
    pub percentage: f64,
    pub met_count: usize,
    pub partial_count: usize,
    pub unmet_count: usize,
    /// Criterion ids, in rubric order.
    pub met: Vec<String>,
    pub partial: Vec<String>,
    pub unmet: Vec<String>,
}

impl DimensionBreakdown {
    fn empty(max: f64) -> Self {
        Self {
            score: 0.0,
            max,
            percentage: 0.0,
            met_count: 0,
            partial_count: 0,
            unmet_count: 0,
            met: Vec::new(),
            partial: Vec::new(),
            unmet: Vec::new(),
        }
    }

    fn record(&mut self, criterion_id: &str, status: CriterionStatus, score: f64) {
        self.score += score;
        let id = criterion_id.to_string();
        match status {
            CriterionStatus::Met => {
                self.met_count += 1;
                self.met.push(id);
            }
            CriterionStatus::Partial => {
                self.partial_count += 1;
                self.partial.push(id);
            }
            CriterionStatus::Unmet => {
                self.unmet_count += 1;
                self.unmet.push(id);
            }
        }
    }
}

/// Final, reconciled score for one run.
///
/// Every path in `evidence_paths` comes from the evidence manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreOutput {
    pub total_score: f64,
    pub max_possible_score: f64,
    pub percentage: f64,
    pub letter_grade: LetterGrade,
    pub dimension_breakdowns: BTreeMap<Dimension, DimensionBreakdown>,
    pub evidence_paths: BTreeMap<String, PathBuf>,
    pub warnings: Vec<String>,
    pub human_summary: String,
}

struct Reconciled {
    evidence_paths: BTreeMap<String, PathBuf>,
    dropped: Vec<String>,
}

/// Publishes scores for one rubric.
pub struct ScorePublisher<'a> {
    rubric: &'a RubricDefinition,
}

impl<'a> ScorePublisher<'a> {
    pub fn new(rubric: &'a RubricDefinition) -> Self {
        Self { rubric }
    }

    /// Check `outcome`, reconcile its evidence against `manifest` and build the output.
    pub fn publish(
        &self,
        outcome: &EvaluationOutcome,
        manifest: &EvidenceManifest,
    ) -> Result<ScoreOutput, PublishError> {
        self.check_outcome(outcome)?;

        let dimension_breakdowns = self.breakdowns(outcome);
        let Reconciled {
            evidence_paths,
            dropped,
        } = reconcile(outcome, manifest);

        let mut warnings = manifest.warnings.clone();
        if manifest.is_empty() {
            warnings.push(format!(
                "evidence manifest is empty; {} evidence reference(s) dropped",
                dropped.len()
            ));
        } else if !dropped.is_empty() {
            warnings.push(format!(
                "{} evidence reference(s) dropped: not present in the evidence manifest",
                dropped.len()
            ));
        }
        if !dropped.is_empty() {
            obs::emit_references_dropped(&dropped);
            METRICS.add_references_dropped(dropped.len() as u64);
        }

        let pct = percentage(outcome.total_score, outcome.max_possible_score);
        let letter_grade = LetterGrade::from_percentage(pct);

        let mut output = ScoreOutput {
            total_score: outcome.total_score,
            max_possible_score: outcome.max_possible_score,
            percentage: pct,
            letter_grade,
            dimension_breakdowns,
            evidence_paths,
            warnings,
            human_summary: String::new(),
        };
        output.human_summary = render_summary(&output);

        obs::emit_score_published(
            output.total_score,
            output.percentage,
            output.letter_grade,
            output.evidence_paths.len(),
        );
        Ok(output)
    }

    fn check_outcome(&self, outcome: &EvaluationOutcome) -> Result<(), PublishError> {
        let rubric_total = self.rubric.total_points();
        if !points_eq(rubric_total, RUBRIC_TOTAL_POINTS) {
            return Err(PublishError::RubricTotal {
                total: rubric_total,
                expected: RUBRIC_TOTAL_POINTS,
            });
        }

        let criteria = &self.rubric.criteria;
        if outcome.criteria.len() != criteria.len() {
            return Err(PublishError::CriterionCountMismatch {
                expected: criteria.len(),
                actual: outcome.criteria.len(),
            });
        }

        for (position, (expected, actual)) in criteria.iter().zip(&outcome.criteria).enumerate() {
            if expected.id != actual.criterion_id {
                return Err(PublishError::CriterionOrderMismatch {
                    position,
                    expected: expected.id.clone(),
                    actual: actual.criterion_id.clone(),
                });
            }
            if expected.dimension != actual.dimension {
                return Err(PublishError::DimensionMismatch {
                    criterion: actual.criterion_id.clone(),
                    expected: expected.dimension,
                    actual: actual.dimension,
                });
            }
            if !points_eq(expected.max_points, actual.max_points) {
                return Err(PublishError::MaxPointsMismatch {
                    criterion: actual.criterion_id.clone(),
                    expected: expected.max_points,
                    actual: actual.max_points,
                });
            }
            if !actual.is_consistent() {
                return Err(PublishError::InconsistentScore {
                    criterion: actual.criterion_id.clone(),
                    status: actual.status,
                    score: actual.score,
                    max_points: actual.max_points,
                });
            }
        }

        let computed: f64 = outcome.criteria.iter().map(|c| c.score).sum();
        if !points_eq(computed, outcome.total_score) {
            return Err(PublishError::TotalMismatch {
                reported: outcome.total_score,
                computed,
            });
        }

        if !points_eq(rubric_total, outcome.max_possible_score) {
            return Err(PublishError::MaxPossibleMismatch {
                reported: outcome.max_possible_score,
                expected: rubric_total,
            });
        }
        Ok(())
    }

    fn breakdowns(&self, outcome: &EvaluationOutcome) -> BTreeMap<Dimension, DimensionBreakdown> {
        let mut breakdowns: BTreeMap<Dimension, DimensionBreakdown> = self
            .rubric
            .dimensions()
            .into_iter()
            .map(|d| (d, DimensionBreakdown::empty(self.rubric.dimension_weight(d))))
            .collect();

        for c in &outcome.criteria {
            breakdowns
                .entry(c.dimension)
                .or_insert_with(|| DimensionBreakdown::empty(0.0))
                .record(&c.criterion_id, c.status, c.score);
        }
        for b in breakdowns.values_mut() {
            b.percentage = percentage(b.score, b.max);
        }
        breakdowns
    }
}

/// Keep only references the manifest can back; the index rides along when present.
fn reconcile(outcome: &EvaluationOutcome, manifest: &EvidenceManifest) -> Reconciled {
    let mut evidence_paths = BTreeMap::new();
    let mut dropped = Vec::new();

    for id in outcome.referenced_evidence_ids() {
        match manifest.get(id) {
            Some(path) => {
                evidence_paths.insert(id.to_string(), path.to_path_buf());
            }
            None => dropped.push(id.to_string()),
        }
    }
    if let Some(path) = manifest.get(INDEX_KEY) {
        evidence_paths.insert(INDEX_KEY.to_string(), path.to_path_buf());
    }

    Reconciled {
        evidence_paths,
        dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CriterionOutcome;

    fn rubric() -> RubricDefinition {
        RubricDefinition::builtin().expect("builtin rubric")
    }

    /// Outcome for the built-in rubric with every criterion at `status`.
    fn outcome_with(rubric: &RubricDefinition, status: CriterionStatus) -> EvaluationOutcome {
        let criteria = rubric
            .criteria
            .iter()
            .map(|c| CriterionOutcome {
                criterion_id: c.id.clone(),
                dimension: c.dimension,
                max_points: c.max_points,
                status,
                score: status.points_for(c.max_points),
                evidence_ids: vec![format!("{}-01", c.id)],
            })
            .collect();
        EvaluationOutcome::from_criteria(criteria, rubric.total_points())
    }

    fn manifest_for(outcome: &EvaluationOutcome) -> EvidenceManifest {
        let mut manifest = EvidenceManifest::empty();
        for id in outcome.referenced_evidence_ids() {
            manifest
                .entries
                .insert(id.to_string(), PathBuf::from(format!("/ev/{id}.json")));
        }
        manifest
            .entries
            .insert(INDEX_KEY.to_string(), PathBuf::from("/ev/index.json"));
        manifest
    }

    #[test]
    fn test_publish_all_met() {
        let rubric = rubric();
        let outcome = outcome_with(&rubric, CriterionStatus::Met);
        let manifest = manifest_for(&outcome);

        let output = ScorePublisher::new(&rubric)
            .publish(&outcome, &manifest)
            .expect("publish");

        assert_eq!(output.total_score, 100.0);
        assert_eq!(output.percentage, 100.0);
        assert_eq!(output.letter_grade, LetterGrade::A);
        assert!(output.warnings.is_empty());
        assert_eq!(output.evidence_paths.len(), manifest.len());
        assert_eq!(output.dimension_breakdowns.len(), 3);
        let code = &output.dimension_breakdowns[&Dimension::CodeQuality];
        assert_eq!(code.max, 40.0);
        assert_eq!(code.met_count, 3);
        assert!(output.human_summary.starts_with("Score: 100/100"));
    }

    #[test]
    fn test_reconciliation_drops_unpersisted_references() {
        let rubric = rubric();
        let outcome = outcome_with(&rubric, CriterionStatus::Partial);
        let mut manifest = manifest_for(&outcome);
        manifest.entries.remove("coverage-01");
        manifest.entries.remove("readme-01");
        manifest.warnings.push("evidence coverage-01 omitted: disk full".to_string());

        let output = ScorePublisher::new(&rubric)
            .publish(&outcome, &manifest)
            .expect("publish");

        assert!(!output.evidence_paths.contains_key("coverage-01"));
        assert!(output.evidence_paths.contains_key(INDEX_KEY));
        for (id, path) in &output.evidence_paths {
            assert_eq!(manifest.get(id), Some(path.as_path()));
        }
        assert_eq!(output.warnings.len(), 2);
        assert_eq!(output.warnings[0], "evidence coverage-01 omitted: disk full");
        assert!(output.warnings[1].starts_with("2 evidence reference(s) dropped"));
        assert_eq!(output.total_score, 50.0);
    }

    #[test]
    fn test_empty_manifest_yields_no_paths_and_one_warning() {
        let rubric = rubric();
        let outcome = outcome_with(&rubric, CriterionStatus::Unmet);

        let output = ScorePublisher::new(&rubric)
            .publish(&outcome, &EvidenceManifest::empty())
            .expect("publish");

        assert!(output.evidence_paths.is_empty());
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].contains("manifest is empty"));
        assert_eq!(output.letter_grade, LetterGrade::F);
    }

    #[test]
    fn test_malformed_outcomes_are_rejected() {
        let rubric = rubric();
        let publisher = ScorePublisher::new(&rubric);
        let manifest = EvidenceManifest::empty();
        let good = outcome_with(&rubric, CriterionStatus::Met);

        let mut missing = good.clone();
        missing.criteria.pop();
        assert!(matches!(
            publisher.publish(&missing, &manifest),
            Err(PublishError::CriterionCountMismatch { .. })
        ));

        let mut swapped = good.clone();
        swapped.criteria.swap(0, 1);
        assert!(matches!(
            publisher.publish(&swapped, &manifest),
            Err(PublishError::CriterionOrderMismatch { position: 0, .. })
        ));

        let mut inconsistent = good.clone();
        inconsistent.criteria[0].score = 1.0;
        assert!(matches!(
            publisher.publish(&inconsistent, &manifest),
            Err(PublishError::InconsistentScore { .. })
        ));

        let mut wrong_total = good.clone();
        wrong_total.total_score = 99.0;
        assert!(matches!(
            publisher.publish(&wrong_total, &manifest),
            Err(PublishError::TotalMismatch { .. })
        ));

        let mut wrong_max = good.clone();
        wrong_max.max_possible_score = 120.0;
        assert!(matches!(
            publisher.publish(&wrong_max, &manifest),
            Err(PublishError::MaxPossibleMismatch { .. })
        ));

        let mut wrong_points = good;
        wrong_points.criteria[0].max_points = 7.0;
        wrong_points.criteria[0].score = 7.0;
        assert!(matches!(
            publisher.publish(&wrong_points, &manifest),
            Err(PublishError::MaxPointsMismatch { .. })
        ));
    }

    #[test]
    fn test_rubric_not_totalling_100_is_never_published() {
        let short = RubricDefinition::from_toml_str(
            r#"
[[criteria]]
id = "lint_clean"
dimension = "code_quality"
max_points = 70
rule = "lint_issues"
params = { max_issues = 0 }
"#,
        )
        .expect("parse rubric");
        let outcome = outcome_with(&short, CriterionStatus::Met);

        let err = ScorePublisher::new(&short)
            .publish(&outcome, &manifest_for(&outcome))
            .expect_err("70-point rubric");
        assert!(matches!(
            err,
            PublishError::RubricTotal { total, expected } if total == 70.0 && expected == 100.0
        ));
    }
}
