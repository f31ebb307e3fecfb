//! Per-criterion decisions and the aggregated evaluation outcome.

use serde::{Deserialize, Serialize};

use super::grading::{CriterionStatus, Dimension};

/// Decision for one criterion. Created once per run; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionOutcome {
    pub criterion_id: String,
    pub dimension: Dimension,
    pub max_points: f64,
    pub status: CriterionStatus,
    /// Always `status.points_for(max_points)`.
    pub score: f64,
    /// Ordered ids of the evidence justifying this decision.
    pub evidence_ids: Vec<String>,
}

impl CriterionOutcome {
    pub fn is_consistent(&self) -> bool {
        self.status.is_consistent(self.score, self.max_points)
    }
}

/// Ordered outcomes for every rubric criterion plus totals.
///
/// # Invariants
///
/// `criteria` follows rubric order and `total_score` is the sum of their
/// scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    pub criteria: Vec<CriterionOutcome>,
    pub total_score: f64,
    pub max_possible_score: f64,
}

impl EvaluationOutcome {
    /// Build an outcome, deriving `total_score` from the criteria.
    pub fn from_criteria(criteria: Vec<CriterionOutcome>, max_possible_score: f64) -> Self {
        let total_score = criteria.iter().map(|c| c.score).sum();
        Self {
            criteria,
            total_score,
            max_possible_score,
        }
    }

    pub fn get(&self, criterion_id: &str) -> Option<&CriterionOutcome> {
        self.criteria.iter().find(|c| c.criterion_id == criterion_id)
    }

    /// Every evidence id referenced by any criterion, in outcome order.
    pub fn referenced_evidence_ids(&self) -> impl Iterator<Item = &str> {
        self.criteria
            .iter()
            .flat_map(|c| c.evidence_ids.iter().map(String::as_str))
    }

    pub fn count_with_status(&self, status: CriterionStatus) -> usize {
        self.criteria.iter().filter(|c| c.status == status).count()
    }
}
