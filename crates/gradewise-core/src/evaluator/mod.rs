//! Criterion evaluation: dispatch each rubric criterion to its rule strategy
//! and turn the verdicts into outcomes plus identified evidence.
//!
//! Criteria are independent, so they are evaluated on a bounded rayon pool.
//! The rubric and snapshot are only ever read. Results are reassembled in
//! rubric order, and every verdict is checked before it is accepted:
//!
//! - the score must be the one its status implies
//! - `Partial` is only accepted when the effective params define a partial threshold
//! - at least one evidence entry must justify the decision
//!
//! Evaluation is deterministic: the same rubric, snapshot and language give
//! equal outcomes and equal evidence.

pub mod error;

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::domain::{
    CriterionOutcome, CriterionStatus, EvaluationOutcome, Evidence, MetricsSnapshot,
};
use crate::metrics::METRICS;
use crate::obs;
use crate::rubric::{normalize_language, validate, Criterion, RubricConfigError, RubricDefinition};
use crate::rules::{Rule, RuleContext, RuleParams, RuleRegistry, RuleVerdict};

pub use error::{EvaluationError, EvaluationResult};

type Decided = (CriterionOutcome, Vec<Evidence>);

/// Outcomes for every criterion plus the evidence they reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub outcome: EvaluationOutcome,
    /// In outcome order, then in the order each rule produced them.
    pub evidence: Vec<Evidence>,
}

/// Evaluates rubrics against snapshots using a [`RuleRegistry`].
#[derive(Debug, Clone)]
pub struct RuleEvaluator {
    registry: RuleRegistry,
    workers: usize,
}

impl RuleEvaluator {
    pub const DEFAULT_WORKERS: usize = 4;

    pub fn new(registry: RuleRegistry) -> Self {
        Self {
            registry,
            workers: Self::DEFAULT_WORKERS,
        }
    }

    /// Size of the worker pool. Zero is treated as one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Evaluate every criterion of `rubric` for `language`.
    ///
    /// The rubric is validated against this evaluator's registry first, so a
    /// definition built without [`crate::RubricLoader`] is held to the same
    /// rules. Otherwise fails on the first structural problem, reported in
    /// rubric order.
    pub fn evaluate(
        &self,
        rubric: &RubricDefinition,
        snapshot: &MetricsSnapshot,
        language: &str,
    ) -> EvaluationResult<Evaluation> {
        let issues = validate(rubric, &self.registry);
        if !issues.is_empty() {
            return Err(RubricConfigError::Invalid { issues }.into());
        }
        snapshot.validate()?;
        let language = normalize_language(language);
        obs::emit_evaluation_started(&language, rubric.criteria.len(), self.workers);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("gradewise-eval-{i}"))
            .build()
            .map_err(|e| EvaluationError::WorkerPool(e.to_string()))?;

        let decided: Vec<EvaluationResult<Decided>> = pool.install(|| {
            rubric
                .criteria
                .par_iter()
                .map(|criterion| self.evaluate_criterion(criterion, snapshot, &language))
                .collect()
        });

        let mut criteria = Vec::with_capacity(decided.len());
        let mut evidence = Vec::new();
        for result in decided {
            let (outcome, items) = result?;
            obs::emit_criterion_evaluated(
                &outcome.criterion_id,
                outcome.dimension,
                outcome.status,
                outcome.score,
                items.len(),
            );
            METRICS.inc_criteria_evaluated();
            criteria.push(outcome);
            evidence.extend(items);
        }

        let outcome = EvaluationOutcome::from_criteria(criteria, rubric.total_points());
        if cfg!(debug_assertions) {
            check_evidence_references(&outcome, &evidence)?;
        }

        obs::emit_evaluation_finished(
            outcome.total_score,
            outcome.max_possible_score,
            evidence.len(),
        );
        Ok(Evaluation { outcome, evidence })
    }

    fn evaluate_criterion(
        &self,
        criterion: &Criterion,
        snapshot: &MetricsSnapshot,
        language: &str,
    ) -> EvaluationResult<Decided> {
        let rule = self
            .registry
            .get(&criterion.rule)
            .ok_or_else(|| EvaluationError::UnknownRule {
                criterion: criterion.id.clone(),
                rule: criterion.rule.clone(),
            })?;

        let params = criterion.effective_params(language);
        let ctx = RuleContext {
            criterion_id: &criterion.id,
            dimension: criterion.dimension,
            max_points: criterion.max_points,
            language,
        };
        let verdict = rule
            .evaluate(&ctx, snapshot, &params)
            .map_err(|source| EvaluationError::Rule {
                criterion: criterion.id.clone(),
                source,
            })?;
        check_verdict(criterion, rule.as_ref(), &params, &verdict)?;

        let evidence: Vec<Evidence> = verdict
            .evidence
            .into_iter()
            .enumerate()
            .map(|(i, draft)| {
                let id = Evidence::make_id(&criterion.id, i + 1);
                Evidence {
                    suggested_path: Evidence::default_path(criterion.dimension, &criterion.id, &id),
                    id,
                    criterion_id: criterion.id.clone(),
                    dimension: criterion.dimension,
                    confidence: draft.confidence,
                    summary: draft.summary,
                    payload: draft.payload,
                }
            })
            .collect();

        let outcome = CriterionOutcome {
            criterion_id: criterion.id.clone(),
            dimension: criterion.dimension,
            max_points: criterion.max_points,
            status: verdict.status,
            score: verdict.status.points_for(criterion.max_points),
            evidence_ids: evidence.iter().map(|e| e.id.clone()).collect(),
        };
        Ok((outcome, evidence))
    }
}

fn check_verdict(
    criterion: &Criterion,
    rule: &dyn Rule,
    params: &RuleParams,
    verdict: &RuleVerdict,
) -> EvaluationResult<()> {
    if !verdict
        .status
        .is_consistent(verdict.score, criterion.max_points)
    {
        return Err(EvaluationError::InconsistentScore {
            criterion: criterion.id.clone(),
            status: verdict.status,
            score: verdict.score,
            max_points: criterion.max_points,
        });
    }
    if verdict.status == CriterionStatus::Partial && !rule.allows_partial(params) {
        return Err(EvaluationError::ImplicitPartial {
            criterion: criterion.id.clone(),
            rule: criterion.rule.clone(),
        });
    }
    if verdict.evidence.is_empty() {
        return Err(EvaluationError::MissingEvidence {
            criterion: criterion.id.clone(),
        });
    }
    Ok(())
}

/// Every evidence id must be referenced by exactly one criterion outcome.
///
/// Runs automatically in debug builds.
pub fn check_evidence_references(
    outcome: &EvaluationOutcome,
    evidence: &[Evidence],
) -> EvaluationResult<()> {
    let mut references: BTreeMap<&str, usize> = BTreeMap::new();
    for id in outcome.referenced_evidence_ids() {
        *references.entry(id).or_default() += 1;
    }
    for item in evidence {
        match references.get(item.id.as_str()) {
            None => {
                return Err(EvaluationError::OrphanEvidence {
                    id: item.id.clone(),
                })
            }
            Some(n) if *n > 1 => {
                return Err(EvaluationError::DuplicateEvidenceReference {
                    id: item.id.clone(),
                })
            }
            Some(_) => {}
        }
    }
    Ok(())
}
