//! Rule strategies: named, pure functions from snapshot fields and
//! parameters to a criterion verdict.
//!
//! Strategies are registered by name in a flat [`RuleRegistry`]; the rubric
//! refers to them by that name. Adding a criterion or a language never
//! touches evaluator control flow, only rubric configuration (and, for new
//! kinds of measurement, a new strategy).
//!
//! # Modules
//!
//! - [`lint`]: `lint_issues`
//! - [`build`]: `build_success`
//! - [`audit`]: `dependency_audit`
//! - [`testing`]: `test_pass_rate`, `coverage_threshold`
//! - [`docs`]: `readme_sections`, `api_doc_coverage`, `project_files`
//! - [`threshold`]: `metric_threshold` (generic graduated thresholds)

pub mod audit;
pub mod build;
pub mod docs;
pub mod lint;
pub mod testing;
pub mod threshold;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::domain::{CriterionStatus, Dimension, EvidenceDraft, MetricsSnapshot};

pub use audit::DependencyAuditRule;
pub use build::BuildSuccessRule;
pub use docs::{ApiDocCoverageRule, ProjectFilesRule, ReadmeSectionsRule};
pub use lint::LintIssuesRule;
pub use testing::{CoverageThresholdRule, TestPassRateRule};
pub use threshold::{Direction, Metric, MetricThresholdRule};

/// Rule parameters as written in the rubric (after override merging).
pub type RuleParams = serde_json::Map<String, serde_json::Value>;

/// Tolerance applied to threshold comparisons on ratios and percentages.
const THRESHOLD_EPSILON: f64 = 1e-9;

/// Errors a rule strategy can raise. Fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// What a rule knows about the criterion it is evaluating.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub criterion_id: &'a str,
    pub dimension: Dimension,
    pub max_points: f64,
    pub language: &'a str,
}

/// The `(status, score, evidence)` triple returned by a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleVerdict {
    pub status: CriterionStatus,
    pub score: f64,
    pub evidence: Vec<EvidenceDraft>,
}

impl RuleVerdict {
    /// Verdict with the score derived from `status`.
    pub fn new(ctx: &RuleContext<'_>, status: CriterionStatus, evidence: Vec<EvidenceDraft>) -> Self {
        Self {
            status,
            score: status.points_for(ctx.max_points),
            evidence,
        }
    }

    pub fn met(ctx: &RuleContext<'_>, evidence: Vec<EvidenceDraft>) -> Self {
        Self::new(ctx, CriterionStatus::Met, evidence)
    }

    pub fn partial(ctx: &RuleContext<'_>, evidence: Vec<EvidenceDraft>) -> Self {
        Self::new(ctx, CriterionStatus::Partial, evidence)
    }

    pub fn unmet(ctx: &RuleContext<'_>, evidence: Vec<EvidenceDraft>) -> Self {
        Self::new(ctx, CriterionStatus::Unmet, evidence)
    }

    /// Missing-data verdict: `Unmet` with a single "unavailable" entry.
    pub fn unavailable(ctx: &RuleContext<'_>, category: &str) -> Self {
        Self::unmet(ctx, vec![EvidenceDraft::unavailable(category)])
    }
}

/// A named evaluation strategy.
pub trait Rule: Send + Sync {
    /// Registry key referenced by rubric criteria.
    fn name(&self) -> &'static str;

    /// Reject parameters this rule cannot work with.
    fn validate_params(&self, params: &RuleParams) -> Result<(), RuleError>;

    /// Whether `params` define an explicit partial-credit threshold. A rule
    /// may only return `Partial` when this is true.
    fn allows_partial(&self, params: &RuleParams) -> bool;

    fn evaluate(
        &self,
        ctx: &RuleContext<'_>,
        snapshot: &MetricsSnapshot,
        params: &RuleParams,
    ) -> Result<RuleVerdict, RuleError>;
}

/// Convenience layer for rules whose parameters deserialize into a struct.
///
/// Every `ParamRule` is a [`Rule`]; parameter parsing, validation and the
/// partial-threshold check are derived from the typed parameters.
pub trait ParamRule: Send + Sync {
    type Params: DeserializeOwned;

    const NAME: &'static str;

    /// Semantic checks beyond deserialization (threshold ordering, ranges).
    fn check(params: &Self::Params) -> Result<(), String>;

    fn has_partial(params: &Self::Params) -> bool;

    fn run(
        &self,
        ctx: &RuleContext<'_>,
        snapshot: &MetricsSnapshot,
        params: &Self::Params,
    ) -> Result<RuleVerdict, RuleError>;
}

/// Deserialize rule parameters into their typed form.
pub fn parse_params<T: DeserializeOwned>(params: &RuleParams) -> Result<T, RuleError> {
    serde_json::from_value(serde_json::Value::Object(params.clone()))
        .map_err(|e| RuleError::InvalidParams(e.to_string()))
}

impl<R: ParamRule> Rule for R {
    fn name(&self) -> &'static str {
        R::NAME
    }

    fn validate_params(&self, params: &RuleParams) -> Result<(), RuleError> {
        let typed: R::Params = parse_params(params)?;
        R::check(&typed).map_err(RuleError::InvalidParams)
    }

    fn allows_partial(&self, params: &RuleParams) -> bool {
        parse_params::<R::Params>(params)
            .map(|p| R::has_partial(&p))
            .unwrap_or(false)
    }

    fn evaluate(
        &self,
        ctx: &RuleContext<'_>,
        snapshot: &MetricsSnapshot,
        params: &RuleParams,
    ) -> Result<RuleVerdict, RuleError> {
        let typed: R::Params = parse_params(params)?;
        R::check(&typed).map_err(RuleError::InvalidParams)?;
        self.run(ctx, snapshot, &typed)
    }
}

/// `value >= threshold`, tolerant of float rounding.
pub(crate) fn at_least(value: f64, threshold: f64) -> bool {
    value + THRESHOLD_EPSILON >= threshold
}

/// `value <= threshold`, tolerant of float rounding.
pub(crate) fn at_most(value: f64, threshold: f64) -> bool {
    value - THRESHOLD_EPSILON <= threshold
}

/// Three-way tiering used by most rules: met, else partial (if configured), else unmet.
pub(crate) fn tier(met: bool, partial: Option<bool>) -> CriterionStatus {
    if met {
        CriterionStatus::Met
    } else if partial == Some(true) {
        CriterionStatus::Partial
    } else {
        CriterionStatus::Unmet
    }
}

pub(crate) fn check_ratio(name: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(format!("{name} must be within [0, 1], got {value}"))
    }
}

pub(crate) fn check_percent(name: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(format!("{name} must be within [0, 100], got {value}"))
    }
}

/// Flat name → strategy map.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: BTreeMap<String, Arc<dyn Rule>>,
}

impl RuleRegistry {
    /// A registry with no strategies.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry with every built-in strategy.
    pub fn builtin() -> Self {
        Self::empty()
            .with_rule(LintIssuesRule)
            .with_rule(BuildSuccessRule)
            .with_rule(DependencyAuditRule)
            .with_rule(TestPassRateRule)
            .with_rule(CoverageThresholdRule)
            .with_rule(ReadmeSectionsRule)
            .with_rule(ApiDocCoverageRule)
            .with_rule(ProjectFilesRule)
            .with_rule(MetricThresholdRule)
    }

    /// Register a strategy under its own name, replacing any previous one.
    pub fn register(&mut self, rule: impl Rule + 'static) {
        self.rules.insert(rule.name().to_string(), Arc::new(rule));
    }

    pub fn with_rule(mut self, rule: impl Rule + 'static) -> Self {
        self.register(rule);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Rule>> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}
