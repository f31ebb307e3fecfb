//! `metric_threshold`: graduated credit on any single numeric snapshot field.
//!
//! The specialised rules cover the default rubric. This one lets a rubric
//! author grade any supported metric with a met threshold and an optional
//! partial threshold, in either direction, without writing a new strategy.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{Confidence, EvidenceDraft, MetricsSnapshot};

use super::{at_least, at_most, tier, ParamRule, RuleContext, RuleError, RuleVerdict};

/// Snapshot fields addressable by `metric_threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    /// Errors plus warnings.
    #[serde(rename = "lint.issue_count")]
    LintIssueCount,
    #[serde(rename = "lint.error_count")]
    LintErrorCount,
    #[serde(rename = "lint.warning_count")]
    LintWarningCount,
    #[serde(rename = "build.warning_count")]
    BuildWarningCount,
    #[serde(rename = "dependency_audit.total")]
    AuditTotal,
    /// Ratio in `[0, 1]`.
    #[serde(rename = "tests.pass_rate")]
    TestPassRate,
    #[serde(rename = "tests.total")]
    TestTotal,
    #[serde(rename = "coverage.line_percent")]
    CoverageLinePercent,
    #[serde(rename = "coverage.branch_percent")]
    CoverageBranchPercent,
    /// Ratio in `[0, 1]`.
    #[serde(rename = "documentation.api_doc_ratio")]
    ApiDocRatio,
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::LintIssueCount => "lint.issue_count",
            Metric::LintErrorCount => "lint.error_count",
            Metric::LintWarningCount => "lint.warning_count",
            Metric::BuildWarningCount => "build.warning_count",
            Metric::AuditTotal => "dependency_audit.total",
            Metric::TestPassRate => "tests.pass_rate",
            Metric::TestTotal => "tests.total",
            Metric::CoverageLinePercent => "coverage.line_percent",
            Metric::CoverageBranchPercent => "coverage.branch_percent",
            Metric::ApiDocRatio => "documentation.api_doc_ratio",
        }
    }

    /// Snapshot category the metric is read from.
    pub fn category(self) -> &'static str {
        match self {
            Metric::LintIssueCount | Metric::LintErrorCount | Metric::LintWarningCount => "lint",
            Metric::BuildWarningCount => "build",
            Metric::AuditTotal => "dependency audit",
            Metric::TestPassRate | Metric::TestTotal => "test execution",
            Metric::CoverageLinePercent | Metric::CoverageBranchPercent => "coverage",
            Metric::ApiDocRatio => "documentation",
        }
    }

    /// Read the metric, `None` when its category (or the value) is absent.
    pub fn read(self, snapshot: &MetricsSnapshot) -> Option<f64> {
        match self {
            Metric::LintIssueCount => snapshot
                .lint
                .as_ref()
                .map(|l| l.error_count.saturating_add(l.warning_count) as f64),
            Metric::LintErrorCount => snapshot.lint.as_ref().map(|l| l.error_count as f64),
            Metric::LintWarningCount => snapshot.lint.as_ref().map(|l| l.warning_count as f64),
            Metric::BuildWarningCount => snapshot.build.as_ref().map(|b| b.warning_count as f64),
            Metric::AuditTotal => snapshot.dependency_audit.as_ref().map(|a| a.total() as f64),
            Metric::TestPassRate => snapshot.tests.as_ref().and_then(|t| t.pass_rate()),
            Metric::TestTotal => snapshot.tests.as_ref().map(|t| t.total as f64),
            Metric::CoverageLinePercent => snapshot.coverage.as_ref().map(|c| c.line_percent),
            Metric::CoverageBranchPercent => {
                snapshot.coverage.as_ref().and_then(|c| c.branch_percent)
            }
            Metric::ApiDocRatio => snapshot
                .documentation
                .as_ref()
                .and_then(|d| d.api_doc_ratio()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Higher is better.
    #[default]
    AtLeast,
    /// Lower is better.
    AtMost,
}

impl Direction {
    fn passes(self, value: f64, threshold: f64) -> bool {
        match self {
            Direction::AtLeast => at_least(value, threshold),
            Direction::AtMost => at_most(value, threshold),
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Direction::AtLeast => ">=",
            Direction::AtMost => "<=",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricThresholdParams {
    pub metric: Metric,
    #[serde(default)]
    pub direction: Direction,
    pub met: f64,
    #[serde(default)]
    pub partial: Option<f64>,
}

pub struct MetricThresholdRule;

impl ParamRule for MetricThresholdRule {
    type Params = MetricThresholdParams;

    const NAME: &'static str = "metric_threshold";

    fn check(params: &Self::Params) -> Result<(), String> {
        if !params.met.is_finite() {
            return Err(format!("met must be finite, got {}", params.met));
        }
        let Some(partial) = params.partial else {
            return Ok(());
        };
        if !partial.is_finite() {
            return Err(format!("partial must be finite, got {partial}"));
        }
        let ordered = match params.direction {
            Direction::AtLeast => partial <= params.met,
            Direction::AtMost => partial >= params.met,
        };
        if ordered {
            Ok(())
        } else {
            Err(format!(
                "partial ({partial}) is stricter than met ({}) for direction {:?}",
                params.met, params.direction
            ))
        }
    }

    fn has_partial(params: &Self::Params) -> bool {
        params.partial.is_some()
    }

    fn run(
        &self,
        ctx: &RuleContext<'_>,
        snapshot: &MetricsSnapshot,
        params: &Self::Params,
    ) -> Result<RuleVerdict, RuleError> {
        let Some(value) = params.metric.read(snapshot) else {
            return Ok(RuleVerdict::unavailable(ctx, params.metric.category()));
        };

        let status = tier(
            params.direction.passes(value, params.met),
            params.partial.map(|p| params.direction.passes(value, p)),
        );
        let evidence = EvidenceDraft::new(
            Confidence::High,
            format!(
                "{} = {}; met at {} {}",
                params.metric.as_str(),
                value,
                params.direction.symbol(),
                params.met
            ),
        )
        .with_payload(json!({
            "metric": params.metric,
            "value": value,
            "direction": params.direction,
            "met": params.met,
            "partial": params.partial,
        }));

        Ok(RuleVerdict::new(ctx, status, vec![evidence]))
    }
}
