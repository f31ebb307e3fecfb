//! Test execution and coverage strategies.

use serde::Deserialize;
use serde_json::json;

use crate::domain::{Confidence, EvidenceDraft, MetricsSnapshot};

use super::{
    at_least, check_percent, check_ratio, tier, ParamRule, RuleContext, RuleError, RuleVerdict,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestPassRateParams {
    /// Met when `passed / total` is at least this.
    #[serde(default = "default_min_pass_rate")]
    pub min_pass_rate: f64,
    /// Partial when `passed / total` is at least this.
    #[serde(default)]
    pub partial_min_pass_rate: Option<f64>,
    /// Fewer collected tests than this is `Unmet`.
    #[serde(default = "default_min_tests")]
    pub min_tests: u64,
}

fn default_min_pass_rate() -> f64 {
    1.0
}

fn default_min_tests() -> u64 {
    1
}

/// `test_pass_rate`: grade on the share of collected tests that passed.
pub struct TestPassRateRule;

impl ParamRule for TestPassRateRule {
    type Params = TestPassRateParams;

    const NAME: &'static str = "test_pass_rate";

    fn check(params: &Self::Params) -> Result<(), String> {
        check_ratio("min_pass_rate", params.min_pass_rate)?;
        if let Some(partial) = params.partial_min_pass_rate {
            check_ratio("partial_min_pass_rate", partial)?;
            if partial > params.min_pass_rate {
                return Err(format!(
                    "partial_min_pass_rate ({partial}) must not exceed min_pass_rate ({})",
                    params.min_pass_rate
                ));
            }
        }
        Ok(())
    }

    fn has_partial(params: &Self::Params) -> bool {
        params.partial_min_pass_rate.is_some()
    }

    fn run(
        &self,
        ctx: &RuleContext<'_>,
        snapshot: &MetricsSnapshot,
        params: &Self::Params,
    ) -> Result<RuleVerdict, RuleError> {
        let Some(tests) = &snapshot.tests else {
            return Ok(RuleVerdict::unavailable(ctx, "test execution"));
        };

        let payload = json!({
            "framework": tests.framework,
            "total": tests.total,
            "passed": tests.passed,
            "failed": tests.failed,
            "skipped": tests.skipped,
            "min_pass_rate": params.min_pass_rate,
            "partial_min_pass_rate": params.partial_min_pass_rate,
            "min_tests": params.min_tests,
        });

        let rate = match tests.pass_rate() {
            Some(rate) if tests.total >= params.min_tests => rate,
            _ => {
                let evidence = EvidenceDraft::new(
                    Confidence::High,
                    format!(
                        "{} collected {} test(s); at least {} required",
                        tests.framework, tests.total, params.min_tests
                    ),
                )
                .with_payload(payload);
                return Ok(RuleVerdict::unmet(ctx, vec![evidence]));
            }
        };

        let status = tier(
            at_least(rate, params.min_pass_rate),
            params.partial_min_pass_rate.map(|p| at_least(rate, p)),
        );
        let evidence = EvidenceDraft::new(
            Confidence::High,
            format!(
                "{}: {}/{} tests passed ({:.1}%)",
                tests.framework,
                tests.passed,
                tests.total,
                rate * 100.0
            ),
        )
        .with_payload(payload);

        Ok(RuleVerdict::new(ctx, status, vec![evidence]))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoverageThresholdParams {
    /// Met when line coverage is at least this percentage.
    pub min_percent: f64,
    /// Partial when line coverage is at least this percentage.
    #[serde(default)]
    pub partial_min_percent: Option<f64>,
}

/// `coverage_threshold`: grade on line coverage percentage.
pub struct CoverageThresholdRule;

impl ParamRule for CoverageThresholdRule {
    type Params = CoverageThresholdParams;

    const NAME: &'static str = "coverage_threshold";

    fn check(params: &Self::Params) -> Result<(), String> {
        check_percent("min_percent", params.min_percent)?;
        if let Some(partial) = params.partial_min_percent {
            check_percent("partial_min_percent", partial)?;
            if partial > params.min_percent {
                return Err(format!(
                    "partial_min_percent ({partial}) must not exceed min_percent ({})",
                    params.min_percent
                ));
            }
        }
        Ok(())
    }

    fn has_partial(params: &Self::Params) -> bool {
        params.partial_min_percent.is_some()
    }

    fn run(
        &self,
        ctx: &RuleContext<'_>,
        snapshot: &MetricsSnapshot,
        params: &Self::Params,
    ) -> Result<RuleVerdict, RuleError> {
        let Some(coverage) = &snapshot.coverage else {
            return Ok(RuleVerdict::unavailable(ctx, "coverage"));
        };

        let line = coverage.line_percent;
        let status = tier(
            at_least(line, params.min_percent),
            params.partial_min_percent.map(|p| at_least(line, p)),
        );
        let evidence = EvidenceDraft::new(
            Confidence::High,
            format!(
                "{} measured {:.1}% line coverage; met at >= {:.1}%",
                coverage.tool, line, params.min_percent
            ),
        )
        .with_payload(json!({
            "tool": coverage.tool,
            "line_percent": line,
            "branch_percent": coverage.branch_percent,
            "min_percent": params.min_percent,
            "partial_min_percent": params.partial_min_percent,
        }));

        Ok(RuleVerdict::new(ctx, status, vec![evidence]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CoverageReport, CriterionStatus, TestReport};
    use crate::rules::test_support::{ctx, params};
    use crate::rules::Rule;

    fn with_tests(total: u64, passed: u64) -> MetricsSnapshot {
        let mut s = MetricsSnapshot::unavailable("python");
        s.tests = Some(TestReport {
            framework: "pytest".to_string(),
            total,
            passed,
            failed: total - passed,
            skipped: 0,
        });
        s
    }

    fn with_coverage(line_percent: f64) -> MetricsSnapshot {
        let mut s = MetricsSnapshot::unavailable("python");
        s.coverage = Some(CoverageReport {
            tool: "coverage.py".to_string(),
            line_percent,
            branch_percent: None,
        });
        s
    }

    #[test]
    fn test_all_passing_is_met() {
        let verdict = TestPassRateRule
            .evaluate(&ctx(25.0), &with_tests(10, 10), &params(json!({})))
            .expect("evaluate");
        assert_eq!(verdict.status, CriterionStatus::Met);
    }

    #[test]
    fn test_eight_of_ten_with_half_threshold_is_partial() {
        let p = params(json!({ "min_pass_rate": 1.0, "partial_min_pass_rate": 0.5 }));
        let verdict = TestPassRateRule
            .evaluate(&ctx(25.0), &with_tests(10, 8), &p)
            .expect("evaluate");
        assert_eq!(verdict.status, CriterionStatus::Partial);
        assert_eq!(verdict.score, 12.5);
        assert!(verdict.evidence[0].summary.contains("8/10"));
    }

    #[test]
    fn test_below_partial_is_unmet() {
        let p = params(json!({ "min_pass_rate": 1.0, "partial_min_pass_rate": 0.5 }));
        let verdict = TestPassRateRule
            .evaluate(&ctx(25.0), &with_tests(10, 4), &p)
            .expect("evaluate");
        assert_eq!(verdict.status, CriterionStatus::Unmet);
    }

    #[test]
    fn test_no_tests_collected_is_unmet() {
        let verdict = TestPassRateRule
            .evaluate(&ctx(25.0), &with_tests(0, 0), &params(json!({})))
            .expect("evaluate");
        assert_eq!(verdict.status, CriterionStatus::Unmet);
        assert_eq!(verdict.evidence[0].confidence, Confidence::High);
    }

    #[test]
    fn test_min_tests_enforced() {
        let verdict = TestPassRateRule
            .evaluate(&ctx(25.0), &with_tests(3, 3), &params(json!({ "min_tests": 5 })))
            .expect("evaluate");
        assert_eq!(verdict.status, CriterionStatus::Unmet);
    }

    #[test]
    fn test_coverage_tiers() {
        let p = params(json!({ "min_percent": 80.0, "partial_min_percent": 50.0 }));
        let status = |line| {
            CoverageThresholdRule
                .evaluate(&ctx(15.0), &with_coverage(line), &p)
                .expect("evaluate")
                .status
        };
        assert_eq!(status(85.0), CriterionStatus::Met);
        assert_eq!(status(80.0), CriterionStatus::Met);
        assert_eq!(status(60.0), CriterionStatus::Partial);
        assert_eq!(status(10.0), CriterionStatus::Unmet);
    }

    #[test]
    fn test_coverage_requires_min_percent() {
        assert!(CoverageThresholdRule.validate_params(&params(json!({}))).is_err());
        assert!(CoverageThresholdRule
            .validate_params(&params(json!({ "min_percent": 120.0 })))
            .is_err());
    }

    #[test]
    fn test_unavailable_tests_and_coverage() {
        let empty = MetricsSnapshot::unavailable("python");
        let tests = TestPassRateRule
            .evaluate(&ctx(25.0), &empty, &params(json!({})))
            .expect("evaluate");
        let coverage = CoverageThresholdRule
            .evaluate(&ctx(15.0), &empty, &params(json!({ "min_percent": 70.0 })))
            .expect("evaluate");
        assert_eq!(tests.status, CriterionStatus::Unmet);
        assert_eq!(coverage.status, CriterionStatus::Unmet);
    }
}
