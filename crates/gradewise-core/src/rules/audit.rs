//! `dependency_audit`: grade on the severity of known dependency vulnerabilities.

use serde::Deserialize;
use serde_json::json;

use crate::domain::{
    Confidence, CriterionStatus, EvidenceDraft, MetricsSnapshot, VulnerabilitySeverity,
};

use super::{ParamRule, RuleContext, RuleError, RuleVerdict};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyAuditParams {
    /// Any vulnerability at or above this severity is `Unmet`.
    #[serde(default = "default_fail_on")]
    pub fail_on: VulnerabilitySeverity,
    /// Vulnerabilities at or above this (but below `fail_on`) give `Partial`.
    #[serde(default)]
    pub partial_on: Option<VulnerabilitySeverity>,
}

fn default_fail_on() -> VulnerabilitySeverity {
    VulnerabilitySeverity::High
}

pub struct DependencyAuditRule;

impl ParamRule for DependencyAuditRule {
    type Params = DependencyAuditParams;

    const NAME: &'static str = "dependency_audit";

    fn check(params: &Self::Params) -> Result<(), String> {
        match params.partial_on {
            Some(partial) if partial >= params.fail_on => Err(format!(
                "partial_on ({partial:?}) must be less severe than fail_on ({:?})",
                params.fail_on
            )),
            _ => Ok(()),
        }
    }

    fn has_partial(params: &Self::Params) -> bool {
        params.partial_on.is_some()
    }

    fn run(
        &self,
        ctx: &RuleContext<'_>,
        snapshot: &MetricsSnapshot,
        params: &Self::Params,
    ) -> Result<RuleVerdict, RuleError> {
        let Some(audit) = &snapshot.dependency_audit else {
            return Ok(RuleVerdict::unavailable(ctx, "dependency audit"));
        };

        let blocking = audit.count_at_or_above(params.fail_on);
        let degrading = params
            .partial_on
            .map(|p| audit.count_at_or_above(p))
            .unwrap_or(0);

        let status = if blocking > 0 {
            CriterionStatus::Unmet
        } else if degrading > 0 {
            CriterionStatus::Partial
        } else {
            CriterionStatus::Met
        };

        let summary = if audit.total() == 0 {
            format!("{} found no known vulnerabilities", audit.tool)
        } else {
            format!(
                "{} found {} critical, {} high, {} medium, {} low vulnerabilities",
                audit.tool, audit.critical, audit.high, audit.medium, audit.low
            )
        };
        let evidence = EvidenceDraft::new(Confidence::High, summary).with_payload(json!({
            "tool": audit.tool,
            "critical": audit.critical,
            "high": audit.high,
            "medium": audit.medium,
            "low": audit.low,
            "fail_on": params.fail_on,
            "partial_on": params.partial_on,
            "blocking": blocking,
        }));

        Ok(RuleVerdict::new(ctx, status, vec![evidence]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AuditReport;
    use crate::rules::test_support::{ctx, params};
    use crate::rules::Rule;

    fn snapshot(critical: u64, high: u64, medium: u64, low: u64) -> MetricsSnapshot {
        let mut s = MetricsSnapshot::unavailable("javascript");
        s.dependency_audit = Some(AuditReport {
            tool: "npm-audit".to_string(),
            critical,
            high,
            medium,
            low,
        });
        s
    }

    #[test]
    fn test_clean_audit_is_met() {
        let verdict = DependencyAuditRule
            .evaluate(&ctx(10.0), &snapshot(0, 0, 0, 0), &params(json!({})))
            .expect("evaluate");
        assert_eq!(verdict.status, CriterionStatus::Met);
    }

    #[test]
    fn test_high_severity_blocks() {
        let verdict = DependencyAuditRule
            .evaluate(&ctx(10.0), &snapshot(0, 1, 0, 0), &params(json!({})))
            .expect("evaluate");
        assert_eq!(verdict.status, CriterionStatus::Unmet);
    }

    #[test]
    fn test_low_medium_only_is_partial() {
        let p = params(json!({ "fail_on": "high", "partial_on": "low" }));
        let verdict = DependencyAuditRule
            .evaluate(&ctx(10.0), &snapshot(0, 0, 2, 3), &p)
            .expect("evaluate");
        assert_eq!(verdict.status, CriterionStatus::Partial);
        assert_eq!(verdict.score, 5.0);
    }

    #[test]
    fn test_low_findings_ignored_without_partial() {
        let verdict = DependencyAuditRule
            .evaluate(&ctx(10.0), &snapshot(0, 0, 0, 7), &params(json!({})))
            .expect("evaluate");
        assert_eq!(verdict.status, CriterionStatus::Met);
    }

    #[test]
    fn test_partial_must_be_below_fail() {
        assert!(DependencyAuditRule
            .validate_params(&params(json!({ "fail_on": "medium", "partial_on": "high" })))
            .is_err());
    }

    #[test]
    fn test_unavailable_audit_is_unmet() {
        let verdict = DependencyAuditRule
            .evaluate(
                &ctx(10.0),
                &MetricsSnapshot::unavailable("go"),
                &params(json!({})),
            )
            .expect("evaluate");
        assert_eq!(verdict.status, CriterionStatus::Unmet);
    }
}
