//! `lint_issues`: grade on the number of issues reported by the linter.

use serde::Deserialize;
use serde_json::json;

use crate::domain::{Confidence, EvidenceDraft, MetricsSnapshot};

use super::{tier, ParamRule, RuleContext, RuleError, RuleVerdict};

/// At most this many individual findings are copied into evidence.
const MAX_ISSUE_EXCERPT: usize = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LintIssuesParams {
    /// Met when the issue count is at or below this.
    #[serde(default)]
    pub max_issues: u64,
    /// Partial when the issue count is at or below this.
    #[serde(default)]
    pub partial_max_issues: Option<u64>,
    /// Count warnings as issues (errors always count).
    #[serde(default = "default_true")]
    pub count_warnings: bool,
}

fn default_true() -> bool {
    true
}

pub struct LintIssuesRule;

impl ParamRule for LintIssuesRule {
    type Params = LintIssuesParams;

    const NAME: &'static str = "lint_issues";

    fn check(params: &Self::Params) -> Result<(), String> {
        match params.partial_max_issues {
            Some(partial) if partial < params.max_issues => Err(format!(
                "partial_max_issues ({partial}) must not be below max_issues ({})",
                params.max_issues
            )),
            _ => Ok(()),
        }
    }

    fn has_partial(params: &Self::Params) -> bool {
        params.partial_max_issues.is_some()
    }

    fn run(
        &self,
        ctx: &RuleContext<'_>,
        snapshot: &MetricsSnapshot,
        params: &Self::Params,
    ) -> Result<RuleVerdict, RuleError> {
        let Some(lint) = &snapshot.lint else {
            return Ok(RuleVerdict::unavailable(ctx, "lint"));
        };

        let issues = if params.count_warnings {
            lint.error_count.saturating_add(lint.warning_count)
        } else {
            lint.error_count
        };

        let status = tier(
            issues <= params.max_issues,
            params.partial_max_issues.map(|p| issues <= p),
        );

        let mut evidence = vec![EvidenceDraft::new(
            Confidence::High,
            format!(
                "{} reported {} issue(s) ({} error(s), {} warning(s)); met at <= {}",
                lint.tool, issues, lint.error_count, lint.warning_count, params.max_issues
            ),
        )
        .with_payload(json!({
            "tool": lint.tool,
            "error_count": lint.error_count,
            "warning_count": lint.warning_count,
            "counted_issues": issues,
            "count_warnings": params.count_warnings,
            "max_issues": params.max_issues,
            "partial_max_issues": params.partial_max_issues,
        }))];

        if !lint.issues.is_empty() {
            let excerpt: Vec<_> = lint.issues.iter().take(MAX_ISSUE_EXCERPT).collect();
            evidence.push(
                EvidenceDraft::new(
                    Confidence::Medium,
                    format!(
                        "first {} of {} recorded lint finding(s)",
                        excerpt.len(),
                        lint.issues.len()
                    ),
                )
                .with_payload(json!({ "issues": excerpt })),
            );
        }

        Ok(RuleVerdict::new(ctx, status, evidence))
    }
}
