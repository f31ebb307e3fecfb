//! `build_success`: the project must build, optionally with a warning budget.

use serde::Deserialize;
use serde_json::json;

use crate::domain::{Confidence, EvidenceDraft, MetricsSnapshot};

use super::{tier, ParamRule, RuleContext, RuleError, RuleVerdict};

/// Longest build output excerpt copied into evidence, in characters.
const MAX_OUTPUT_EXCERPT: usize = 2_000;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSuccessParams {
    /// When set, a successful build with more warnings than this is not `Met`.
    #[serde(default)]
    pub max_warnings: Option<u64>,
    /// Partial when a successful build stays within this many warnings.
    #[serde(default)]
    pub partial_max_warnings: Option<u64>,
}

pub struct BuildSuccessRule;

impl ParamRule for BuildSuccessRule {
    type Params = BuildSuccessParams;

    const NAME: &'static str = "build_success";

    fn check(params: &Self::Params) -> Result<(), String> {
        match (params.max_warnings, params.partial_max_warnings) {
            (None, Some(_)) => {
                Err("partial_max_warnings requires max_warnings to be set".to_string())
            }
            (Some(max), Some(partial)) if partial < max => Err(format!(
                "partial_max_warnings ({partial}) must not be below max_warnings ({max})"
            )),
            _ => Ok(()),
        }
    }

    fn has_partial(params: &Self::Params) -> bool {
        params.partial_max_warnings.is_some()
    }

    fn run(
        &self,
        ctx: &RuleContext<'_>,
        snapshot: &MetricsSnapshot,
        params: &Self::Params,
    ) -> Result<RuleVerdict, RuleError> {
        let Some(build) = &snapshot.build else {
            return Ok(RuleVerdict::unavailable(ctx, "build"));
        };

        let excerpt = build
            .output_excerpt
            .as_deref()
            .map(|out| out.chars().take(MAX_OUTPUT_EXCERPT).collect::<String>());
        let payload = json!({
            "tool": build.tool,
            "success": build.success,
            "warning_count": build.warning_count,
            "max_warnings": params.max_warnings,
            "partial_max_warnings": params.partial_max_warnings,
            "output_excerpt": excerpt,
        });

        if !build.success {
            let evidence = EvidenceDraft::new(
                Confidence::High,
                format!("{} build failed", build.tool),
            )
            .with_payload(payload);
            return Ok(RuleVerdict::unmet(ctx, vec![evidence]));
        }

        let warnings = build.warning_count;
        let status = tier(
            params.max_warnings.map_or(true, |max| warnings <= max),
            params.partial_max_warnings.map(|p| warnings <= p),
        );
        let evidence = EvidenceDraft::new(
            Confidence::High,
            format!(
                "{} build succeeded with {} warning(s)",
                build.tool, warnings
            ),
        )
        .with_payload(payload);

        Ok(RuleVerdict::new(ctx, status, vec![evidence]))
    }
}
