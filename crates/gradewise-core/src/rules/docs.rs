//! Documentation strategies: README content, API doc coverage and
//! conventional project files.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{Confidence, DocumentationReport, EvidenceDraft, MetricsSnapshot};

use super::{at_least, check_ratio, tier, ParamRule, RuleContext, RuleError, RuleVerdict};

fn normalize(heading: &str) -> String {
    heading.trim().to_ascii_lowercase()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadmeSectionsParams {
    /// Section headings that must appear (case-insensitive substring match).
    #[serde(default)]
    pub required_sections: Vec<String>,
    /// Partial when at least this many required sections are present.
    #[serde(default)]
    pub partial_min_sections: Option<usize>,
}

/// `readme_sections`: a README must exist and cover the required sections.
pub struct ReadmeSectionsRule;

impl ParamRule for ReadmeSectionsRule {
    type Params = ReadmeSectionsParams;

    const NAME: &'static str = "readme_sections";

    fn check(params: &Self::Params) -> Result<(), String> {
        if params.required_sections.iter().any(|s| s.trim().is_empty()) {
            return Err("required_sections must not contain empty names".to_string());
        }
        match params.partial_min_sections {
            Some(p) if p > params.required_sections.len() => Err(format!(
                "partial_min_sections ({p}) exceeds the {} required section(s)",
                params.required_sections.len()
            )),
            _ => Ok(()),
        }
    }

    fn has_partial(params: &Self::Params) -> bool {
        params.partial_min_sections.is_some()
    }

    fn run(
        &self,
        ctx: &RuleContext<'_>,
        snapshot: &MetricsSnapshot,
        params: &Self::Params,
    ) -> Result<RuleVerdict, RuleError> {
        let Some(docs) = &snapshot.documentation else {
            return Ok(RuleVerdict::unavailable(ctx, "documentation"));
        };

        if !docs.readme_present {
            let evidence = EvidenceDraft::new(Confidence::High, "no README found")
                .with_payload(json!({ "readme_present": false }));
            return Ok(RuleVerdict::unmet(ctx, vec![evidence]));
        }

        let headings: Vec<String> = docs.readme_sections.iter().map(|h| normalize(h)).collect();
        let (found, missing): (Vec<&String>, Vec<&String>) =
            params.required_sections.iter().partition(|required| {
                let needle = normalize(required);
                headings.iter().any(|h| h.contains(&needle))
            });

        let status = tier(
            missing.is_empty(),
            params.partial_min_sections.map(|p| found.len() >= p),
        );
        let evidence = EvidenceDraft::new(
            Confidence::Medium,
            format!(
                "README covers {} of {} required section(s)",
                found.len(),
                params.required_sections.len()
            ),
        )
        .with_payload(json!({
            "sections": docs.readme_sections,
            "found": found,
            "missing": missing,
            "partial_min_sections": params.partial_min_sections,
        }));

        Ok(RuleVerdict::new(ctx, status, vec![evidence]))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiDocCoverageParams {
    /// Met when `documented_items / total_items` is at least this.
    pub min_ratio: f64,
    #[serde(default)]
    pub partial_min_ratio: Option<f64>,
}

/// `api_doc_coverage`: share of public items carrying doc comments.
///
/// A project with no public items has nothing left undocumented and is
/// `Met`, with low confidence.
pub struct ApiDocCoverageRule;

impl ParamRule for ApiDocCoverageRule {
    type Params = ApiDocCoverageParams;

    const NAME: &'static str = "api_doc_coverage";

    fn check(params: &Self::Params) -> Result<(), String> {
        check_ratio("min_ratio", params.min_ratio)?;
        if let Some(partial) = params.partial_min_ratio {
            check_ratio("partial_min_ratio", partial)?;
            if partial > params.min_ratio {
                return Err(format!(
                    "partial_min_ratio ({partial}) must not exceed min_ratio ({})",
                    params.min_ratio
                ));
            }
        }
        Ok(())
    }

    fn has_partial(params: &Self::Params) -> bool {
        params.partial_min_ratio.is_some()
    }

    fn run(
        &self,
        ctx: &RuleContext<'_>,
        snapshot: &MetricsSnapshot,
        params: &Self::Params,
    ) -> Result<RuleVerdict, RuleError> {
        let Some(docs) = &snapshot.documentation else {
            return Ok(RuleVerdict::unavailable(ctx, "documentation"));
        };

        let payload = json!({
            "documented_items": docs.documented_items,
            "total_items": docs.total_items,
            "min_ratio": params.min_ratio,
            "partial_min_ratio": params.partial_min_ratio,
        });

        let Some(ratio) = docs.api_doc_ratio() else {
            let evidence =
                EvidenceDraft::new(Confidence::Low, "no public items found to document")
                    .with_payload(payload);
            return Ok(RuleVerdict::met(ctx, vec![evidence]));
        };

        let status = tier(
            at_least(ratio, params.min_ratio),
            params.partial_min_ratio.map(|p| at_least(ratio, p)),
        );
        let evidence = EvidenceDraft::new(
            Confidence::Medium,
            format!(
                "{}/{} public items documented ({:.1}%)",
                docs.documented_items,
                docs.total_items,
                ratio * 100.0
            ),
        )
        .with_payload(payload);

        Ok(RuleVerdict::new(ctx, status, vec![evidence]))
    }
}

/// Conventional top-level project files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectFile {
    License,
    Contributing,
    Changelog,
}

impl ProjectFile {
    fn present_in(self, docs: &DocumentationReport) -> bool {
        match self {
            ProjectFile::License => docs.has_license,
            ProjectFile::Contributing => docs.has_contributing,
            ProjectFile::Changelog => docs.has_changelog,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectFilesParams {
    pub required: Vec<ProjectFile>,
    /// Partial when at least this many of `required` are present.
    #[serde(default)]
    pub partial_min_present: Option<usize>,
}

/// `project_files`: LICENSE / CONTRIBUTING / CHANGELOG presence.
pub struct ProjectFilesRule;

impl ParamRule for ProjectFilesRule {
    type Params = ProjectFilesParams;

    const NAME: &'static str = "project_files";

    fn check(params: &Self::Params) -> Result<(), String> {
        if params.required.is_empty() {
            return Err("required must list at least one project file".to_string());
        }
        match params.partial_min_present {
            Some(p) if p == 0 || p >= params.required.len() => Err(format!(
                "partial_min_present ({p}) must be between 1 and {}",
                params.required.len() - 1
            )),
            _ => Ok(()),
        }
    }

    fn has_partial(params: &Self::Params) -> bool {
        params.partial_min_present.is_some()
    }

    fn run(
        &self,
        ctx: &RuleContext<'_>,
        snapshot: &MetricsSnapshot,
        params: &Self::Params,
    ) -> Result<RuleVerdict, RuleError> {
        let Some(docs) = &snapshot.documentation else {
            return Ok(RuleVerdict::unavailable(ctx, "documentation"));
        };

        let (present, missing): (Vec<ProjectFile>, Vec<ProjectFile>) =
            params.required.iter().partition(|f| f.present_in(docs));

        let status = tier(
            missing.is_empty(),
            params.partial_min_present.map(|p| present.len() >= p),
        );
        let evidence = EvidenceDraft::new(
            Confidence::High,
            format!(
                "{} of {} required project file(s) present",
                present.len(),
                params.required.len()
            ),
        )
        .with_payload(json!({ "present": present, "missing": missing }));

        Ok(RuleVerdict::new(ctx, status, vec![evidence]))
    }
}
