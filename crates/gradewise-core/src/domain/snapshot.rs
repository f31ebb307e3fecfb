//! The measurement snapshot handed over by the metrics-collection pipeline.
//!
//! Every tool category is independently nullable: `None` means the tool was
//! unavailable, which is distinct from a tool that ran and reported failures.
//! The category keys themselves are required in the JSON document; a missing
//! key is a structural input error.

use serde::{Deserialize, Serialize};

/// Keys that must be present (possibly `null`) in a snapshot document.
pub const REQUIRED_SNAPSHOT_KEYS: &[&str] = &[
    "language",
    "lint",
    "build",
    "dependency_audit",
    "tests",
    "coverage",
    "documentation",
];

/// Structural problems with a snapshot. Always fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot must be a JSON object")]
    NotAnObject,

    #[error("snapshot is missing required key: {key}")]
    MissingKey { key: String },

    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("snapshot language must not be empty")]
    EmptyLanguage,

    #[error(
        "test counts are inconsistent: passed {passed} + failed {failed} + skipped {skipped} > total {total}"
    )]
    InconsistentTestCounts {
        passed: u64,
        failed: u64,
        skipped: u64,
        total: u64,
    },

    #[error("{field} must be a finite percentage in [0, 100], got {value}")]
    InvalidPercentage { field: &'static str, value: f64 },

    #[error("documented items ({documented}) exceed total items ({total})")]
    DocumentedExceedsTotal { documented: u64, total: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Error,
    Warning,
    Info,
}

/// A single linter finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintIssue {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub rule: Option<String>,
    pub message: String,
    pub severity: IssueSeverity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintReport {
    pub tool: String,
    pub error_count: u64,
    pub warning_count: u64,
    /// Optional excerpt of individual findings.
    #[serde(default)]
    pub issues: Vec<LintIssue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub tool: String,
    pub success: bool,
    #[serde(default)]
    pub warning_count: u64,
    #[serde(default)]
    pub output_excerpt: Option<String>,
}

/// Vulnerability severity reported by a dependency audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VulnerabilitySeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub tool: String,
    #[serde(default)]
    pub critical: u64,
    #[serde(default)]
    pub high: u64,
    #[serde(default)]
    pub medium: u64,
    #[serde(default)]
    pub low: u64,
}

impl AuditReport {
    pub fn count(&self, severity: VulnerabilitySeverity) -> u64 {
        match severity {
            VulnerabilitySeverity::Low => self.low,
            VulnerabilitySeverity::Medium => self.medium,
            VulnerabilitySeverity::High => self.high,
            VulnerabilitySeverity::Critical => self.critical,
        }
    }

    /// Number of vulnerabilities at `severity` or worse.
    pub fn count_at_or_above(&self, severity: VulnerabilitySeverity) -> u64 {
        [
            VulnerabilitySeverity::Low,
            VulnerabilitySeverity::Medium,
            VulnerabilitySeverity::High,
            VulnerabilitySeverity::Critical,
        ]
        .into_iter()
        .filter(|s| *s >= severity)
        .map(|s| self.count(s))
        .sum()
    }

    pub fn total(&self) -> u64 {
        self.count_at_or_above(VulnerabilitySeverity::Low)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestReport {
    pub framework: String,
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    #[serde(default)]
    pub skipped: u64,
}

impl TestReport {
    /// `passed / total`, or `None` when no tests were collected.
    pub fn pass_rate(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.passed as f64 / self.total as f64)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub tool: String,
    pub line_percent: f64,
    #[serde(default)]
    pub branch_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationReport {
    pub readme_present: bool,
    #[serde(default)]
    pub readme_sections: Vec<String>,
    pub documented_items: u64,
    pub total_items: u64,
    #[serde(default)]
    pub has_license: bool,
    #[serde(default)]
    pub has_contributing: bool,
    #[serde(default)]
    pub has_changelog: bool,
}

impl DocumentationReport {
    /// `documented_items / total_items`, or `None` when there are no public items.
    pub fn api_doc_ratio(&self) -> Option<f64> {
        if self.total_items == 0 {
            None
        } else {
            Some(self.documented_items as f64 / self.total_items as f64)
        }
    }
}

/// Immutable, possibly partial record of one repository's measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Language tag used to select rubric overrides.
    pub language: String,
    pub lint: Option<LintReport>,
    pub build: Option<BuildReport>,
    pub dependency_audit: Option<AuditReport>,
    pub tests: Option<TestReport>,
    pub coverage: Option<CoverageReport>,
    pub documentation: Option<DocumentationReport>,
}

impl MetricsSnapshot {
    /// A snapshot where every tool was unavailable.
    pub fn unavailable(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            lint: None,
            build: None,
            dependency_audit: None,
            tests: None,
            coverage: None,
            documentation: None,
        }
    }

    /// Parse and structurally validate a snapshot document.
    pub fn from_json_str(input: &str) -> Result<Self, SnapshotError> {
        let value: serde_json::Value = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    /// Validate required keys, deserialize, then run [`MetricsSnapshot::validate`].
    pub fn from_value(value: serde_json::Value) -> Result<Self, SnapshotError> {
        let obj = value.as_object().ok_or(SnapshotError::NotAnObject)?;
        for key in REQUIRED_SNAPSHOT_KEYS {
            if !obj.contains_key(*key) {
                return Err(SnapshotError::MissingKey {
                    key: (*key).to_string(),
                });
            }
        }
        let snapshot: MetricsSnapshot = serde_json::from_value(value)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Semantic checks that a well-typed snapshot must also satisfy.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.language.trim().is_empty() {
            return Err(SnapshotError::EmptyLanguage);
        }

        if let Some(tests) = &self.tests {
            let accounted = tests
                .passed
                .saturating_add(tests.failed)
                .saturating_add(tests.skipped);
            if accounted > tests.total {
                return Err(SnapshotError::InconsistentTestCounts {
                    passed: tests.passed,
                    failed: tests.failed,
                    skipped: tests.skipped,
                    total: tests.total,
                });
            }
        }

        if let Some(coverage) = &self.coverage {
            check_percent("coverage.line_percent", coverage.line_percent)?;
            if let Some(branch) = coverage.branch_percent {
                check_percent("coverage.branch_percent", branch)?;
            }
        }

        if let Some(docs) = &self.documentation {
            if docs.documented_items > docs.total_items {
                return Err(SnapshotError::DocumentedExceedsTotal {
                    documented: docs.documented_items,
                    total: docs.total_items,
                });
            }
        }

        Ok(())
    }

    /// Lowercased language tag used for override lookup.
    pub fn normalized_language(&self) -> String {
        self.language.trim().to_ascii_lowercase()
    }
}

fn check_percent(field: &'static str, value: f64) -> Result<(), SnapshotError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(SnapshotError::InvalidPercentage { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_document() -> serde_json::Value {
        json!({
            "language": "Rust",
            "lint": { "tool": "clippy", "error_count": 0, "warning_count": 2 },
            "build": { "tool": "cargo", "success": true },
            "dependency_audit": { "tool": "cargo-audit", "high": 1 },
            "tests": { "framework": "cargo-test", "total": 10, "passed": 8, "failed": 2 },
            "coverage": null,
            "documentation": {
                "readme_present": true,
                "readme_sections": ["Installation"],
                "documented_items": 3,
                "total_items": 4
            }
        })
    }

    #[test]
    fn test_parse_full_document() {
        let snapshot = MetricsSnapshot::from_value(full_document()).expect("valid snapshot");
        assert_eq!(snapshot.normalized_language(), "rust");
        assert!(snapshot.coverage.is_none());
        assert_eq!(snapshot.tests.as_ref().and_then(TestReport::pass_rate), Some(0.8));
        assert_eq!(snapshot.dependency_audit.as_ref().map(AuditReport::total), Some(1));
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let mut doc = full_document();
        doc.as_object_mut().expect("object").remove("coverage");
        match MetricsSnapshot::from_value(doc) {
            Err(SnapshotError::MissingKey { key }) => assert_eq!(key, "coverage"),
            other => panic!("expected MissingKey, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_type_is_malformed() {
        let mut doc = full_document();
        doc["tests"] = json!("eight of ten");
        assert!(matches!(
            MetricsSnapshot::from_value(doc),
            Err(SnapshotError::Malformed(_))
        ));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(
            MetricsSnapshot::from_json_str("[1, 2, 3]"),
            Err(SnapshotError::NotAnObject)
        ));
    }

    #[test]
    fn test_inconsistent_test_counts() {
        let mut doc = full_document();
        doc["tests"] = json!({ "framework": "pytest", "total": 3, "passed": 3, "failed": 1 });
        assert!(matches!(
            MetricsSnapshot::from_value(doc),
            Err(SnapshotError::InconsistentTestCounts { .. })
        ));
    }

    #[test]
    fn test_out_of_range_coverage() {
        let mut doc = full_document();
        doc["coverage"] = json!({ "tool": "tarpaulin", "line_percent": 140.0 });
        assert!(matches!(
            MetricsSnapshot::from_value(doc),
            Err(SnapshotError::InvalidPercentage { .. })
        ));
    }

    #[test]
    fn test_empty_language_rejected() {
        let snapshot = MetricsSnapshot::unavailable("  ");
        assert!(matches!(snapshot.validate(), Err(SnapshotError::EmptyLanguage)));
    }

    #[test]
    fn test_audit_counts_by_severity() {
        let audit = AuditReport {
            tool: "npm-audit".to_string(),
            critical: 1,
            high: 2,
            medium: 3,
            low: 4,
        };
        assert_eq!(audit.count_at_or_above(VulnerabilitySeverity::High), 3);
        assert_eq!(audit.count_at_or_above(VulnerabilitySeverity::Medium), 6);
        assert_eq!(audit.total(), 10);
    }

    #[test]
    fn test_zero_tests_has_no_pass_rate() {
        let report = TestReport {
            framework: "jest".to_string(),
            total: 0,
            passed: 0,
            failed: 0,
            skipped: 0,
        };
        assert!(report.pass_rate().is_none());
    }
}
