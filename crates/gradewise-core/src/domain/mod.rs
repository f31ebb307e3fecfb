//! Domain models for Gradewise.
//!
//! Canonical definitions shared by every component:
//! - `grading`: dimensions, statuses, confidence and letter grades
//! - `snapshot`: the external measurement input
//! - `evidence`: evidence records and the persisted-evidence manifest
//! - `outcome`: per-criterion decisions and the evaluation outcome

pub mod error;
pub mod evidence;
pub mod grading;
pub mod outcome;
pub mod snapshot;

pub use error::{GradewiseError, Result};
pub use evidence::{Evidence, EvidenceDraft, EvidenceManifest, OmittedEvidence, INDEX_KEY};
pub use grading::{
    percentage, points_eq, Confidence, CriterionStatus, Dimension, LetterGrade, POINTS_EPSILON,
};
pub use outcome::{CriterionOutcome, EvaluationOutcome};
pub use snapshot::{
    AuditReport, BuildReport, CoverageReport, DocumentationReport, IssueSeverity, LintIssue,
    LintReport, MetricsSnapshot, SnapshotError, TestReport, VulnerabilitySeverity,
    REQUIRED_SNAPSHOT_KEYS,
};
