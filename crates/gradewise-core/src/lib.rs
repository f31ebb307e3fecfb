//! Gradewise Core Library
//!
//! Rubric-driven code-quality scoring: load a rubric, evaluate a metrics
//! snapshot against it, persist the evidence and publish a reconciled score.

pub mod domain;
pub mod evaluator;
pub mod evidence_store;
pub mod metrics;
pub mod obs;
pub mod pipeline;
pub mod publisher;
pub mod reporting;
pub mod rubric;
pub mod rules;
pub mod telemetry;

pub use domain::{
    percentage, Confidence, CriterionOutcome, CriterionStatus, Dimension, EvaluationOutcome,
    Evidence, EvidenceDraft, EvidenceManifest, GradewiseError, LetterGrade, MetricsSnapshot,
    OmittedEvidence, Result, SnapshotError, INDEX_KEY,
};

pub use evaluator::{check_evidence_references, Evaluation, EvaluationError, RuleEvaluator};

pub use evidence_store::{
    read_evidence_record, verify_manifest, EvidenceIndex, EvidenceRecord, EvidenceStore,
    FsEvidenceStore, PersistResult, StoreError,
};

pub use pipeline::{EngineConfig, GradingPipeline, RunReport};

pub use publisher::{render_summary, DimensionBreakdown, PublishError, ScoreOutput, ScorePublisher};

pub use reporting::{read_score_output_json, write_human_summary, write_score_output_json};

pub use rubric::{
    Criterion, RubricConfigError, RubricDefinition, RubricLoader, ValidationIssue,
    RUBRIC_TOTAL_POINTS,
};

pub use rules::{Rule, RuleRegistry, RuleVerdict};

pub use telemetry::init_tracing;

/// Gradewise version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
