//! Structured events emitted over a grading run.

use gradewise_core::metrics::METRICS;
use gradewise_core::obs::{emit_references_dropped, emit_score_published, RunSpan};
use gradewise_core::{EngineConfig, GradingPipeline, LetterGrade, MetricsSnapshot, RubricDefinition};
use tracing_test::traced_test;

#[traced_test]
#[test]
fn score_published_event_carries_grade() {
    emit_score_published(42.5, 42.5, LetterGrade::F, 3);
    assert!(logs_contain("score.published"));
    assert!(logs_contain("grade=\"F\""));
}

#[traced_test]
#[test]
fn dropped_references_are_listed() {
    let _span = RunSpan::enter("rust");
    emit_references_dropped(&["coverage-01".to_string()]);
    assert!(logs_contain("publish.references_dropped"));
    assert!(logs_contain("coverage-01"));
}

#[traced_test]
#[tokio::test]
async fn pipeline_run_logs_each_stage() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pipeline = GradingPipeline::new(EngineConfig {
        evidence_root: dir.path().to_path_buf(),
        ..EngineConfig::default()
    });
    let rubric = RubricDefinition::builtin().expect("builtin rubric");

    pipeline
        .run(&rubric, &MetricsSnapshot::unavailable("Rust"), &pipeline.fs_store())
        .await
        .expect("run");

    assert!(logs_contain("gradewise.run"));
    assert!(logs_contain("evaluation.started"));
    assert!(logs_contain("criterion.evaluated"));
    assert!(logs_contain("evidence.index_written"));
    assert!(logs_contain("score.published"));
    assert!(logs_contain("metric=\"flush\""));
    assert!(METRICS.criteria_evaluated() >= rubric.criteria.len() as u64);
}
