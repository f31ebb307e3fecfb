//! Full pipeline runs where evidence persistence is partly or wholly lost.

use std::path::PathBuf;

use async_trait::async_trait;
use gradewise_core::{
    EngineConfig, Evidence, EvidenceManifest, EvidenceStore, GradingPipeline, MetricsSnapshot,
    OmittedEvidence, RubricDefinition, INDEX_KEY,
};
use serde_json::json;

/// Claims to persist everything except ids for one criterion.
struct LossyStore {
    lose_criterion: &'static str,
}

#[async_trait]
impl EvidenceStore for LossyStore {
    async fn persist(&self, evidence: &[Evidence]) -> EvidenceManifest {
        let mut manifest = EvidenceManifest::empty();
        for item in evidence {
            if item.criterion_id == self.lose_criterion {
                manifest.omitted.push(OmittedEvidence {
                    id: item.id.clone(),
                    reason: "disk full".to_string(),
                });
                manifest
                    .warnings
                    .push(format!("evidence {} omitted: disk full", item.id));
            } else {
                manifest
                    .entries
                    .insert(item.id.clone(), PathBuf::from("/evidence").join(&item.suggested_path));
            }
        }
        manifest
    }
}

/// Never writes anything.
struct NullStore;

#[async_trait]
impl EvidenceStore for NullStore {
    async fn persist(&self, _evidence: &[Evidence]) -> EvidenceManifest {
        EvidenceManifest::empty()
    }
}

fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot::from_value(json!({
        "language": "python",
        "lint": { "tool": "ruff", "error_count": 0, "warning_count": 3 },
        "build": { "tool": "pip", "success": true, "warning_count": 0 },
        "dependency_audit": { "tool": "pip-audit", "medium": 1 },
        "tests": { "framework": "pytest", "total": 40, "passed": 40, "failed": 0 },
        "coverage": { "tool": "coverage.py", "line_percent": 91.0 },
        "documentation": {
            "readme_present": true,
            "readme_sections": ["Installation", "Usage"],
            "documented_items": 9,
            "total_items": 10,
            "has_license": true,
            "has_contributing": false
        }
    }))
    .expect("valid snapshot")
}

#[tokio::test]
async fn lost_evidence_never_changes_the_score() {
    let pipeline = GradingPipeline::new(EngineConfig::default());
    let rubric = RubricDefinition::builtin().expect("builtin rubric");
    let snapshot = snapshot();

    let full = pipeline
        .run(&rubric, &snapshot, &LossyStore { lose_criterion: "" })
        .await
        .expect("run");
    let lossy = pipeline
        .run(&rubric, &snapshot, &LossyStore { lose_criterion: "coverage" })
        .await
        .expect("run");

    assert_eq!(full.output.total_score, lossy.output.total_score);
    assert_eq!(full.output.letter_grade, lossy.output.letter_grade);
    assert_eq!(
        full.output.dimension_breakdowns,
        lossy.output.dimension_breakdowns
    );

    assert!(lossy
        .output
        .evidence_paths
        .keys()
        .all(|id| !id.starts_with("coverage-")));
    for (id, path) in &lossy.output.evidence_paths {
        assert_eq!(lossy.manifest.get(id), Some(path.as_path()));
    }
    assert!(!lossy.output.evidence_paths.contains_key(INDEX_KEY));

    let dropped = lossy
        .evaluation
        .outcome
        .get("coverage")
        .map(|c| c.evidence_ids.len())
        .expect("coverage outcome");
    assert!(lossy
        .output
        .warnings
        .iter()
        .any(|w| w.starts_with(&format!("{dropped} evidence reference(s) dropped"))));
    assert!(lossy.output.human_summary.contains("Warnings:"));
}

#[tokio::test]
async fn empty_manifest_publishes_score_without_paths() {
    let pipeline = GradingPipeline::new(EngineConfig::default());
    let rubric = RubricDefinition::builtin().expect("builtin rubric");

    let report = pipeline
        .run(&rubric, &snapshot(), &NullStore)
        .await
        .expect("run");

    assert!(report.output.evidence_paths.is_empty());
    assert_eq!(report.output.warnings.len(), 1);
    assert!(report.output.warnings[0].contains("manifest is empty"));
    assert!(report.output.total_score > 0.0);
}

#[tokio::test]
async fn filesystem_run_publishes_only_verified_paths() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pipeline = GradingPipeline::new(EngineConfig {
        evidence_root: dir.path().to_path_buf(),
        ..EngineConfig::default()
    });
    let rubric = RubricDefinition::builtin().expect("builtin rubric");

    let report = pipeline
        .run(&rubric, &snapshot(), &pipeline.fs_store())
        .await
        .expect("run");

    assert!(report.output.warnings.is_empty(), "{:?}", report.output.warnings);
    assert!(report.output.evidence_paths.contains_key(INDEX_KEY));
    for path in report.output.evidence_paths.values() {
        assert!(path.starts_with(dir.path()));
        assert!(path.is_file());
    }

    let out = dir.path().join("score.json");
    gradewise_core::write_score_output_json(&out, &report.output).expect("write score");
    let back = gradewise_core::read_score_output_json(&out).expect("read score");
    assert_eq!(back.letter_grade, report.output.letter_grade);
    assert_eq!(back.evidence_paths, report.output.evidence_paths);
    assert_eq!(back.human_summary, report.output.human_summary);
}
