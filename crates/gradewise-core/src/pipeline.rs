//! End-to-end grading run: evaluate, persist evidence, publish.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::domain::{EvidenceManifest, MetricsSnapshot, Result};
use crate::evaluator::{Evaluation, RuleEvaluator};
use crate::evidence_store::{EvidenceStore, FsEvidenceStore};
use crate::metrics::METRICS;
use crate::obs;
use crate::publisher::{ScoreOutput, ScorePublisher};
use crate::rubric::{RubricDefinition, RubricLoader};
use crate::rules::RuleRegistry;

/// Engine tuning. Every field has a default, so a partial TOML table works.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Threads used for criterion evaluation.
    pub evaluator_workers: usize,
    /// Concurrent evidence writes.
    pub max_concurrent_writes: usize,
    /// Root directory of the filesystem evidence store.
    pub evidence_root: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            evaluator_workers: RuleEvaluator::DEFAULT_WORKERS,
            max_concurrent_writes: FsEvidenceStore::DEFAULT_MAX_CONCURRENT,
            evidence_root: PathBuf::from("gradewise-evidence"),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(input: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(input)
    }
}

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub evaluation: Evaluation,
    pub manifest: EvidenceManifest,
    pub output: ScoreOutput,
}

#[derive(Debug, Clone)]
pub struct GradingPipeline {
    config: EngineConfig,
    registry: RuleRegistry,
}

impl GradingPipeline {
    /// Pipeline over the built-in rule strategies.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_registry(config, RuleRegistry::builtin())
    }

    pub fn with_registry(config: EngineConfig, registry: RuleRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Loader validating rubrics against this pipeline's strategies.
    pub fn loader(&self) -> RubricLoader {
        RubricLoader::new(self.registry.clone())
    }

    /// Filesystem store rooted at `evidence_root`.
    pub fn fs_store(&self) -> FsEvidenceStore {
        FsEvidenceStore::new(&self.config.evidence_root)
            .with_max_concurrent(self.config.max_concurrent_writes)
    }

    pub fn evaluator(&self) -> RuleEvaluator {
        RuleEvaluator::new(self.registry.clone()).with_workers(self.config.evaluator_workers)
    }

    /// Grade `snapshot` against `rubric`, writing evidence through `store`.
    ///
    /// Evaluation and publish errors abort the run; persistence problems
    /// only show up as warnings on the output.
    pub async fn run(
        &self,
        rubric: &RubricDefinition,
        snapshot: &MetricsSnapshot,
        store: &dyn EvidenceStore,
    ) -> Result<RunReport> {
        let span = obs::run_span(&snapshot.normalized_language());

        let evaluation = span.in_scope(|| {
            self.evaluator()
                .evaluate(rubric, snapshot, &snapshot.language)
        })?;

        let manifest = store
            .persist(&evaluation.evidence)
            .instrument(span.clone())
            .await;

        let output = span.in_scope(|| {
            ScorePublisher::new(rubric).publish(&evaluation.outcome, &manifest)
        })?;
        span.in_scope(|| METRICS.flush());

        Ok(RunReport {
            evaluation,
            manifest,
            output,
        })
    }
}
