//! Evidence records and the manifest of what was actually persisted.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::grading::{Confidence, Dimension};

/// Manifest key reserved for the aggregate evidence index file.
pub const INDEX_KEY: &str = "evidence_index";

/// Justification recorded for a criterion outcome.
///
/// Created by the evaluator, written by an evidence store and only ever
/// referenced (by id) from published scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Unique within a run: `<criterion_id>-<nn>`.
    pub id: String,
    pub criterion_id: String,
    pub dimension: Dimension,
    pub confidence: Confidence,
    pub summary: String,
    /// Structured detail, e.g. an excerpt of raw tool output.
    pub payload: serde_json::Value,
    /// Where the store should persist this item, relative to its root.
    pub suggested_path: PathBuf,
}

impl Evidence {
    /// Build the evidence id for the `seq`-th (1-based) item of a criterion.
    pub fn make_id(criterion_id: &str, seq: usize) -> String {
        format!("{criterion_id}-{seq:02}")
    }

    /// Default relative location: `<dimension>/<criterion_id>/<id>.json`.
    pub fn default_path(dimension: Dimension, criterion_id: &str, id: &str) -> PathBuf {
        Path::new(dimension.key())
            .join(criterion_id)
            .join(format!("{id}.json"))
    }
}

/// Evidence as produced by a rule, before the evaluator assigns identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceDraft {
    pub confidence: Confidence,
    pub summary: String,
    pub payload: serde_json::Value,
}

impl EvidenceDraft {
    pub fn new(confidence: Confidence, summary: impl Into<String>) -> Self {
        Self {
            confidence,
            summary: summary.into(),
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Standard entry recorded when the tool a rule depends on was unavailable.
    pub fn unavailable(category: &str) -> Self {
        Self::new(
            Confidence::Low,
            format!("{category} data unavailable: tool did not run or produced no result"),
        )
        .with_payload(serde_json::json!({ "unavailable": category }))
    }
}

/// An evidence item the store could not persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmittedEvidence {
    pub id: String,
    pub reason: String,
}

/// Authoritative map of evidence that was written *and* verified readable.
///
/// Produced once per run by an evidence store. An id absent from `entries`
/// must be treated as never written, whatever path was suggested for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceManifest {
    /// Evidence id (or [`INDEX_KEY`]) → path on disk.
    pub entries: BTreeMap<String, PathBuf>,
    /// Location of the aggregate index, when it was written successfully.
    pub index_path: Option<PathBuf>,
    /// Items dropped during persistence, with the reason.
    pub omitted: Vec<OmittedEvidence>,
    /// Non-fatal persistence warnings.
    pub warnings: Vec<String>,
}

impl EvidenceManifest {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Path> {
        self.entries.get(id).map(PathBuf::as_path)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries, index included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of evidence entries, index excluded.
    pub fn evidence_count(&self) -> usize {
        self.entries.keys().filter(|k| k.as_str() != INDEX_KEY).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evidence_id_and_path_layout() {
        let id = Evidence::make_id("lint_clean", 1);
        assert_eq!(id, "lint_clean-01");
        let path = Evidence::default_path(Dimension::CodeQuality, "lint_clean", &id);
        assert_eq!(path, PathBuf::from("code_quality/lint_clean/lint_clean-01.json"));
    }

    #[test]
    fn test_unavailable_draft_is_low_confidence() {
        let draft = EvidenceDraft::unavailable("build");
        assert_eq!(draft.confidence, Confidence::Low);
        assert!(draft.summary.contains("build data unavailable"));
        assert_eq!(draft.payload["unavailable"], "build");
    }

    #[test]
    fn test_manifest_counts_exclude_index() {
        let mut manifest = EvidenceManifest::empty();
        assert!(manifest.is_empty());
        manifest
            .entries
            .insert("a-01".to_string(), PathBuf::from("/tmp/a-01.json"));
        manifest
            .entries
            .insert(INDEX_KEY.to_string(), PathBuf::from("/tmp/index.json"));
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.evidence_count(), 1);
        assert!(manifest.contains("a-01"));
        assert_eq!(manifest.get("a-01"), Some(Path::new("/tmp/a-01.json")));
    }
}
