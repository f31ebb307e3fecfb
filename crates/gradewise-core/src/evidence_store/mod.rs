//! Evidence persistence.
//!
//! An [`EvidenceStore`] writes evidence items and returns the
//! [`EvidenceManifest`] of what it actually wrote. A manifest entry is only
//! ever added after the file has been read back and verified, and a failure
//! on one item never stops the others.

pub mod error;
pub mod fs;
pub mod index;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{Confidence, Dimension, Evidence, EvidenceManifest};

pub use error::{StoreError, StoreResult};
pub use fs::FsEvidenceStore;
pub use index::{EvidenceIndex, IndexEntry, INDEX_FILE_NAME, INDEX_SCHEMA_VERSION};

/// Persists evidence for one run.
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Write every item it can and report what was written.
    ///
    /// Never fails as a whole: per-item problems end up in
    /// [`EvidenceManifest::omitted`] and [`EvidenceManifest::warnings`].
    async fn persist(&self, evidence: &[Evidence]) -> EvidenceManifest;
}

/// What happened to one evidence item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistResult {
    Persisted {
        id: String,
        path: PathBuf,
        /// Hex sha256 of the file contents.
        digest: String,
    },
    Omitted {
        id: String,
        reason: String,
    },
}

impl PersistResult {
    pub fn id(&self) -> &str {
        match self {
            PersistResult::Persisted { id, .. } | PersistResult::Omitted { id, .. } => id,
        }
    }
}

/// On-disk form of an evidence item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub id: String,
    pub criterion_id: String,
    pub dimension: Dimension,
    pub confidence: Confidence,
    pub summary: String,
    pub payload: serde_json::Value,
}

impl From<&Evidence> for EvidenceRecord {
    fn from(e: &Evidence) -> Self {
        Self {
            id: e.id.clone(),
            criterion_id: e.criterion_id.clone(),
            dimension: e.dimension,
            confidence: e.confidence,
            summary: e.summary.clone(),
            payload: e.payload.clone(),
        }
    }
}

/// Read and parse a persisted evidence file.
pub fn read_evidence_record(path: &Path) -> StoreResult<EvidenceRecord> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Check that every manifest entry still exists and is non-empty.
pub fn verify_manifest(manifest: &EvidenceManifest) -> StoreResult<()> {
    for (id, path) in &manifest.entries {
        let meta = std::fs::metadata(path).map_err(|_| StoreError::Missing {
            id: id.clone(),
            path: path.clone(),
        })?;
        if !meta.is_file() {
            return Err(StoreError::Missing {
                id: id.clone(),
                path: path.clone(),
            });
        }
        if meta.len() == 0 {
            return Err(StoreError::EmptyFile { path: path.clone() });
        }
    }
    Ok(())
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
