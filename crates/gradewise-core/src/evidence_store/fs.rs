use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::domain::{Evidence, EvidenceManifest, OmittedEvidence, INDEX_KEY};
use crate::metrics::METRICS;
use crate::obs;

use super::index::{EvidenceIndex, IndexEntry, INDEX_FILE_NAME};
use super::{sha256_hex, EvidenceRecord, EvidenceStore, PersistResult, StoreError, StoreResult};

/// Filesystem evidence store.
///
/// Layout: `<root>/<dimension>/<criterion_id>/<id>.json` plus
/// `<root>/index.json`. Each file is written to a temp file in its target
/// directory and renamed into place, then read back and checked against the
/// sha256 of the bytes that were written.
///
/// Every item's target is resolved before any write starts. An item whose
/// id or resolved path was already taken by an earlier item is omitted, as
/// is one that would land on the index.
#[derive(Debug, Clone)]
pub struct FsEvidenceStore {
    root: PathBuf,
    max_concurrent: usize,
}

impl FsEvidenceStore {
    pub const DEFAULT_MAX_CONCURRENT: usize = 4;

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_concurrent: Self::DEFAULT_MAX_CONCURRENT,
        }
    }

    /// Bound on concurrent writes. Zero is treated as one.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE_NAME)
    }

    /// Resolve the absolute target of each item, in input order.
    fn claim_targets(&self, evidence: &[Evidence]) -> Vec<StoreResult<PathBuf>> {
        let mut ids = HashSet::new();
        let mut claimed: HashMap<PathBuf, &str> = HashMap::new();
        let mut targets = Vec::with_capacity(evidence.len());
        for item in evidence {
            if !ids.insert(item.id.as_str()) {
                targets.push(Err(StoreError::DuplicateId {
                    id: item.id.clone(),
                }));
                continue;
            }
            let target = normalized_relative(&item.suggested_path).and_then(|relative| {
                let path = self.root.join(&relative);
                if relative.starts_with(INDEX_FILE_NAME) {
                    return Err(StoreError::ReservedPath { path });
                }
                if let Some(owner) = claimed.get(&path) {
                    return Err(StoreError::PathConflict {
                        path,
                        claimed_by: owner.to_string(),
                    });
                }
                claimed.insert(path.clone(), item.id.as_str());
                Ok(path)
            });
            targets.push(target);
        }
        targets
    }

    async fn persist_one(
        &self,
        item: Evidence,
        target: StoreResult<PathBuf>,
        permits: Arc<Semaphore>,
    ) -> PersistResult {
        let id = item.id.clone();
        let path = match target {
            Ok(path) => path,
            Err(e) => {
                return PersistResult::Omitted {
                    id,
                    reason: e.to_string(),
                }
            }
        };

        let _permit = match permits.acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                return PersistResult::Omitted {
                    id,
                    reason: format!("write slot unavailable: {e}"),
                }
            }
        };

        let target = path.clone();
        match tokio::task::spawn_blocking(move || write_evidence(&target, &item)).await {
            Ok(Ok(digest)) => PersistResult::Persisted { id, path, digest },
            Ok(Err(e)) => PersistResult::Omitted {
                id,
                reason: e.to_string(),
            },
            Err(e) => PersistResult::Omitted {
                id,
                reason: format!("writer task failed: {e}"),
            },
        }
    }

    async fn write_index(&self, index: EvidenceIndex) -> StoreResult<PathBuf> {
        let path = self.index_path();
        let target = path.clone();
        tokio::task::spawn_blocking(move || -> StoreResult<()> {
            let bytes = serde_json::to_vec_pretty(&index)?;
            let read_back = write_verified(&target, &bytes)?;
            let parsed: EvidenceIndex = serde_json::from_slice(&read_back)?;
            if parsed.run_id != index.run_id {
                return Err(StoreError::IdMismatch {
                    path: target,
                    expected: index.run_id.to_string(),
                    actual: parsed.run_id.to_string(),
                });
            }
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))??;
        Ok(path)
    }
}

#[async_trait]
impl EvidenceStore for FsEvidenceStore {
    async fn persist(&self, evidence: &[Evidence]) -> EvidenceManifest {
        let permits = Arc::new(Semaphore::new(self.max_concurrent));
        let targets = self.claim_targets(evidence);
        let writes = evidence
            .iter()
            .zip(targets)
            .map(|(item, target)| self.persist_one(item.clone(), target, permits.clone()));
        let results: Vec<PersistResult> = futures::future::join_all(writes).await;

        let mut manifest = EvidenceManifest::empty();
        let mut index = EvidenceIndex::new(Uuid::new_v4());

        for (item, result) in evidence.iter().zip(results) {
            match result {
                PersistResult::Persisted { id, path, digest } => {
                    obs::emit_evidence_persisted(&id, &path, &digest);
                    METRICS.inc_evidence_persisted();
                    let relative = path
                        .strip_prefix(&self.root)
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|_| path.clone());
                    index.push(
                        item.dimension,
                        IndexEntry {
                            id: id.clone(),
                            criterion_id: item.criterion_id.clone(),
                            path: relative,
                            sha256: digest,
                        },
                    );
                    manifest.entries.insert(id, path);
                }
                PersistResult::Omitted { id, reason } => {
                    obs::emit_evidence_omitted(&id, &reason);
                    METRICS.inc_evidence_omitted();
                    manifest
                        .warnings
                        .push(format!("evidence {id} omitted: {reason}"));
                    manifest.omitted.push(OmittedEvidence { id, reason });
                }
            }
        }
        index.omitted = manifest.omitted.clone();

        let indexed = index.total_entries;
        match self.write_index(index).await {
            Ok(path) => {
                obs::emit_index_written(&path, indexed);
                manifest.entries.insert(INDEX_KEY.to_string(), path.clone());
                manifest.index_path = Some(path);
            }
            Err(e) => {
                obs::emit_index_failed(&e.to_string());
                manifest
                    .warnings
                    .push(format!("evidence index not written: {e}"));
            }
        }

        manifest
    }
}

/// Reject suggested paths that could escape the store root, and drop `.`
/// components so equal targets compare equal.
fn normalized_relative(path: &Path) -> StoreResult<PathBuf> {
    let invalid = |reason| StoreError::InvalidPath {
        path: path.to_path_buf(),
        reason,
    };
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => return Err(invalid("contains '..'")),
            Component::RootDir | Component::Prefix(_) => return Err(invalid("absolute path")),
        }
    }
    if normalized.as_os_str().is_empty() {
        return Err(invalid("empty path"));
    }
    Ok(normalized)
}

/// Write one evidence file to `path`; returns the digest of what landed.
fn write_evidence(path: &Path, item: &Evidence) -> StoreResult<String> {
    let bytes = serde_json::to_vec_pretty(&EvidenceRecord::from(item))?;
    let read_back = write_verified(path, &bytes)?;

    let record: EvidenceRecord = serde_json::from_slice(&read_back)?;
    if record.id != item.id {
        return Err(StoreError::IdMismatch {
            path: path.to_path_buf(),
            expected: item.id.clone(),
            actual: record.id,
        });
    }
    Ok(sha256_hex(&read_back))
}

/// Atomically write `bytes` to `path`, then read the file back and check it.
fn write_verified(path: &Path, bytes: &[u8]) -> StoreResult<Vec<u8>> {
    let dir = path.parent().ok_or_else(|| StoreError::InvalidPath {
        path: path.to_path_buf(),
        reason: "no parent directory",
    })?;
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    let read_back = std::fs::read(path)?;
    if read_back.is_empty() {
        return Err(StoreError::EmptyFile {
            path: path.to_path_buf(),
        });
    }
    let expected = sha256_hex(bytes);
    let actual = sha256_hex(&read_back);
    if expected != actual {
        return Err(StoreError::DigestMismatch {
            path: path.to_path_buf(),
            expected,
            actual,
        });
    }
    Ok(read_back)
}
