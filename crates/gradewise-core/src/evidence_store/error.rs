//! Error types for evidence persistence.
//!
//! Store errors never escape [`super::EvidenceStore::persist`]; they become
//! the reason of an omitted item. [`super::verify_manifest`] returns them
//! directly.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("refusing to write outside the store root: {path} ({reason})")]
    InvalidPath { path: PathBuf, reason: &'static str },

    #[error("evidence id {id:?} appears more than once in this run")]
    DuplicateId { id: String },

    #[error("{path} is already claimed by evidence {claimed_by:?}")]
    PathConflict { path: PathBuf, claimed_by: String },

    #[error("{path} is reserved for the evidence index")]
    ReservedPath { path: PathBuf },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{path} is empty after writing")]
    EmptyFile { path: PathBuf },

    #[error("{path} read back with sha256 {actual}, expected {expected}")]
    DigestMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("{path} holds {actual:?}, expected {expected:?}")]
    IdMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("manifest entry {id:?} points at missing file {path}")]
    Missing { id: String, path: PathBuf },
}

/// Result type for evidence store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
