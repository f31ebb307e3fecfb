//! Aggregate evidence index written next to the evidence tree.
//!
//! External tooling reads `index.json` instead of scanning directories, so
//! it lists only what was persisted and verified.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Dimension, OmittedEvidence};

pub const INDEX_FILE_NAME: &str = "index.json";
pub const INDEX_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub criterion_id: String,
    /// Relative to the store root.
    pub path: PathBuf,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceIndex {
    pub schema_version: String,
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub total_entries: usize,
    pub dimensions: BTreeMap<Dimension, Vec<IndexEntry>>,
    /// Items that were not persisted, so readers can tell "missing" from "never produced".
    #[serde(default)]
    pub omitted: Vec<OmittedEvidence>,
}

impl EvidenceIndex {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            schema_version: INDEX_SCHEMA_VERSION.to_string(),
            run_id,
            generated_at: Utc::now(),
            total_entries: 0,
            dimensions: BTreeMap::new(),
            omitted: Vec::new(),
        }
    }

    pub fn push(&mut self, dimension: Dimension, entry: IndexEntry) {
        self.dimensions.entry(dimension).or_default().push(entry);
        self.total_entries += 1;
    }

    /// Every entry, in dimension order.
    pub fn entries(&self) -> impl Iterator<Item = (Dimension, &IndexEntry)> {
        self.dimensions
            .iter()
            .flat_map(|(d, entries)| entries.iter().map(move |e| (*d, e)))
    }
}
