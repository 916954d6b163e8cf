//! Corpus snapshot persistence.
//!
//! The corpus is a flat JSON array of passages written once by ingestion
//! and re-read in bulk on every retrieval call, so the retrieval view is
//! always current with the on-disk snapshot. Absence of a snapshot is an
//! empty corpus, never an error.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use crate::models::Passage;

/// Source of the full passage corpus.
///
/// `load_chunks` is total: implementations return an empty sequence when
/// no corpus exists rather than failing.
pub trait CorpusSource: Send + Sync {
    fn load_chunks(&self) -> Vec<Passage>;
}

/// Corpus backed by the persisted JSON snapshot file.
pub struct SnapshotCorpus {
    path: PathBuf,
}

impl SnapshotCorpus {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CorpusSource for SnapshotCorpus {
    fn load_chunks(&self) -> Vec<Passage> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_slice(&bytes) {
            Ok(passages) => passages,
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "corpus snapshot unreadable, treating as empty"
                );
                Vec::new()
            }
        }
    }
}

/// Write the corpus snapshot, creating parent directories as needed.
pub fn save_chunks(path: &Path, passages: &[Passage]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let json = serde_json::to_vec(passages)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write snapshot: {}", path.display()))
}

/// Fixed in-memory corpus, used by tests.
pub struct InMemoryCorpus {
    passages: Vec<Passage>,
}

impl InMemoryCorpus {
    pub fn new(passages: Vec<Passage>) -> Self {
        Self { passages }
    }
}

impl CorpusSource for InMemoryCorpus {
    fn load_chunks(&self) -> Vec<Passage> {
        self.passages.clone()
    }
}
