//! Passage index: nearest-neighbour lookup over ingested text chunks.
//!
//! Passages are held in memory and, when the index is opened from a path,
//! flushed to a JSONL file (one `{id, text, embedding}` object per line).
//! The whole file is loaded on open; queries are a linear cosine scan,
//! which is plenty for a single book's worth of chunks.

use async_trait::async_trait;
use rallycoach_core::error::IndexError;
use rallycoach_core::index::VectorIndex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::vector::rank_passages;

/// One stored chunk of reference material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// In-memory passage store with optional JSONL persistence.
pub struct PassageIndex {
    path: Option<PathBuf>,
    passages: Arc<RwLock<Vec<Passage>>>,
}

impl PassageIndex {
    /// An index that lives only in memory.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            passages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Open a file-backed index.
    ///
    /// If the file exists, passages are loaded from it. If it does not,
    /// the index starts empty and the file is created on first flush.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let passages = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = passages.len(), "Passage index loaded");
        Self {
            path: Some(path),
            passages: Arc::new(RwLock::new(passages)),
        }
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn load_from_disk(path: &Path) -> Vec<Passage> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Vec::new(),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<Passage>(line) {
                Ok(passage) => Some(passage),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted passage entry");
                    None
                }
            })
            .collect()
    }

    /// Add or replace a passage (matched by id).
    pub async fn upsert(&self, passage: Passage) {
        let mut passages = self.passages.write().await;
        match passages.iter_mut().find(|p| p.id == passage.id) {
            Some(existing) => *existing = passage,
            None => passages.push(passage),
        }
    }

    /// Remove every passage.
    pub async fn clear(&self) {
        self.passages.write().await.clear();
    }

    /// Write all passages to the backing file. No-op for in-memory indexes.
    pub async fn flush(&self) -> Result<(), IndexError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let passages = self.passages.read().await;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                IndexError::Storage(format!("Failed to create index directory: {e}"))
            })?;
        }

        let mut content = String::new();
        for passage in passages.iter() {
            let line = serde_json::to_string(passage).map_err(|e| {
                IndexError::Storage(format!("Failed to serialize passage: {e}"))
            })?;
            content.push_str(&line);
            content.push('\n');
        }

        std::fs::write(path, &content)
            .map_err(|e| IndexError::Storage(format!("Failed to write index file: {e}")))?;

        debug!(path = %path.display(), count = passages.len(), "Passage index flushed");
        Ok(())
    }
}

impl Default for PassageIndex {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[async_trait]
impl VectorIndex for PassageIndex {
    fn name(&self) -> &str {
        if self.path.is_some() { "jsonl" } else { "in_memory" }
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<String>, IndexError> {
        if embedding.is_empty() {
            return Err(IndexError::QueryFailed("empty query embedding".into()));
        }

        let passages = self.passages.read().await;

        if let Some(first) = passages.first() {
            if first.embedding.len() != embedding.len() {
                return Err(IndexError::DimensionMismatch {
                    expected: first.embedding.len(),
                    actual: embedding.len(),
                });
            }
        }

        Ok(rank_passages(&passages, embedding, k)
            .into_iter()
            .map(|p| p.text.clone())
            .collect())
    }

    async fn count(&self) -> Result<usize, IndexError> {
        Ok(self.passages.read().await.len())
    }
}
