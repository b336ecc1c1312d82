//! VectorIndex trait: nearest-neighbour lookup over ingested passages.
//!
//! The index only answers "which stored passages are closest to this
//! vector". There is no reranking, filtering, or score threshold; callers
//! get up to `k` passage texts in similarity order.

use async_trait::async_trait;

use crate::error::IndexError;

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// The backend name (e.g., "jsonl", "in_memory").
    fn name(&self) -> &str;

    /// Return up to `k` passage texts, most similar first.
    ///
    /// The result may be shorter than `k` when the index holds fewer passages.
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<String>, IndexError>;

    /// Number of stored passages.
    async fn count(&self) -> Result<usize, IndexError>;
}
