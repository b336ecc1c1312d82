//! Retrieval glue: question → embedding → nearest passages.

use std::sync::Arc;

use rallycoach_core::error::{IndexError, Result};
use rallycoach_core::index::VectorIndex;
use rallycoach_core::provider::{EmbeddingRequest, Provider};
use tracing::debug;

/// Joins retrieved passages into the reference block.
pub const PASSAGE_SEPARATOR: &str = "\n\n---\n\n";

/// Embeds a question and looks up its nearest passages.
pub struct Retriever {
    provider: Arc<dyn Provider>,
    model: String,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        index: Arc<dyn VectorIndex>,
        top_k: usize,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            index,
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Up to `top_k` passage texts, most similar first.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<String>> {
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                inputs: vec![question.to_string()],
            })
            .await?;

        let embedding = response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| IndexError::EmbeddingFailed("provider returned no embedding".into()))?;

        let passages = self.index.query(&embedding, self.top_k).await?;
        debug!(
            index = self.index.name(),
            dimensions = embedding.len(),
            passages = passages.len(),
            "Retrieved passages"
        );
        Ok(passages)
    }
}
