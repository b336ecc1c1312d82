//! Document ingestion: chunk, embed, store.

use std::sync::Arc;

use rallycoach_core::error::{IndexError, Result};
use rallycoach_core::index::VectorIndex;
use rallycoach_core::provider::{EmbeddingRequest, Provider};
use tracing::{debug, info};

use crate::chunker::chunk_text;
use crate::passage_index::{Passage, PassageIndex};

/// How many chunks go into one embedding request.
const DEFAULT_BATCH_SIZE: usize = 16;

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub chunks: usize,
    pub total_passages: usize,
}

/// Turns document text into indexed passages.
pub struct Ingestor {
    provider: Arc<dyn Provider>,
    model: String,
    chunk_size: usize,
    chunk_stride: usize,
    batch_size: usize,
}

impl Ingestor {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        chunk_size: usize,
        chunk_stride: usize,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            chunk_size,
            chunk_stride,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Chunk `text`, embed every chunk, and replace the index contents with
    /// the result. Passage ids are `chunk_{i}` in document order.
    ///
    /// The index is only modified once every chunk has been embedded, so a
    /// provider failure leaves the previous contents untouched.
    pub async fn ingest(&self, index: &PassageIndex, text: &str) -> Result<IngestReport> {
        let chunks = chunk_text(text, self.chunk_size, self.chunk_stride);
        info!(chunks = chunks.len(), model = %self.model, "Ingesting document");

        let mut passages = Vec::with_capacity(chunks.len());
        for (batch_no, batch) in chunks.chunks(self.batch_size).enumerate() {
            let request = EmbeddingRequest {
                model: self.model.clone(),
                inputs: batch.to_vec(),
            };
            let response = self.provider.embed(request).await?;

            if response.embeddings.len() != batch.len() {
                return Err(IndexError::EmbeddingFailed(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    response.embeddings.len()
                ))
                .into());
            }

            for (text, embedding) in batch.iter().zip(response.embeddings) {
                passages.push(Passage {
                    id: format!("chunk_{}", passages.len()),
                    text: text.clone(),
                    embedding,
                });
            }
            debug!(batch = batch_no, embedded = passages.len(), "Embedded batch");
        }

        index.clear().await;
        for passage in passages {
            index.upsert(passage).await;
        }
        index.flush().await?;

        let report = IngestReport {
            chunks: chunks.len(),
            total_passages: index.count().await?,
        };
        info!(chunks = report.chunks, total = report.total_passages, "Ingestion complete");
        Ok(report)
    }
}
