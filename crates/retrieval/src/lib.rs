//! Retrieval collaborators for RallyCoach.
//!
//! - [`PassageIndex`]: nearest-neighbour passage store, optionally persisted as JSONL
//! - [`read_document`]: text of a plain-text or PDF source document
//! - [`chunk_text`]: fixed-size overlapping windows over a document
//! - [`Ingestor`]: chunk, embed, and store a document

pub mod chunker;
pub mod document;
pub mod ingest;
pub mod passage_index;
pub mod vector;

pub use chunker::chunk_text;
pub use document::read_document;
pub use ingest::{IngestReport, Ingestor};
pub use passage_index::{Passage, PassageIndex};
pub use vector::{cosine_similarity, rank_passages};
