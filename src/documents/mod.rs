//! Downstream consumption of the page table
//!
//! Loads the CSV written by a crawl as [`Document`]s and feeds them to a
//! vector index through an embedding provider. Concrete embedding models and
//! persistent indexes live outside this crate; [`InMemoryIndex`] is an exact
//! in-process index.

mod index;
mod loader;

pub use index::{ingest_documents, EmbeddingProvider, InMemoryIndex, ScoredDocument, VectorIndex};
pub use loader::{load_documents, UNKNOWN_FIELD};

use std::collections::BTreeMap;
use thiserror::Error;

/// One unit of indexable text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content: String,
    pub metadata: BTreeMap<String, String>,
}

/// Errors that can occur while loading or indexing documents
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Failed to read table: {0}")]
    Csv(#[from] csv::Error),

    #[error("Table has no `{0}` column")]
    MissingColumn(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    Index(String),
}
