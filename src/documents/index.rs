use crate::documents::{Document, DocumentError};
use async_trait::async_trait;
use std::sync::Mutex;
use uuid::Uuid;

/// A search hit
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub id: String,
    pub document: Document,
    /// Squared L2 distance to the query; lower is closer
    pub distance: f32,
}

/// Turns text into an embedding vector
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DocumentError>;
}

/// Stores embedded documents and answers nearest-neighbour queries
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Adds documents, returning the id assigned to each in order
    async fn add(&self, entries: Vec<(Document, Vec<f32>)>) -> Result<Vec<String>, DocumentError>;

    /// Returns up to `k` documents closest to `query`
    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredDocument>, DocumentError>;
}

/// Embeds every document and adds it to the index
///
/// Stops at the first embedding failure without touching the index.
pub async fn ingest_documents(
    documents: Vec<Document>,
    embedder: &dyn EmbeddingProvider,
    index: &dyn VectorIndex,
) -> Result<Vec<String>, DocumentError> {
    let mut entries = Vec::with_capacity(documents.len());

    for document in documents {
        let vector = embedder.embed(&document.content).await?;
        entries.push((document, vector));
    }

    let ids = index.add(entries).await?;
    tracing::info!("Inserted {} document(s) into the vector index", ids.len());
    Ok(ids)
}

/// Exact-search index held in memory
///
/// Every vector must have the dimension of the first one added.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    entries: Mutex<Vec<(String, Document, Vec<f32>)>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, Document, Vec<f32>)>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn add(&self, new: Vec<(Document, Vec<f32>)>) -> Result<Vec<String>, DocumentError> {
        let mut entries = self.lock();
        let dimension = entries
            .first()
            .map(|(_, _, v)| v.len())
            .or_else(|| new.first().map(|(_, v)| v.len()));

        if let Some(dimension) = dimension {
            if let Some((_, bad)) = new.iter().find(|(_, v)| v.len() != dimension) {
                return Err(DocumentError::Index(format!(
                    "expected dimension {}, got {}",
                    dimension,
                    bad.len()
                )));
            }
        }

        let mut ids = Vec::with_capacity(new.len());
        for (document, vector) in new {
            let id = Uuid::new_v4().to_string();
            ids.push(id.clone());
            entries.push((id, document, vector));
        }
        Ok(ids)
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredDocument>, DocumentError> {
        let entries = self.lock();

        let mut hits: Vec<ScoredDocument> = entries
            .iter()
            .map(|(id, document, vector)| ScoredDocument {
                id: id.clone(),
                document: document.clone(),
                distance: squared_l2(query, vector),
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }
}
