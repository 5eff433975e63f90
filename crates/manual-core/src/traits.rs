//! Collaborator traits consumed by the retrieval core.
//!
//! The embedding model, vector store, reranker, and text generator are
//! external services invoked through these narrow interfaces.

use async_trait::async_trait;

use crate::error::Result;

/// Embedding collaborator.
///
/// Implementations return raw model vectors; callers L2-normalize before
/// storage and comparison so cosine similarity reduces to a dot product.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of document texts (index-build mode).
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query text (query mode).
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;
}

/// One record inserted into the vector index.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub chunk_id: String,
    pub page_number: u32,
    pub embedding: Vec<f32>,
}

/// Vector store collaborator, queried by cosine similarity over
/// pre-normalized vectors.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace records by chunk id.
    async fn upsert(&self, records: &[VectorRecord]) -> Result<()>;

    /// Delete records by chunk id. Unknown ids are ignored.
    async fn remove(&self, chunk_ids: &[String]) -> Result<()>;

    /// Return the `k` nearest chunk ids, best first.
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<String>>;

    /// All stored chunk ids, in insertion order.
    async fn chunk_ids(&self) -> Result<Vec<String>>;

    /// Number of stored records.
    async fn len(&self) -> Result<usize>;
}

/// Cross-encoder reranker collaborator.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Score each document against the query; one score per document,
    /// in input order.
    async fn score(&self, query: &str, documents: &[String]) -> Result<Vec<f32>>;
}

/// Text generation collaborator (contextual summaries, answer synthesis).
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}
