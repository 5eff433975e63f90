//! Dual index builder.
//!
//! Consumes the chunk set once and produces two aligned artifacts: the
//! vector index (embeddings of contextualized text) and the lexical BM25
//! bundle. Both are keyed by the shared chunk id; the build fails rather
//! than leave the two indices carrying different chunk-id sets.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use manual_core::{Chunk, Embedder, ManualError, Result, VectorRecord, VectorStore};

use crate::bundle::{LexicalArrays, LexicalBundle};
use crate::lexical::{tokenize, LexicalIndex};

/// Normalize a vector to unit length in place. Zero vectors are left
/// untouched rather than divided by zero.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Builds the vector and lexical indices from a chunk set.
pub struct IndexBuilder<E, V> {
    embedder: Arc<E>,
    vector_store: Arc<V>,
    persist_dir: PathBuf,
    embed_batch_size: usize,
    upsert_batch_size: usize,
}

impl<E, V> IndexBuilder<E, V>
where
    E: Embedder,
    V: VectorStore,
{
    pub fn new(
        embedder: Arc<E>,
        vector_store: Arc<V>,
        persist_dir: impl Into<PathBuf>,
        embed_batch_size: usize,
        upsert_batch_size: usize,
    ) -> Self {
        Self {
            embedder,
            vector_store,
            persist_dir: persist_dir.into(),
            embed_batch_size: embed_batch_size.max(1),
            upsert_batch_size: upsert_batch_size.max(1),
        }
    }

    /// Build both indices. Embedding failures abort the build; the vector
    /// and lexical artifacts are separate and each write is idempotent, so
    /// a rerun resumes cleanly.
    pub async fn build_indices(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Err(ManualError::empty_input("no chunks provided for indexing"));
        }

        info!("Building indices for {} chunks", chunks.len());

        // Contextualized text feeds both indices; that is what
        // contextualization is for.
        let texts: Vec<&str> = chunks.iter().map(|c| c.contextualized_text.as_str()).collect();

        let embeddings = self.embed_all(&texts).await?;
        self.upsert_vectors(chunks, embeddings).await?;
        self.build_lexical(chunks, &texts)?;
        self.verify_chunk_id_sets(chunks).await?;

        info!("Indices built successfully");
        Ok(())
    }

    async fn embed_all(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        info!(
            "Embedding {} texts (batch_size={})",
            texts.len(),
            self.embed_batch_size
        );

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.embed_batch_size) {
            let mut batch_embeddings = self.embedder.embed_documents(batch).await?;
            for embedding in &mut batch_embeddings {
                l2_normalize(embedding);
            }
            embeddings.append(&mut batch_embeddings);
        }

        if embeddings.len() != texts.len() {
            return Err(ManualError::collaborator(
                "embedding",
                format!("expected {} vectors, got {}", texts.len(), embeddings.len()),
            ));
        }

        Ok(embeddings)
    }

    async fn upsert_vectors(&self, chunks: &[Chunk], embeddings: Vec<Vec<f32>>) -> Result<()> {
        let records: Vec<VectorRecord> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| VectorRecord {
                chunk_id: chunk.chunk_id.clone(),
                page_number: chunk.page_number,
                embedding,
            })
            .collect();

        // Batching only bounds peak payload; results never depend on
        // insertion order.
        for batch in records.chunks(self.upsert_batch_size) {
            self.vector_store.upsert(batch).await?;
            debug!("Upserted batch of {} vectors", batch.len());
        }

        Ok(())
    }

    fn build_lexical(&self, chunks: &[Chunk], texts: &[&str]) -> Result<()> {
        info!("Building BM25 index");

        let tokenized: Vec<Vec<String>> = texts.iter().map(|t| tokenize(t)).collect();
        let bm25 = LexicalIndex::build(&tokenized);

        let arrays = LexicalArrays {
            chunk_ids: chunks.iter().map(|c| c.chunk_id.clone()).collect(),
            texts: texts.iter().map(|t| t.to_string()).collect(),
            page_numbers: chunks.iter().map(|c| c.page_number).collect(),
            original_texts: chunks.iter().map(|c| c.text.clone()).collect(),
        };

        LexicalBundle::new(bm25, arrays)?.save(&self.persist_dir)
    }

    /// The two indices must end the build with identical chunk-id sets.
    async fn verify_chunk_id_sets(&self, chunks: &[Chunk]) -> Result<()> {
        let expected: HashSet<&str> = chunks.iter().map(|c| c.chunk_id.as_str()).collect();
        let stored = self.vector_store.chunk_ids().await?;

        // A prior build over a larger corpus leaves rows no current chunk
        // owns. Left in place they can win vector queries while carrying
        // no lexical metadata, so delete them before declaring the build
        // done.
        let stale: Vec<String> = stored
            .iter()
            .filter(|id| !expected.contains(id.as_str()))
            .cloned()
            .collect();
        if !stale.is_empty() {
            info!("Removing {} stale vector rows", stale.len());
            self.vector_store.remove(&stale).await?;
        }

        let stored_set: HashSet<&str> = stored
            .iter()
            .map(|s| s.as_str())
            .filter(|id| expected.contains(id))
            .collect();
        for chunk_id in &expected {
            if !stored_set.contains(chunk_id) {
                return Err(ManualError::alignment(format!(
                    "vector index is missing chunk {}",
                    chunk_id
                )));
            }
        }

        let bundle = LexicalBundle::load(&self.persist_dir)?;
        let lexical_set: HashSet<&str> = bundle.chunk_ids().iter().map(|s| s.as_str()).collect();
        if lexical_set != expected {
            return Err(ManualError::alignment(
                "lexical index chunk-id set diverges from the chunk set",
            ));
        }

        Ok(())
    }
}
