//! Hybrid retriever: vector + lexical search fused by reciprocal rank.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use manual_core::{Embedder, FusedResult, ManualError, Result, SearchHit, VectorStore};
use manual_index::{l2_normalize, LexicalBundle, SqliteVectorStore, VECTOR_DB_FILE};

use crate::fusion::reciprocal_rank_fusion;

/// Standard RRF constant.
const DEFAULT_RRF_K: f32 = 60.0;

/// Runs both sub-indices independently and fuses their ranked candidate
/// lists. Both indices must be present; there is no silent fallback to
/// single-signal search.
#[derive(Debug)]
pub struct HybridRetriever<E, V> {
    embedder: Arc<E>,
    vector_store: Arc<V>,
    bundle: LexicalBundle,
    rrf_k: f32,
}

impl<E: Embedder> HybridRetriever<E, SqliteVectorStore> {
    /// Open both persisted indices from `persist_dir`.
    ///
    /// Fails with `IndexNotFound` naming whichever index is absent.
    pub fn open(embedder: Arc<E>, persist_dir: &Path) -> Result<Self> {
        let vector_store = SqliteVectorStore::open_existing(persist_dir.join(VECTOR_DB_FILE))?;
        let bundle = LexicalBundle::load(persist_dir)?;
        info!("Hybrid retriever ready ({} chunks)", bundle.len());
        Ok(Self::new(embedder, Arc::new(vector_store), bundle))
    }
}

impl<E, V> HybridRetriever<E, V>
where
    E: Embedder,
    V: VectorStore,
{
    /// Assemble a retriever from already-opened indices.
    pub fn new(embedder: Arc<E>, vector_store: Arc<V>, bundle: LexicalBundle) -> Self {
        Self {
            embedder,
            vector_store,
            bundle,
            rrf_k: DEFAULT_RRF_K,
        }
    }

    pub fn with_rrf_k(mut self, rrf_k: f32) -> Self {
        self.rrf_k = rrf_k;
        self
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.bundle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundle.is_empty()
    }

    /// Hybrid search with RRF fusion, ordered by fused score descending.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<FusedResult>> {
        debug!("Hybrid search (top_k={}): {:?}", top_k, query);

        let vector_hits = self.vector_search(query, top_k).await?;
        let lexical_hits = self.bundle.search(query, top_k);

        debug!(
            "Vector search returned {} hits, lexical search returned {} hits",
            vector_hits.len(),
            lexical_hits.len()
        );

        let mut fused = reciprocal_rank_fusion(&vector_hits, &lexical_hits, self.rrf_k);
        fused.truncate(top_k);

        let mut results = Vec::with_capacity(fused.len());
        for (chunk_id, rrf_score) in fused {
            let (text, original_text, page_number) =
                self.bundle.metadata(&chunk_id).ok_or_else(|| {
                    ManualError::alignment(format!(
                        "chunk {} returned by search is missing from the lexical bundle",
                        chunk_id
                    ))
                })?;

            results.push(FusedResult {
                chunk_id,
                text: text.to_string(),
                original_text: original_text.to_string(),
                page_number,
                rrf_score,
            });
        }

        debug!("Fused to {} results", results.len());
        Ok(results)
    }

    async fn vector_search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        let mut embedding = self.embedder.embed_query(query).await?;
        l2_normalize(&mut embedding);

        let ids = self.vector_store.query(&embedding, top_k).await?;
        Ok(ids
            .into_iter()
            .enumerate()
            .map(|(rank, chunk_id)| SearchHit { chunk_id, rank })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use manual_core::{Chunk, VectorRecord};
    use manual_index::{IndexBuilder, LexicalArrays, LexicalIndex};

    /// Embeds text as letter-bucket counts: dimension 26, one bucket per
    /// leading letter of each token.
    #[derive(Debug)]
    struct LetterEmbedder;

    fn letter_embed(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; 26];
        for token in text.split_whitespace() {
            let first = token
                .chars()
                .next()
                .and_then(|c| c.to_lowercase().next())
                .unwrap_or('a');
            if first.is_ascii_lowercase() {
                v[(first as u8 - b'a') as usize] += 1.0;
            }
        }
        v
    }

    #[async_trait]
    impl Embedder for LetterEmbedder {
        async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| letter_embed(t)).collect())
        }

        async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
            Ok(letter_embed(text))
        }

        fn dimension(&self) -> usize {
            26
        }
    }

    async fn build_retriever(
        dir: &Path,
        chunks: &[Chunk],
    ) -> HybridRetriever<LetterEmbedder, SqliteVectorStore> {
        let store = Arc::new(SqliteVectorStore::open(dir.join(VECTOR_DB_FILE)).unwrap());
        let builder = IndexBuilder::new(Arc::new(LetterEmbedder), store, dir, 8, 8);
        builder.build_indices(chunks).await.unwrap();
        HybridRetriever::open(Arc::new(LetterEmbedder), dir).unwrap()
    }

    fn corpus() -> Vec<Chunk> {
        vec![
            Chunk::new(1, 0, "beacon light switch on", "beacon light switch on"),
            Chunk::new(2, 0, "engine start lever idle", "engine start lever idle"),
            Chunk::new(3, 0, "fuel pump low pressure", "fuel pump low pressure"),
        ]
    }

    #[tokio::test]
    async fn test_search_finds_matching_chunk_first() {
        let dir = tempfile::tempdir().unwrap();
        let retriever = build_retriever(dir.path(), &corpus()).await;

        let results = retriever.search("beacon light", 3).await.unwrap();

        assert_eq!(results[0].chunk_id, "p1_c0");
        assert_eq!(results[0].page_number, 1);
        assert_eq!(results[0].original_text, "beacon light switch on");
    }

    #[tokio::test]
    async fn test_search_is_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let retriever = build_retriever(dir.path(), &corpus()).await;

        let first = retriever.search("engine fuel", 3).await.unwrap();
        let second = retriever.search("engine fuel", 3).await.unwrap();

        let ids = |r: &[FusedResult]| r.iter().map(|f| f.chunk_id.clone()).collect::<Vec<_>>();
        let scores = |r: &[FusedResult]| r.iter().map(|f| f.rrf_score).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(scores(&first), scores(&second));
    }

    #[tokio::test]
    async fn test_with_rrf_k_changes_fused_scores() {
        let dir = tempfile::tempdir().unwrap();
        let retriever = build_retriever(dir.path(), &corpus()).await;

        let default_k = retriever.search("beacon light", 3).await.unwrap();

        let retriever = HybridRetriever::open(Arc::new(LetterEmbedder), dir.path())
            .unwrap()
            .with_rrf_k(1.0);
        let small_k = retriever.search("beacon light", 3).await.unwrap();

        // Same top chunk, but a smaller k inflates every contribution:
        // rank 0 in both lists scores 2/(1+1) = 1.0 instead of 2/61.
        assert_eq!(small_k[0].chunk_id, default_k[0].chunk_id);
        assert!(small_k[0].rrf_score > default_k[0].rrf_score);
        assert!((small_k[0].rrf_score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_open_without_vector_index_names_it() {
        let dir = tempfile::tempdir().unwrap();
        // Persist only the lexical bundle.
        let tokens = vec![vec!["hello".to_string()]];
        let arrays = LexicalArrays {
            chunk_ids: vec!["p1_c0".into()],
            texts: vec!["hello".into()],
            page_numbers: vec![1],
            original_texts: vec!["hello".into()],
        };
        manual_index::LexicalBundle::new(LexicalIndex::build(&tokens), arrays)
            .unwrap()
            .save(dir.path())
            .unwrap();

        let err = HybridRetriever::open(Arc::new(LetterEmbedder), dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ManualError::IndexNotFound { ref index, .. } if index == "vector"
        ));
    }

    #[tokio::test]
    async fn test_open_without_lexical_bundle_names_it() {
        let dir = tempfile::tempdir().unwrap();
        // Persist only the vector side.
        let store = SqliteVectorStore::open(dir.path().join(VECTOR_DB_FILE)).unwrap();
        store
            .upsert(&[VectorRecord {
                chunk_id: "p1_c0".into(),
                page_number: 1,
                embedding: vec![1.0; 26],
            }])
            .await
            .unwrap();
        drop(store);

        let err = HybridRetriever::open(Arc::new(LetterEmbedder), dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ManualError::IndexNotFound { ref index, .. } if index == "lexical"
        ));
    }
}
