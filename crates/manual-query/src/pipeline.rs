//! End-to-end query pipeline: retrieve, rerank, aggregate, generate.
//!
//! All collaborators are injected at construction; nothing is lazily
//! initialized or globally mutable.

use std::sync::Arc;

use tracing::info;

use manual_core::{
    Answer, Embedder, Generator, ManualError, Reranker, Result, RetrievalConfig, RetryPolicy,
    VectorStore,
};

use crate::aggregate::{extract_pages_with_confidence, PageHit};
use crate::answer::{build_answer_prompt, extract_cited_pages, NO_RESULTS_ANSWER};
use crate::rerank::rerank;
use crate::retriever::HybridRetriever;

/// The full question-answering pipeline over one built index.
pub struct QueryPipeline<E, V, R, G> {
    retriever: HybridRetriever<E, V>,
    reranker: Arc<R>,
    generator: Arc<G>,
    config: RetrievalConfig,
    retry: RetryPolicy,
}

impl<E, V, R, G> QueryPipeline<E, V, R, G>
where
    E: Embedder,
    V: VectorStore,
    R: Reranker,
    G: Generator,
{
    pub fn new(
        retriever: HybridRetriever<E, V>,
        reranker: Arc<R>,
        generator: Arc<G>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            retriever,
            reranker,
            generator,
            config,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Retrieval-only path: fused ranking, reranking, then the distinct
    /// page list (confidence-threshold aggregation).
    pub async fn pages(&self, question: &str) -> Result<Vec<u32>> {
        let fused = self
            .retriever
            .search(question, self.config.hybrid_top_k)
            .await?;
        let reranked = rerank(
            self.reranker.as_ref(),
            question,
            fused,
            self.config.rerank_top_k,
        )
        .await?;
        let hits: Vec<PageHit> = reranked.iter().map(PageHit::from).collect();
        Ok(extract_pages_with_confidence(
            &hits,
            self.config.confidence_threshold,
            self.config.max_pages,
        ))
    }

    /// Answer a question with page citations.
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        info!("Query received: {:?}", question);

        let fused = self
            .retriever
            .search(question, self.config.hybrid_top_k)
            .await?;

        // Nothing retrieved: answer directly instead of spending a
        // reranker and generator call on an empty candidate set.
        if fused.is_empty() {
            return Ok(Answer {
                text: NO_RESULTS_ANSWER.to_string(),
                pages: Vec::new(),
            });
        }

        let reranked = rerank(
            self.reranker.as_ref(),
            question,
            fused,
            self.config.rerank_top_k,
        )
        .await?;

        let context = &reranked[..reranked.len().min(self.config.answer_chunks)];
        let prompt = build_answer_prompt(question, context);

        let generator = self.generator.clone();
        let text = self
            .retry
            .run(
                || {
                    let generator = generator.clone();
                    let prompt = prompt.clone();
                    async move { generator.generate(&prompt).await }
                },
                is_transient,
            )
            .await?;
        let text = text.trim().to_string();

        // An uncited answer still came from the context; fall back to the
        // pages of the top three context chunks, ascending.
        let mut pages = extract_cited_pages(&text, context);
        if pages.is_empty() {
            pages = context.iter().take(3).map(|c| c.page_number).collect();
            pages.sort_unstable();
            pages.dedup();
        }

        info!("Query processed, cited pages: {:?}", pages);
        Ok(Answer { text, pages })
    }
}

fn is_transient(err: &ManualError) -> bool {
    matches!(
        err,
        ManualError::Collaborator { .. } | ManualError::Http { .. }
    )
}
