//! Cross-encoder rerank step over fused results.

use tracing::{debug, info};

use manual_core::{FusedResult, ManualError, Reranker, RerankedResult, Result};

/// Re-score fused results with the reranker collaborator and keep the
/// `top_k` best.
///
/// The reranker sees `original_text` (the non-contextualized window);
/// contextual prefixes only exist to improve index matching. Ties keep
/// the fused order.
pub async fn rerank<R: Reranker + ?Sized>(
    reranker: &R,
    query: &str,
    results: Vec<FusedResult>,
    top_k: usize,
) -> Result<Vec<RerankedResult>> {
    if results.is_empty() {
        return Ok(Vec::new());
    }

    info!("Reranking {} results (top_k={})", results.len(), top_k);

    let documents: Vec<String> = results.iter().map(|r| r.original_text.clone()).collect();
    let scores = reranker.score(query, &documents).await?;

    if scores.len() != results.len() {
        return Err(ManualError::collaborator(
            "rerank",
            format!(
                "expected {} scores, got {}",
                results.len(),
                scores.len()
            ),
        ));
    }

    let mut reranked: Vec<RerankedResult> = results
        .into_iter()
        .zip(scores)
        .map(|(fused, score)| RerankedResult::from_fused(fused, score))
        .collect();

    // Stable sort: equal rerank scores keep fused ordering.
    reranked.sort_by(|a, b| {
        b.rerank_score
            .partial_cmp(&a.rerank_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    reranked.truncate(top_k);

    debug!("Reranked to {} results", reranked.len());
    Ok(reranked)
}
