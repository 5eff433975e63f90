//! Rerank collaborator client (`/rerank`-style endpoint).

use async_trait::async_trait;
use serde_json::json;

use manual_core::{ManualError, ProviderConfig, Reranker, Result};

use crate::post_json;

/// Remote cross-encoder reranker.
pub struct HttpReranker {
    config: ProviderConfig,
}

impl HttpReranker {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

/// Align scores to document order via `results[].index`.
fn parse_rerank_response(response: &serde_json::Value, doc_count: usize) -> Result<Vec<f32>> {
    let results = response
        .get("results")
        .or_else(|| response.get("data"))
        .and_then(|v| v.as_array())
        .ok_or_else(|| ManualError::collaborator("rerank", "response is missing results array"))?;

    let mut scores = vec![0.0f32; doc_count];
    for item in results {
        let index = item
            .get("index")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| ManualError::collaborator("rerank", "result missing index"))?
            as usize;
        let score = item
            .get("relevance_score")
            .or_else(|| item.get("score"))
            .and_then(|v| v.as_f64())
            .ok_or_else(|| ManualError::collaborator("rerank", "result missing score"))?
            as f32;
        if index < scores.len() {
            scores[index] = score;
        }
    }

    Ok(scores)
}

#[async_trait]
impl Reranker for HttpReranker {
    async fn score(&self, query: &str, documents: &[String]) -> Result<Vec<f32>> {
        let body = json!({
            "model": self.config.model,
            "query": query,
            "documents": documents,
        });
        let response = post_json(&self.config, "rerank", "/rerank", &body).await?;
        parse_rerank_response(&response, documents.len())
    }
}
