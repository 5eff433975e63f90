//! Embedding collaborator client (OpenAI-compatible `/embeddings`).

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use manual_core::{Embedder, ManualError, ProviderConfig, Result};

use crate::post_json;

/// Remote embedding model behind an OpenAI-compatible endpoint.
pub struct HttpEmbedder {
    config: ProviderConfig,
    dimension: usize,
}

impl HttpEmbedder {
    pub fn new(config: ProviderConfig, dimension: usize) -> Self {
        Self { config, dimension }
    }

    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let body = json!({
            "model": self.config.model,
            "input": texts,
        });
        let response = post_json(&self.config, "embedding", "/embeddings", &body).await?;
        let vectors = parse_embedding_response(&response, texts.len())?;
        debug!("Embedded {} texts", vectors.len());
        Ok(vectors)
    }
}

/// Extract vectors from `data[].embedding`, re-ordered by `data[].index`.
fn parse_embedding_response(
    response: &serde_json::Value,
    expected: usize,
) -> Result<Vec<Vec<f32>>> {
    let data = response
        .get("data")
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            ManualError::collaborator("embedding", "response is missing data array")
        })?;

    if data.len() != expected {
        return Err(ManualError::collaborator(
            "embedding",
            format!("expected {} embeddings, got {}", expected, data.len()),
        ));
    }

    let mut vectors: Vec<Vec<f32>> = vec![Vec::new(); expected];
    for (position, item) in data.iter().enumerate() {
        let index = item
            .get("index")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(position);
        let embedding = item
            .get("embedding")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                ManualError::collaborator("embedding", "embedding entry missing vector")
            })?;

        let vector: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        if index >= expected {
            return Err(ManualError::collaborator(
                "embedding",
                format!("embedding index {} out of range", index),
            ));
        }
        vectors[index] = vector;
    }

    Ok(vectors)
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.embed(texts).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed(&[text]).await?.remove(0))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
