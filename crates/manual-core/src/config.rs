//! Configuration types for the manual-rag system.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ManualError, Result};

/// Main configuration for the manual-rag system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManualConfig {
    /// Chunking configuration.
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Index build configuration.
    #[serde(default)]
    pub index: IndexConfig,

    /// Retrieval configuration.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Collaborator endpoints.
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// Chunking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Window size in words.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Word overlap between consecutive windows.
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 400,
            overlap: 50,
        }
    }
}

impl ChunkingConfig {
    /// Reject window sizings that would loop forever or emit nothing.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ManualError::configuration("chunk_size must be positive"));
        }
        if self.overlap >= self.chunk_size {
            return Err(ManualError::configuration(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Index build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Directory holding the persisted indices.
    #[serde(default = "default_persist_dir")]
    pub persist_dir: PathBuf,

    /// Vector upsert batch size. Bounds peak payload only; insertion
    /// order never affects query results.
    #[serde(default = "default_upsert_batch_size")]
    pub upsert_batch_size: usize,

    /// Embedding request batch size.
    #[serde(default = "default_embed_batch_size")]
    pub embed_batch_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            persist_dir: default_persist_dir(),
            upsert_batch_size: 100,
            embed_batch_size: 12,
        }
    }
}

/// Retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Candidates fetched from each sub-retriever and kept after fusion.
    #[serde(default = "default_hybrid_top_k")]
    pub hybrid_top_k: usize,

    /// Results kept after reranking.
    #[serde(default = "default_rerank_top_k")]
    pub rerank_top_k: usize,

    /// RRF constant k.
    #[serde(default = "default_rrf_k")]
    pub rrf_k: f32,

    /// Minimum rerank score for the confidence-threshold page variant.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Maximum pages returned by aggregation.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Chunks handed to the answer generator.
    #[serde(default = "default_answer_chunks")]
    pub answer_chunks: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            hybrid_top_k: 100,
            rerank_top_k: 20,
            rrf_k: 60.0,
            confidence_threshold: 0.6,
            max_pages: 5,
            answer_chunks: 5,
        }
    }
}

/// Collaborator endpoint configurations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub embedding: ProviderConfig,

    #[serde(default)]
    pub rerank: ProviderConfig,

    #[serde(default)]
    pub generation: ProviderConfig,
}

/// One collaborator endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the service.
    #[serde(default)]
    pub base_url: String,

    /// API key sent as a bearer token.
    #[serde(default)]
    pub api_key: String,

    /// Model identifier passed in the request body.
    #[serde(default)]
    pub model: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            model: String::new(),
            timeout_ms: 30_000,
        }
    }
}

// Default value functions

fn default_chunk_size() -> usize {
    400
}

fn default_overlap() -> usize {
    50
}

fn default_upsert_batch_size() -> usize {
    100
}

fn default_embed_batch_size() -> usize {
    12
}

fn default_hybrid_top_k() -> usize {
    100
}

fn default_rerank_top_k() -> usize {
    20
}

fn default_rrf_k() -> f32 {
    60.0
}

fn default_confidence_threshold() -> f32 {
    0.6
}

fn default_max_pages() -> usize {
    5
}

fn default_answer_chunks() -> usize {
    5
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_persist_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("manual-rag")
        .join("index")
}

impl ManualConfig {
    /// Load configuration from file.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            ManualError::configuration(format!("Failed to parse config: {}", e))
        })?;
        config.chunking.validate()?;
        Ok(config)
    }

    /// Load configuration from default paths.
    pub fn load_default() -> Result<Self> {
        // Try user config first
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("manual-rag").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        // Try local config
        let local_config = PathBuf::from("manual-rag.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ManualConfig::default();
        assert_eq!(config.chunking.chunk_size, 400);
        assert_eq!(config.chunking.overlap, 50);
        assert_eq!(config.retrieval.hybrid_top_k, 100);
        assert_eq!(config.retrieval.rrf_k, 60.0);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let config = ChunkingConfig {
            chunk_size: 50,
            overlap: 50,
        };
        assert!(config.validate().is_err());

        let config = ChunkingConfig {
            chunk_size: 50,
            overlap: 60,
        };
        assert!(config.validate().is_err());

        let config = ChunkingConfig {
            chunk_size: 50,
            overlap: 10,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let config = ChunkingConfig {
            chunk_size: 0,
            overlap: 0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_rejects_bad_chunking() {
        let dir = std::env::temp_dir().join("manual-rag-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        std::fs::write(&path, "[chunking]\nchunk_size = 10\noverlap = 10\n").unwrap();
        assert!(ManualConfig::load(&path).is_err());
        std::fs::remove_file(&path).ok();
    }
}
