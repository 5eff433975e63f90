//! manual-query - Hybrid retrieval and answer pipeline
//!
//! Runs the vector and lexical indices independently, fuses their ranked
//! candidates with Reciprocal Rank Fusion, reranks with a cross-encoder
//! collaborator, and collapses chunk results to a cited page list.
//!
//! # Example
//!
//! ```rust,ignore
//! use manual_query::HybridRetriever;
//! use std::sync::Arc;
//!
//! let retriever = HybridRetriever::open(Arc::new(embedder), &persist_dir)?;
//! let results = retriever.search("engine fire on start", 100).await?;
//! ```

mod aggregate;
mod answer;
mod fusion;
mod pipeline;
mod rerank;
mod retriever;

pub use aggregate::{extract_pages, extract_pages_with_confidence, PageHit};
pub use answer::{build_answer_prompt, extract_cited_pages, NO_RESULTS_ANSWER};
pub use fusion::reciprocal_rank_fusion;
pub use pipeline::QueryPipeline;
pub use rerank::rerank;
pub use retriever::HybridRetriever;

// Re-export for convenience
pub use manual_core::{Answer, FusedResult, RerankedResult, SearchHit};
