//! Core domain types for the manual-rag system.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Pages keyed by 1-based page number, in ascending order.
pub type Pages = BTreeMap<u32, String>;

/// Structural category of a parsed element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Text,
    Title,
    Table,
    List,
    Image,
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Text => "text",
            Self::Title => "title",
            Self::Table => "table",
            Self::List => "list",
            Self::Image => "image",
        };
        write!(f, "{}", s)
    }
}

/// One structural unit extracted from the source document.
///
/// Produced by an external document parser; never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedElement {
    /// Element text content.
    pub text: String,

    /// Source page (1-based).
    pub page_number: u32,

    /// Structural category.
    pub element_type: ElementType,
}

/// A searchable window of page text with its parent page retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Deterministic identifier, unique across the corpus.
    pub chunk_id: String,

    /// Raw window text.
    pub text: String,

    /// Window text optionally prefixed with a generated summary.
    /// Equal to `text` until contextualization runs.
    pub contextualized_text: String,

    /// Source page (1-based).
    pub page_number: u32,

    /// Full text of the source page, kept for context generation.
    /// Not used in search scoring.
    pub parent_page_text: String,
}

impl Chunk {
    /// Create a chunk; `contextualized_text` starts equal to `text`.
    pub fn new(page_number: u32, ordinal: u32, text: &str, parent_page_text: &str) -> Self {
        Self {
            chunk_id: Self::id(page_number, ordinal),
            text: text.to_string(),
            contextualized_text: text.to_string(),
            page_number,
            parent_page_text: parent_page_text.to_string(),
        }
    }

    /// Deterministic chunk identifier from page number and ordinal.
    pub fn id(page_number: u32, ordinal: u32) -> String {
        format!("p{}_c{}", page_number, ordinal)
    }
}

/// A position in one retriever's ranked output (0-based rank).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub chunk_id: String,
    pub rank: usize,
}

impl SearchHit {
    pub fn new(chunk_id: impl Into<String>, rank: usize) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            rank,
        }
    }
}

/// Output of rank fusion, with display metadata attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedResult {
    pub chunk_id: String,

    /// Contextualized text (what was indexed).
    pub text: String,

    /// Non-contextualized text (what is shown and reranked).
    pub original_text: String,

    pub page_number: u32,

    /// Accumulated reciprocal-rank-fusion score.
    pub rrf_score: f32,
}

/// A fused result re-scored by the cross-encoder reranker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankedResult {
    pub chunk_id: String,
    pub text: String,
    pub original_text: String,
    pub page_number: u32,
    pub rrf_score: f32,
    pub rerank_score: f32,
}

impl RerankedResult {
    pub fn from_fused(fused: FusedResult, rerank_score: f32) -> Self {
        Self {
            chunk_id: fused.chunk_id,
            text: fused.text,
            original_text: fused.original_text,
            page_number: fused.page_number,
            rrf_score: fused.rrf_score,
            rerank_score,
        }
    }
}

/// A synthesized answer with its cited pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub pages: Vec<u32>,
}
