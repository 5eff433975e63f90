//! Persisted lexical index bundle.
//!
//! The BM25 structure is stored next to parallel arrays of chunk ids,
//! indexed texts, page numbers, and original texts. Lexical search returns
//! array positions, so the arrays must stay exactly index-aligned; length
//! and digest checks at load time catch corruption before it can skew a
//! query.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use manual_core::{ManualError, Result, SearchHit};

use crate::lexical::{tokenize, LexicalIndex};

/// File name of the bundle inside the persist directory.
pub const LEXICAL_BUNDLE_FILE: &str = "lexical_index.json";

/// Parallel metadata arrays, position-aligned with the BM25 corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexicalArrays {
    pub chunk_ids: Vec<String>,
    pub texts: Vec<String>,
    pub page_numbers: Vec<u32>,
    pub original_texts: Vec<String>,
}

impl LexicalArrays {
    fn digest(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(hex::encode(blake3::hash(&bytes).as_bytes()))
    }
}

/// On-disk representation.
#[derive(Debug, Serialize, Deserialize)]
struct BundleFile {
    digest: String,
    bm25: LexicalIndex,
    arrays: LexicalArrays,
}

/// Loaded lexical index with its metadata arrays and an id-to-position
/// map built once per load.
#[derive(Debug)]
pub struct LexicalBundle {
    bm25: LexicalIndex,
    arrays: LexicalArrays,
    positions: HashMap<String, usize>,
}

impl LexicalBundle {
    /// Assemble a bundle from a freshly built index and its arrays.
    pub fn new(bm25: LexicalIndex, arrays: LexicalArrays) -> Result<Self> {
        Self::verify_alignment(&bm25, &arrays)?;
        let positions = Self::position_map(&arrays)?;
        Ok(Self {
            bm25,
            arrays,
            positions,
        })
    }

    fn verify_alignment(bm25: &LexicalIndex, arrays: &LexicalArrays) -> Result<()> {
        let n = arrays.chunk_ids.len();
        if arrays.texts.len() != n
            || arrays.page_numbers.len() != n
            || arrays.original_texts.len() != n
            || bm25.doc_count() != n
        {
            return Err(ManualError::alignment(format!(
                "parallel array lengths disagree: ids={} texts={} pages={} originals={} bm25={}",
                n,
                arrays.texts.len(),
                arrays.page_numbers.len(),
                arrays.original_texts.len(),
                bm25.doc_count()
            )));
        }
        Ok(())
    }

    fn position_map(arrays: &LexicalArrays) -> Result<HashMap<String, usize>> {
        let mut positions = HashMap::with_capacity(arrays.chunk_ids.len());
        for (idx, chunk_id) in arrays.chunk_ids.iter().enumerate() {
            if positions.insert(chunk_id.clone(), idx).is_some() {
                return Err(ManualError::alignment(format!(
                    "duplicate chunk id in bundle: {}",
                    chunk_id
                )));
            }
        }
        Ok(positions)
    }

    /// Persist the bundle atomically: write a temp file in the same
    /// directory, then rename it into place.
    pub fn save(&self, persist_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(persist_dir)?;

        let file = BundleFile {
            digest: self.arrays.digest()?,
            bm25: self.bm25.clone(),
            arrays: self.arrays.clone(),
        };

        let tmp = persist_dir.join(format!("{}.tmp", LEXICAL_BUNDLE_FILE));
        let path = persist_dir.join(LEXICAL_BUNDLE_FILE);
        std::fs::write(&tmp, serde_json::to_vec(&file)?)?;
        std::fs::rename(&tmp, &path)?;

        info!(
            "Saved lexical bundle ({} chunks) to {:?}",
            self.arrays.chunk_ids.len(),
            path
        );
        Ok(())
    }

    /// Load and defensively validate the bundle.
    pub fn load(persist_dir: &Path) -> Result<Self> {
        let path = persist_dir.join(LEXICAL_BUNDLE_FILE);
        if !path.exists() {
            return Err(ManualError::index_not_found(
                "lexical",
                format!("bundle file missing: {:?}", path),
            ));
        }

        let content = std::fs::read_to_string(&path)?;
        let file: BundleFile = serde_json::from_str(&content)?;

        let expected = file.arrays.digest()?;
        if expected != file.digest {
            return Err(ManualError::alignment(format!(
                "bundle digest mismatch for {:?}",
                path
            )));
        }

        let bundle = Self::new(file.bm25, file.arrays)?;
        info!(
            "Loaded lexical bundle ({} chunks) from {:?}",
            bundle.len(),
            path
        );
        Ok(bundle)
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.arrays.chunk_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.chunk_ids.is_empty()
    }

    /// Chunk ids in insertion order.
    pub fn chunk_ids(&self) -> &[String] {
        &self.arrays.chunk_ids
    }

    /// BM25 top-k hits with 0-based ranks. The query is tokenized exactly
    /// like the indexed texts.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchHit> {
        let query_tokens = tokenize(query);
        self.bm25
            .top_n(&query_tokens, top_k)
            .into_iter()
            .enumerate()
            .map(|(rank, idx)| SearchHit::new(self.arrays.chunk_ids[idx].clone(), rank))
            .collect()
    }

    /// Display metadata for one chunk: (indexed text, original text, page).
    pub fn metadata(&self, chunk_id: &str) -> Option<(&str, &str, u32)> {
        let &idx = self.positions.get(chunk_id)?;
        Some((
            &self.arrays.texts[idx],
            &self.arrays.original_texts[idx],
            self.arrays.page_numbers[idx],
        ))
    }
}
