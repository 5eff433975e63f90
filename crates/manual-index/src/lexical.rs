//! Okapi BM25 lexical index.
//!
//! Term-frequency saturation (k1), document-length normalization (b), and
//! inverse document frequency with negative-IDF flooring. Scores every
//! corpus document on each query; ties are broken by chunk insertion order
//! so repeated searches are byte-identical.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Default term-frequency saturation parameter.
const DEFAULT_K1: f32 = 1.5;

/// Default document-length normalization parameter.
const DEFAULT_B: f32 = 0.75;

/// Default floor factor for negative IDF values.
const DEFAULT_EPSILON: f32 = 0.25;

/// Lowercase whitespace tokenization, shared by index build and query.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(|t| t.to_lowercase()).collect()
}

/// In-memory BM25 ranking structure, serializable for persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexicalIndex {
    k1: f32,
    b: f32,

    /// Per-document term frequencies, in chunk insertion order.
    doc_freqs: Vec<HashMap<String, u32>>,

    /// Per-term inverse document frequency, floored for very common terms.
    idf: HashMap<String, f32>,

    /// Per-document token counts.
    doc_len: Vec<u32>,

    /// Average document length over the corpus.
    avgdl: f32,
}

impl LexicalIndex {
    /// Build an index over tokenized documents with default parameters.
    pub fn build(documents: &[Vec<String>]) -> Self {
        Self::with_params(documents, DEFAULT_K1, DEFAULT_B, DEFAULT_EPSILON)
    }

    /// Build an index with explicit BM25 parameters.
    pub fn with_params(documents: &[Vec<String>], k1: f32, b: f32, epsilon: f32) -> Self {
        let mut doc_freqs = Vec::with_capacity(documents.len());
        let mut doc_len = Vec::with_capacity(documents.len());
        let mut df: HashMap<String, u32> = HashMap::new();
        let mut total_len = 0u64;

        for tokens in documents {
            doc_len.push(tokens.len() as u32);
            total_len += tokens.len() as u64;

            let mut freqs: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *freqs.entry(token.clone()).or_insert(0) += 1;
            }
            for term in freqs.keys() {
                *df.entry(term.clone()).or_insert(0) += 1;
            }
            doc_freqs.push(freqs);
        }

        let n = documents.len() as f32;
        let avgdl = if documents.is_empty() {
            0.0
        } else {
            total_len as f32 / n
        };

        // Okapi IDF can go negative for terms in most documents; floor
        // those at epsilon times the corpus average IDF.
        let mut idf: HashMap<String, f32> = HashMap::with_capacity(df.len());
        let mut idf_sum = 0.0f32;
        let mut negative: Vec<String> = Vec::new();

        for (term, term_df) in &df {
            let value = ((n - *term_df as f32 + 0.5) / (*term_df as f32 + 0.5)).ln();
            idf_sum += value;
            if value < 0.0 {
                negative.push(term.clone());
            }
            idf.insert(term.clone(), value);
        }

        if !idf.is_empty() {
            let average_idf = idf_sum / idf.len() as f32;
            let floor = epsilon * average_idf;
            for term in negative {
                idf.insert(term, floor);
            }
        }

        Self {
            k1,
            b,
            doc_freqs,
            idf,
            doc_len,
            avgdl,
        }
    }

    /// Number of indexed documents.
    pub fn doc_count(&self) -> usize {
        self.doc_freqs.len()
    }

    /// BM25 score of every corpus document against the query tokens,
    /// in chunk insertion order.
    pub fn get_scores(&self, query_tokens: &[String]) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.doc_freqs.len()];

        for term in query_tokens {
            let Some(&idf) = self.idf.get(term) else {
                continue;
            };

            for (doc_idx, freqs) in self.doc_freqs.iter().enumerate() {
                let Some(&tf) = freqs.get(term) else {
                    continue;
                };
                let tf = tf as f32;
                let dl = self.doc_len[doc_idx] as f32;
                let norm = self.k1 * (1.0 - self.b + self.b * dl / self.avgdl);
                scores[doc_idx] += idf * (tf * (self.k1 + 1.0)) / (tf + norm);
            }
        }

        scores
    }

    /// Top-k document positions for the query, best first.
    ///
    /// Equal raw scores fall back to insertion order, keeping results
    /// reproducible across runs.
    pub fn top_n(&self, query_tokens: &[String], n: usize) -> Vec<usize> {
        let scores = self.get_scores(query_tokens);
        let mut indices: Vec<usize> = (0..scores.len()).collect();
        indices.sort_by(|&a, &b| {
            scores[b]
                .partial_cmp(&scores[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });
        indices.truncate(n);
        indices
    }
}
