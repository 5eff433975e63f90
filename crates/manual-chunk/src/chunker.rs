//! Sliding word-window chunker with page-level parents.

use std::path::Path;

use tracing::info;

use manual_core::{Chunk, ChunkingConfig, Pages, Result};

/// Splits page text into overlapping word windows.
///
/// Each chunk keeps its source page number and the full page text as its
/// parent, so downstream context generation never has to re-read the
/// source document.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a chunker, rejecting sizings where the window would never
    /// advance (`overlap >= chunk_size`) or never match (`chunk_size == 0`).
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        let config = ChunkingConfig {
            chunk_size,
            overlap,
        };
        config.validate()?;
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Create a chunker from validated configuration.
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.overlap)
    }

    /// Create child chunks from parent pages.
    pub fn chunk_pages(&self, pages: &Pages) -> Vec<Chunk> {
        info!(
            "Chunking {} pages (size={}, overlap={})",
            pages.len(),
            self.chunk_size,
            self.overlap
        );

        let mut all_chunks = Vec::new();
        for (&page_num, page_text) in pages {
            self.split_page(page_text, page_num, &mut all_chunks);
        }

        info!("Created {} chunks", all_chunks.len());
        all_chunks
    }

    /// Split one page into overlapping windows.
    fn split_page(&self, text: &str, page_num: u32, out: &mut Vec<Chunk>) {
        let words: Vec<&str> = text.split_whitespace().collect();

        if words.is_empty() {
            return;
        }

        if words.len() <= self.chunk_size {
            out.push(Chunk::new(page_num, 0, text, text));
            return;
        }

        let step = self.chunk_size - self.overlap;
        let mut start = 0;
        let mut ordinal = 0;

        while start < words.len() {
            let end = (start + self.chunk_size).min(words.len());
            let window = words[start..end].join(" ");
            out.push(Chunk::new(page_num, ordinal, &window, text));

            ordinal += 1;
            start += step;
        }
    }

    /// Save a chunk set to JSON, losslessly.
    pub fn save(chunks: &[Chunk], path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(chunks)?;
        std::fs::write(path, json)?;
        info!("Saved {} chunks to {:?}", chunks.len(), path);
        Ok(())
    }

    /// Load a chunk set from JSON.
    pub fn load(path: &Path) -> Result<Vec<Chunk>> {
        let content = std::fs::read_to_string(path)?;
        let chunks: Vec<Chunk> = serde_json::from_str(&content)?;
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn pages_from(entries: &[(u32, &str)]) -> Pages {
        entries
            .iter()
            .map(|(n, t)| (*n, t.to_string()))
            .collect()
    }

    fn numbered_words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_chunk_size() {
        assert!(Chunker::new(50, 50).is_err());
        assert!(Chunker::new(50, 80).is_err());
        assert!(Chunker::new(0, 0).is_err());
        assert!(Chunker::new(50, 49).is_ok());
    }

    #[test]
    fn test_short_page_emits_single_chunk() {
        let chunker = Chunker::new(10, 2).unwrap();
        let pages = pages_from(&[(3, "set flaps to five")]);

        let chunks = chunker.chunk_pages(&pages);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_id, "p3_c0");
        assert_eq!(chunks[0].text, "set flaps to five");
        assert_eq!(chunks[0].page_number, 3);
        assert_eq!(chunks[0].parent_page_text, "set flaps to five");
    }

    #[test]
    fn test_empty_page_emits_no_chunks() {
        let chunker = Chunker::new(10, 2).unwrap();
        let pages = pages_from(&[(1, ""), (2, "   \n  ")]);

        assert!(chunker.chunk_pages(&pages).is_empty());
    }

    #[test]
    fn test_windows_overlap_and_final_window_may_be_short() {
        let chunker = Chunker::new(5, 2).unwrap();
        let pages = pages_from(&[(1, numbered_words(12).as_str())]);

        let chunks = chunker.chunk_pages(&pages);

        // step 3: starts 0, 3, 6, 9
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].text, "w0 w1 w2 w3 w4");
        assert_eq!(chunks[1].text, "w3 w4 w5 w6 w7");
        assert_eq!(chunks[3].text, "w9 w10 w11");
    }

    #[test]
    fn test_reassembly_reproduces_page_word_sequence() {
        let chunker = Chunker::new(7, 3).unwrap();
        let page_text = numbered_words(25);
        let pages = pages_from(&[(4, page_text.as_str())]);

        let chunks = chunker.chunk_pages(&pages);

        // Strip each window's leading overlap, then concatenate.
        let step = 7 - 3;
        let mut rebuilt: Vec<String> = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let words: Vec<&str> = chunk.text.split_whitespace().collect();
            let start_word = i * step;
            let new_words = words
                .iter()
                .skip(rebuilt.len().saturating_sub(start_word))
                .map(|w| w.to_string());
            rebuilt.extend(new_words);
        }

        let original: Vec<String> = page_text
            .split_whitespace()
            .map(|w| w.to_string())
            .collect();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_chunk_ids_unique_across_corpus() {
        let chunker = Chunker::new(5, 1).unwrap();
        let long_a = numbered_words(23);
        let long_b = numbered_words(17);
        let pages = pages_from(&[(1, long_a.as_str()), (2, "short page"), (3, long_b.as_str())]);

        let chunks = chunker.chunk_pages(&pages);

        let ids: HashSet<&str> = chunks.iter().map(|c| c.chunk_id.as_str()).collect();
        assert_eq!(ids.len(), chunks.len());
    }

    #[test]
    fn test_save_load_round_trip() {
        let chunker = Chunker::new(5, 1).unwrap();
        let text = numbered_words(14);
        let pages = pages_from(&[(9, text.as_str())]);
        let chunks = chunker.chunk_pages(&pages);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("chunks.json");

        Chunker::save(&chunks, &path).unwrap();
        let loaded = Chunker::load(&path).unwrap();

        assert_eq!(loaded, chunks);
    }
}
