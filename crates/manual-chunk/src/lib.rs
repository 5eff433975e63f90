//! manual-chunk - Page-aware chunking
//!
//! Splits per-page manual text into overlapping fixed-size word windows,
//! each tagged with its source page and full page text.
//!
//! # Example
//!
//! ```rust
//! use manual_chunk::Chunker;
//! use manual_core::Pages;
//!
//! let mut pages = Pages::new();
//! pages.insert(1, "before start checklist complete".to_string());
//!
//! let chunker = Chunker::new(400, 50).unwrap();
//! let chunks = chunker.chunk_pages(&pages);
//! assert_eq!(chunks.len(), 1);
//! ```

mod chunker;
mod pages;

pub use chunker::Chunker;
pub use pages::{group_by_page, load_elements};

// Re-export types for convenience
pub use manual_core::{Chunk, Pages, ParsedElement};
