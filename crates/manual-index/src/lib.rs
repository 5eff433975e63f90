//! manual-index - Dual index construction and persistence
//!
//! Builds two aligned indices over the chunk set: a SQLite-backed vector
//! index queried by cosine similarity, and an Okapi BM25 lexical index
//! persisted alongside parallel metadata arrays. Both are keyed by the
//! shared deterministic chunk id.

mod builder;
mod bundle;
mod context;
mod lexical;
mod vector;

pub use builder::{l2_normalize, IndexBuilder};
pub use bundle::{LexicalArrays, LexicalBundle, LEXICAL_BUNDLE_FILE};
pub use context::Contextualizer;
pub use lexical::LexicalIndex;
pub use vector::{SqliteVectorStore, VECTOR_DB_FILE};

// Re-export types for convenience
pub use manual_core::{Chunk, SearchHit, VectorRecord, VectorStore};
