//! manual-core - Core types and traits for the manual-rag system
//!
//! This crate provides the foundational types, collaborator traits, error
//! handling, configuration, and retry policy used throughout manual-rag.

pub mod config;
pub mod error;
pub mod retry;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{ManualError, Result};
pub use retry::RetryPolicy;
pub use traits::*;
pub use types::*;
