//! Error types for the manual-rag system.

use thiserror::Error;

/// Result type alias using ManualError.
pub type Result<T> = std::result::Result<T, ManualError>;

/// Errors that can occur in the manual-rag system.
#[derive(Error, Debug)]
pub enum ManualError {
    /// Invalid chunking or retrieval configuration.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// An operation was called with no input records.
    #[error("Empty input: {message}")]
    EmptyInput { message: String },

    /// A persisted index is missing; `index` names which one.
    #[error("Index not found: {index} ({message})")]
    IndexNotFound { index: String, message: String },

    /// Parallel arrays in a persisted bundle disagree in length or content.
    #[error("Index alignment error: {message}")]
    Alignment { message: String },

    /// An external collaborator call failed after retries were exhausted.
    #[error("Collaborator '{service}' failed: {message}")]
    Collaborator { service: String, message: String },

    /// Database error.
    #[error("Database error: {message}")]
    Database { message: String },

    /// HTTP transport error.
    #[error("HTTP error: {message}")]
    Http { message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error (unexpected).
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ManualError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an empty-input error.
    pub fn empty_input(message: impl Into<String>) -> Self {
        Self::EmptyInput {
            message: message.into(),
        }
    }

    /// Create an index-not-found error for the named index.
    pub fn index_not_found(index: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IndexNotFound {
            index: index.into(),
            message: message.into(),
        }
    }

    /// Create an alignment error.
    pub fn alignment(message: impl Into<String>) -> Self {
        Self::Alignment {
            message: message.into(),
        }
    }

    /// Create a collaborator error.
    pub fn collaborator(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Collaborator {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create an HTTP error.
    pub fn http(message: impl Into<String>) -> Self {
        Self::Http {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::EmptyInput { .. } => "EMPTY_INPUT",
            Self::IndexNotFound { .. } => "INDEX_NOT_FOUND",
            Self::Alignment { .. } => "ALIGNMENT_ERROR",
            Self::Collaborator { .. } => "COLLABORATOR_ERROR",
            Self::Database { .. } => "DATABASE_ERROR",
            Self::Http { .. } => "HTTP_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}
