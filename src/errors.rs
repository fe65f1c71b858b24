//! Error types for the citeline pipeline
//!
//! Fatal configuration and startup errors get their own variants;
//! pipeline internals propagate external failures via anyhow context.

use thiserror::Error;

/// Main error type for the citeline retrieval system
#[derive(Error, Debug)]
pub enum RagError {
    /// Configuration errors (bad TOML, invalid parameter values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Knowledge-base errors (missing folder, no documents found)
    #[error("Knowledge base error: {0}")]
    KnowledgeBase(String),

    /// Embedding service errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector store errors
    #[error("Vector store error: {0}")]
    VectorStore(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for citeline operations
pub type Result<T> = std::result::Result<T, RagError>;
