//! Error types for resume-scout

use thiserror::Error;

/// Result type alias for resume-scout operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in resume-scout
#[derive(Error, Debug)]
pub enum Error {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector database error: {0}")]
    VectorDb(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No candidates found in the store")]
    NoCandidates,

    #[error("No candidate in focus for this conversation")]
    NoFocus,
}

impl Error {
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    pub fn vector_db(msg: impl Into<String>) -> Self {
        Self::VectorDb(msg.into())
    }

    pub fn completion(msg: impl Into<String>) -> Self {
        Self::Completion(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Whether a retry of the same turn could plausibly succeed.
    ///
    /// External-service failures (embedding, search, completion) are
    /// transient; the others indicate a state or data problem.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Embedding(_) | Self::VectorDb(_) | Self::Completion(_)
        )
    }
}
