use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The sources manifest is missing, malformed, or has an invalid entry.
    #[error("Manifest error ({}): {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },

    /// A single source could not be turned into text.
    #[error("Extraction failed for {}: {reason}", path.display())]
    Extraction { path: PathBuf, reason: String },

    /// The vector collection has not been built (or cannot be queried).
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Re-ranking failed: {0}")]
    Rerank(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn store(err: impl std::fmt::Display) -> Self {
        Self::Store(err.to_string())
    }

    pub fn embedding(err: impl std::fmt::Display) -> Self {
        Self::Embedding(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
