//! Error types for the retrieval core.
//!
//! "No data" is never an error here: empty document sets, missing query
//! embeddings and unknown chunks surface as empty collections or `None`.
//! Only genuine infrastructure faults use [`Error`].

use thiserror::Error;

/// Result type alias using the core [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds surfaced by the core.
#[derive(Error, Debug)]
pub enum Error {
    /// The chunk or document store could not read or write data.
    #[error("Store error: {0}")]
    Store(String),

    /// The embedding provider failed (remote error, timeout, bad response).
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Tuning parameters violate an invariant (e.g. overlap >= chunk size).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A document-scoped operation named a document that does not exist.
    #[error("Document not found: {0}")]
    DocumentNotFound(String),
}

impl Error {
    /// Wrap any displayable backend error as a [`Error::Store`].
    pub fn store(err: impl std::fmt::Display) -> Self {
        Error::Store(err.to_string())
    }

    /// Wrap any displayable provider error as a [`Error::Embedding`].
    pub fn embedding(err: impl std::fmt::Display) -> Self {
        Error::Embedding(err.to_string())
    }
}
