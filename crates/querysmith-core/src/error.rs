//! Error types for the query generation pipeline.

use std::path::PathBuf;

/// Errors that can occur while deriving, reconciling, or rendering a query.
#[derive(Debug, thiserror::Error)]
pub enum QuerysmithError {
    /// IO error (reading/writing workspace artifacts).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An artifact file is present but not valid JSON.
    #[error("Malformed artifact {path:?}: {source}")]
    MalformedArtifact {
        /// Path to the artifact file.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// Serialization error while writing an artifact.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No join directive is marked as the default table, so the FROM
    /// clause has no anchor.
    #[error("No join directive is marked as the default table")]
    NoDefaultTable,

    /// An artifact does not have the structure a pipeline stage expects.
    #[error("Invalid artifact structure: {0}")]
    InvalidStructure(String),
}

/// Result type for query generation operations.
pub type Result<T> = std::result::Result<T, QuerysmithError>;
