use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConstructionError>;

/// Failures raised while building, loading or persisting an [`crate::Index`].
///
/// Query-time conditions (unknown ids, empty history, small corpora) are never
/// errors; they degrade to fewer results instead.
#[derive(Debug, Error)]
pub enum ConstructionError {
    /// Ingestion file or artifact file is missing.
    #[error("source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Ingestion source exists but a row or file could not be parsed.
    #[error("malformed source {}: {message}", .path.display())]
    MalformedSource { path: PathBuf, message: String },

    /// Persisted artifact failed to decode or violates an index invariant.
    #[error("corrupt artifact: {0}")]
    CorruptArtifact(String),

    /// The index was built over zero listings.
    #[error("index was built over an empty corpus")]
    EmptyCorpus,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConstructionError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        ConstructionError::MalformedSource { path: path.into(), message: message.to_string() }
    }
}
