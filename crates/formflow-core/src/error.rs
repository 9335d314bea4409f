//! Error types for reading flow documents.

use thiserror::Error;

/// Convenience alias for results carrying an [`ImportError`].
pub type Result<T> = std::result::Result<T, ImportError>;

/// Reasons a payload could not be turned into a flow.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("failed to read flow file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid file structure: missing \"questions\" field")]
    MissingQuestions,

    #[error("invalid file structure: \"questions\" must be an array")]
    QuestionsNotSequence,

    #[error("invalid question at index {index}: {source}")]
    InvalidQuestion {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}
