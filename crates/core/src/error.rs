//! Error types for PolicyLens.
//!
//! One enum covers every failure category in the workspace. The first three
//! variants are the question-answering taxonomy; callers match on them to
//! decide whether a failure is fatal for the session, for one document, or
//! for one question.

use thiserror::Error;

/// Unified error type for PolicyLens.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// An embedding or QA model failed to load, is unreachable, or timed out.
    /// Fatal for the whole session; never retried automatically.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Segmentation produced zero usable passages.
    /// Recoverable: the document cannot be analyzed, skip its questions.
    #[error("No content available: {0}")]
    NoContentAvailable(String),

    /// The answer extractor could not produce a span for the given context.
    /// Recoverable per question.
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// Vectors of the wrong count or dimension were handed to the ranker.
    #[error("Invalid embedding: {0}")]
    InvalidEmbedding(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fetching or parsing a remote policy page
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Saved policy artifacts
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether the session can keep going after this error.
    ///
    /// Only `NoContentAvailable` and `ExtractionFailed` are scoped to a single
    /// document or question.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::NoContentAvailable(_) | AppError::ExtractionFailed(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_variants() {
        assert!(AppError::NoContentAvailable("empty".into()).is_recoverable());
        assert!(AppError::ExtractionFailed("no span".into()).is_recoverable());
        assert!(!AppError::ModelUnavailable("down".into()).is_recoverable());
        assert!(!AppError::Config("bad".into()).is_recoverable());
    }

    #[test]
    fn test_display_includes_category() {
        let err = AppError::ModelUnavailable("ollama not reachable".to_string());
        assert_eq!(err.to_string(), "Model unavailable: ollama not reachable");
    }

    #[test]
    fn test_from_yaml_error() {
        let parse: Result<serde_yaml::Value, _> = serde_yaml::from_str("key: [unclosed");
        let err: AppError = parse.unwrap_err().into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
