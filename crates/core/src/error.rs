//! Error types for Veritas.
//!
//! One enum covers every error category in the workspace. Pipeline stages
//! absorb most of these and turn them into degraded results; only
//! [`AppError::Cancelled`] is expected to reach the caller of a query.

use thiserror::Error;

/// Unified error type for Veritas.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generation backend (LLM provider) errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Web search backend errors
    #[error("Search error: {0}")]
    Search(String),

    /// Document index errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt loading and rendering errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// A retrieval agent failed to produce evidence
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Answer generation failed after evidence was gathered
    #[error("Generation error: {0}")]
    Generation(String),

    /// The query text was rejected before entering the pipeline
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The caller cancelled the query
    #[error("Query cancelled")]
    Cancelled,

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error represents caller cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Cancelled)
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
    fn test_cancelled_is_distinguishable() {
        assert!(AppError::Cancelled.is_cancelled());
        assert!(!AppError::Retrieval("timeout".to_string()).is_cancelled());
    }

    #[test]
    fn test_json_error_maps_to_serialization() {
        let err: AppError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
