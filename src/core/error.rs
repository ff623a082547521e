use thiserror::Error;

use crate::storage::index_name::IndexNameError;

pub type MemoryResult<T> = std::result::Result<T, MemoryDbError>;
pub type BackendResult<T> = std::result::Result<T, BackendError>;

#[derive(Error, Debug)]
pub enum MemoryDbError {
    #[error("Invalid index name '{name}': {}", join_codes(.errors))]
    InvalidName {
        name: String,
        errors: Vec<IndexNameError>,
    },

    #[error("Dimension mismatch on index '{index}': expected {expected}, got {actual}")]
    DimensionMismatch {
        index: String,
        expected: usize,
        actual: usize,
    },

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Operation cancelled: {operation}")]
    Cancelled { operation: &'static str },

    #[error("Operation '{operation}' is not supported by the {backend} backend")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Backend error during {operation} on index '{index}': {source}")]
    Backend {
        operation: &'static str,
        index: String,
        #[source]
        source: BackendError,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MemoryDbError {
    /// Lift a backend failure into the public error kinds, keeping the
    /// operation and index it happened on.
    pub fn from_backend(
        error: BackendError,
        backend: &'static str,
        operation: &'static str,
        index: &str,
    ) -> Self {
        match error {
            BackendError::Unavailable(message) => Self::BackendUnavailable(message),
            BackendError::IndexNotFound(_) => Self::IndexNotFound(index.to_string()),
            BackendError::Unsupported(_) => Self::Unsupported { backend, operation },
            other => Self::Backend {
                operation,
                index: index.to_string(),
                source: other,
            },
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Errors reported by a [`GraphBackend`](crate::storage::backends::GraphBackend).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Connection error: {0}")]
    Unavailable(String),

    #[error("No such vector index: {0}")]
    IndexNotFound(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

fn join_codes(errors: &[IndexNameError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
