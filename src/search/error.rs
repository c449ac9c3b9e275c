//! Error types for search operations

use crate::error::AppError;

/// Result type for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Engine host/port not configured; the integration stays disabled
    #[error("Search engine configuration not found")]
    ConfigurationAbsent,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Engine could not be reached while connecting
    #[error("Search engine unreachable: {0}")]
    EngineUnreachable(String),

    /// An operation required the engine while it was not connected
    #[error("Search engine is not available")]
    EngineUnavailable,

    /// A single document write failed
    #[error("Write failed for document {id}: {reason}")]
    WriteFailed { id: String, reason: String },

    /// A date field in an engine hit did not use the fixed date format
    #[error("Malformed date in field '{field}': '{value}'")]
    MalformedDate { field: String, value: String },

    /// Engine request failed
    #[error("Search request failed: {0}")]
    Request(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// In-process index failure
    #[error("Tantivy error: {0}")]
    Tantivy(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::Request(err.to_string())
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Serialization(err.to_string())
    }
}

impl From<tantivy::TantivyError> for SearchError {
    fn from(err: tantivy::TantivyError) -> Self {
        SearchError::Tantivy(err.to_string())
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::ConfigurationAbsent | SearchError::InvalidConfiguration(_) => {
                AppError::Configuration(err.to_string())
            }
            SearchError::EngineUnreachable(_) | SearchError::EngineUnavailable => {
                AppError::Unavailable(err.to_string())
            }
            SearchError::MalformedDate { .. } => AppError::InvalidData(err.to_string()),
            SearchError::Request(msg) => AppError::Network(msg),
            SearchError::Serialization(msg) => AppError::Serialization(msg),
            _ => AppError::Internal(err.to_string()),
        }
    }
}
