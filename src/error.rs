use thiserror::Error;

/// Crate-wide error, as seen by callers outside the search module
#[derive(Error, Debug)]
pub enum AppError {
    /// Settings missing or unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Search engine not connected or not answering
    #[error("Search unavailable: {0}")]
    Unavailable(String),

    /// Transport failure talking to the engine
    #[error("Engine request failed: {0}")]
    Network(String),

    /// Stored document content could not be turned into a result
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable code for logs and CLI output
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Unavailable(_) => "SEARCH_UNAVAILABLE",
            AppError::Network(_) => "ENGINE_REQUEST_FAILED",
            AppError::InvalidData(_) => "INVALID_STORED_DATA",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
