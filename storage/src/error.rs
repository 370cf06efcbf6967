use pfm_risk::RiskError;
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// No investment with this id
    #[error("Investment not found: {0}")]
    NotFound(Uuid),

    /// Invalid parameters
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Snapshot encoding or decoding error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Snapshot file error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for StorageError {
    fn from(err: serde_yaml::Error) -> Self {
        StorageError::SerializationError(err.to_string())
    }
}

impl From<StorageError> for RiskError {
    fn from(err: StorageError) -> Self {
        RiskError::Ledger(err.to_string())
    }
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
