//! Store error model.

use fittrack_core::ClientError;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to resolve store location: {0}")]
    Location(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for ClientError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Serialization(e) => ClientError::serialization(e.to_string()),
            other => ClientError::storage(other.to_string()),
        }
    }
}
