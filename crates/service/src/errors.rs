use thiserror::Error;

use models::errors::ModelError;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("invalid position: {0}")]
    InvalidPosition(String),
    #[error("the rack document was changed by another session; reload and try again")]
    Conflict,
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

impl ServiceError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 1001,
            ServiceError::InvalidPosition(_) => 1002,
            ServiceError::Conflict => 1003,
            ServiceError::StorageUnavailable(_) => 1101,
            ServiceError::InvalidDocument(_) => 1102,
        }
    }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => ServiceError::Validation(msg),
            other => ServiceError::InvalidPosition(other.to_string()),
        }
    }
}

impl From<StorageError> for ServiceError {
    /// `NotFound` on a conditional update means the file was deleted after it
    /// was loaded, which is a version change like any other.
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::VersionMismatch | StorageError::NotFound(_) => ServiceError::Conflict,
            StorageError::Unavailable(msg) => ServiceError::StorageUnavailable(msg),
        }
    }
}
