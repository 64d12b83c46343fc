use thiserror::Error;

use crate::model::Status;

/// Core error type for credline operations.
#[derive(Error, Debug)]
pub enum CredlineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: submission is {current}")]
    InvalidTransition { current: Status },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CredlineError {
    fn from(e: serde_json::Error) -> Self {
        CredlineError::Serialization(e.to_string())
    }
}

/// Result type alias using CredlineError.
pub type Result<T> = std::result::Result<T, CredlineError>;
