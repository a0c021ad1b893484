//! Client error types.

use thiserror::Error;
use vconv_models::{StatusError, ValidationError};

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("A conversion is already in progress ({0})")]
    JobInProgress(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StatusError> for ClientError {
    fn from(err: StatusError) -> Self {
        ClientError::InvalidResponse(err.to_string())
    }
}

impl ClientError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    /// Transport-level failure: the server could not be reached or answered
    /// with something unusable.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Network(_)
                | ClientError::RequestFailed(_)
                | ClientError::InvalidResponse(_)
                | ClientError::Json(_)
        )
    }
}
