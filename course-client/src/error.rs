//! Client error types

use shared::ErrorKind;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (connection refused, timeout, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with an error envelope
    #[error("{message}")]
    Action { kind: ErrorKind, message: String },

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    pub fn action(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Action {
            kind,
            message: message.into(),
        }
    }

    /// Failure category as seen by the structure editor
    ///
    /// Transport failures count as storage failures: nothing is known to
    /// have landed, so the optimistic move is rolled back without a refetch.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Action { kind, .. } => *kind,
            ClientError::Unauthorized | ClientError::Forbidden(_) => ErrorKind::Unauthorized,
            ClientError::NotFound(_) => ErrorKind::InvalidScope,
            ClientError::Validation(_) => ErrorKind::Validation,
            ClientError::Http(_)
            | ClientError::InvalidResponse(_)
            | ClientError::Internal(_)
            | ClientError::Serialization(_) => ErrorKind::StorageFailure,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
