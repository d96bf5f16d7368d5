//! Error classification shared by server and client
//!
//! The server tags every failed action with an [`ErrorKind`] so the client
//! can decide between a plain rollback and a refetch of the outline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure category of a structure action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller lacks write privilege on the course
    Unauthorized,
    /// Ids do not match the scope, scope missing, or malformed entries
    InvalidScope,
    /// Version token no longer matches the stored scope version
    StaleScope,
    /// Payload failed field validation (titles etc.)
    Validation,
    /// Transaction aborted by the store
    StorageFailure,
    /// Client could not map a drag onto a scope; never sent to the server
    ClientResolutionFailure,
}

impl ErrorKind {
    /// Whether the client mirror should be refetched after this failure
    pub fn requires_refetch(&self) -> bool {
        matches!(self, ErrorKind::InvalidScope | ErrorKind::StaleScope)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::InvalidScope => "invalid_scope",
            ErrorKind::StaleScope => "stale_scope",
            ErrorKind::Validation => "validation",
            ErrorKind::StorageFailure => "storage_failure",
            ErrorKind::ClientResolutionFailure => "client_resolution_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
