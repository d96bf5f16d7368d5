use crate::curriculum::StorageError;
use crate::utils::AppError;
use shared::ErrorKind;
use thiserror::Error;

/// Structure service errors
#[derive(Debug, Error)]
pub enum ReorderError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Scope not found: {0}")]
    ScopeNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("No {0} provided for reordering.")]
    EmptyRequest(&'static str),

    #[error("Duplicate id in reorder request: {0}")]
    DuplicateId(String),

    #[error("Positions must be exactly 1..{0}")]
    PositionsNotContiguous(usize),

    #[error("Reorder ids do not match the current {0}")]
    SiblingMismatch(String),

    #[error("Module {module_id} does not belong to course {course_id}")]
    CrossScope { course_id: String, module_id: String },

    #[error("Siblings reordered concurrently (expected version {expected}, found {actual})")]
    StaleScope { expected: u64, actual: u64 },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl ReorderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReorderError::Unauthorized(_) => ErrorKind::Unauthorized,
            ReorderError::ScopeNotFound(_)
            | ReorderError::ItemNotFound(_)
            | ReorderError::EmptyRequest(_)
            | ReorderError::DuplicateId(_)
            | ReorderError::PositionsNotContiguous(_)
            | ReorderError::SiblingMismatch(_)
            | ReorderError::CrossScope { .. } => ErrorKind::InvalidScope,
            ReorderError::StaleScope { .. } => ErrorKind::StaleScope,
            ReorderError::Validation(_) => ErrorKind::Validation,
            ReorderError::Storage(_) => ErrorKind::StorageFailure,
        }
    }
}

/// Domain errors raised by the store keep their meaning; the rest are storage failures
impl From<StorageError> for ReorderError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ScopeNotFound(scope) => ReorderError::ScopeNotFound(scope),
            StorageError::ItemNotFound(item) => ReorderError::ItemNotFound(item),
            StorageError::InvariantViolation(msg) => ReorderError::SiblingMismatch(msg),
            other => ReorderError::Storage(other),
        }
    }
}

impl From<AppError> for ReorderError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Validation(msg) => ReorderError::Validation(msg),
            other => ReorderError::Validation(other.to_string()),
        }
    }
}

impl ReorderError {
    /// Convert to an HTTP error; `failure_message` is shown for storage failures
    pub fn into_app_error(self, failure_message: &str) -> AppError {
        let message = self.to_string();
        match self {
            ReorderError::Unauthorized(_) => AppError::Forbidden(message),
            ReorderError::ScopeNotFound(_) | ReorderError::ItemNotFound(_) => {
                AppError::NotFound(message)
            }
            ReorderError::EmptyRequest(_)
            | ReorderError::DuplicateId(_)
            | ReorderError::PositionsNotContiguous(_)
            | ReorderError::SiblingMismatch(_)
            | ReorderError::CrossScope { .. } => AppError::InvalidScope(message),
            ReorderError::StaleScope { .. } => AppError::Conflict(message),
            ReorderError::Validation(msg) => AppError::Validation(msg),
            ReorderError::Storage(e) => AppError::Storage {
                message: failure_message.to_string(),
                detail: e.to_string(),
            },
        }
    }
}
