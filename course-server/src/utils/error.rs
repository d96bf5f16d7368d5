//! 统一错误处理
//!
//! [`AppError`] is the error type of every HTTP handler. It renders as an
//! [`ActionResponse`] with `status: "error"` and an [`ErrorKind`], the same
//! envelope a successful mutation returns, so the structure editor can show
//! the message directly and decide whether to refetch.
//!
//! | Variant | HTTP | Kind |
//! |---------|------|------|
//! | `Unauthorized` | 401 | `unauthorized` |
//! | `InvalidToken` | 401 | `unauthorized` |
//! | `Forbidden` | 403 | `unauthorized` |
//! | `NotFound` | 404 | `invalid_scope` |
//! | `InvalidScope` | 400 | `invalid_scope` |
//! | `Conflict` | 409 | `stale_scope` |
//! | `Validation` | 400 | `validation` |
//! | `Storage` / `Internal` | 500 | `storage_failure` |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shared::{ActionResponse, ApiResponse, ErrorKind};
use tracing::error;

/// 应用错误枚举
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== 认证错误 (4xx) ==========
    #[error("Authentication required")]
    /// 未登录 (401)
    Unauthorized,

    #[error("Invalid token: {0}")]
    /// 令牌无效或过期 (401)
    InvalidToken(String),

    #[error("Permission denied: {0}")]
    /// 无权限 (403)
    Forbidden(String),

    // ========== 业务逻辑错误 (4xx) ==========
    #[error("Resource not found: {0}")]
    /// 资源不存在 (404)
    NotFound(String),

    #[error("Invalid scope: {0}")]
    /// 请求的 id 与作用域不匹配 (400)
    InvalidScope(String),

    #[error("Conflict: {0}")]
    /// 版本冲突 (409)
    Conflict(String),

    #[error("Validation failed: {0}")]
    /// 验证失败 (400)
    Validation(String),

    // ========== 系统错误 (5xx) ==========
    #[error("Storage failure: {detail}")]
    /// 存储失败 (500)，`message` 面向用户，`detail` 只写日志
    Storage { message: String, detail: String },

    #[error("Internal server error: {0}")]
    /// 内部错误 (500)
    Internal(String),
}

impl AppError {
    pub fn unauthorized() -> Self {
        Self::Unauthorized
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::InvalidToken(msg.into())
    }

    pub fn token_expired() -> Self {
        Self::InvalidToken("Token expired".into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Error kind reported to the client
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Unauthorized | AppError::InvalidToken(_) | AppError::Forbidden(_) => {
                ErrorKind::Unauthorized
            }
            AppError::NotFound(_) | AppError::InvalidScope(_) => ErrorKind::InvalidScope,
            AppError::Conflict(_) => ErrorKind::StaleScope,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Storage { .. } | AppError::Internal(_) => ErrorKind::StorageFailure,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidScope(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Storage { .. } | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();
        let message = match self {
            AppError::Unauthorized => "Caller identity required".to_string(),
            AppError::Storage { message, detail } => {
                error!(target: "database", error = %detail, "Storage failure");
                message
            }
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                "Internal server error".to_string()
            }
            AppError::InvalidToken(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::InvalidScope(msg)
            | AppError::Conflict(msg)
            | AppError::Validation(msg) => msg,
        };

        (status, Json(ActionResponse::error(kind, message))).into_response()
    }
}

// ========== Helper functions ==========

/// Create a successful read response
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::ok(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_kind_mapping() {
        let cases = [
            (AppError::unauthorized(), StatusCode::UNAUTHORIZED, ErrorKind::Unauthorized),
            (AppError::token_expired(), StatusCode::UNAUTHORIZED, ErrorKind::Unauthorized),
            (AppError::forbidden("x"), StatusCode::FORBIDDEN, ErrorKind::Unauthorized),
            (AppError::not_found("x"), StatusCode::NOT_FOUND, ErrorKind::InvalidScope),
            (
                AppError::InvalidScope("x".into()),
                StatusCode::BAD_REQUEST,
                ErrorKind::InvalidScope,
            ),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT, ErrorKind::StaleScope),
            (AppError::validation("x"), StatusCode::BAD_REQUEST, ErrorKind::Validation),
            (
                AppError::Storage {
                    message: "Failed".into(),
                    detail: "disk".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorKind::StorageFailure,
            ),
        ];
        for (err, status, kind) in cases {
            assert_eq!(err.status(), status, "{err}");
            assert_eq!(err.kind(), kind, "{err}");
        }
    }

    #[test]
    fn test_storage_detail_not_exposed() {
        let response = AppError::Storage {
            message: "Failed to reorder lessons".into(),
            detail: "redb commit error".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
