//! Caller identity
//!
//! Login is handled by the upstream auth provider, which issues an HS256 JWT.
//! Every structure mutation carries it as `Authorization: Bearer <token>`;
//! user, role and permissions come only from the verified claims.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::AppError;
use crate::auth::jwt::{Claims, JwtError, JwtService};
use crate::auth::permissions::{COURSES_MANAGE, SUPER_PERMISSION, get_default_permissions};
use crate::core::ServerState;
use crate::security_log;

/// 当前调用者上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// 用户 ID
    pub user_id: String,
    /// 角色名称
    pub role: String,
    /// 权限列表
    pub permissions: Vec<String>,
}

impl AuthContext {
    pub fn new(user_id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: role.into(),
            permissions: vec![],
        }
    }

    pub fn with_permissions(mut self, permissions: &[&str]) -> Self {
        self.permissions = permissions.iter().map(|p| p.to_string()).collect();
        self
    }

    /// 是否管理员
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    /// Holds the `all` permission: may edit every course regardless of owner
    pub fn is_super(&self) -> bool {
        self.permissions.iter().any(|p| p == SUPER_PERMISSION)
    }

    /// 检查是否拥有指定权限
    ///
    /// 管理员和 `all` 拥有所有权限，`"courses:*"` 匹配 `"courses:manage"`
    pub fn has_permission(&self, permission: &str) -> bool {
        if self.is_admin() || self.is_super() {
            return true;
        }

        self.permissions.iter().any(|p| {
            if p == permission {
                return true;
            }
            if let Some(prefix) = p.strip_suffix(":*") {
                permission.starts_with(&format!("{}:", prefix))
            } else {
                false
            }
        })
    }

    /// May edit the structure of courses at all
    pub fn can_manage_courses(&self) -> bool {
        self.has_permission(COURSES_MANAGE)
    }

    /// May edit the structure of a course owned by `owner_id`
    pub fn can_edit_course(&self, owner_id: &str) -> bool {
        self.can_manage_courses() && (self.is_super() || self.user_id == owner_id)
    }
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        let permissions: Vec<String> = claims
            .permissions
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        let permissions = if permissions.is_empty() {
            get_default_permissions(&claims.role)
        } else {
            permissions
        };

        Self {
            user_id: claims.sub,
            role: claims.role,
            permissions,
        }
    }
}

/// Identity extractor
///
/// Validates `Authorization: Bearer <token>`; 401 when missing, malformed,
/// forged or expired.
impl FromRequestParts<ServerState> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<AuthContext>() {
            return Ok(ctx.clone());
        }

        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = match auth_header {
            Some(header) => JwtService::extract_from_header(header)
                .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
            None => {
                security_log!("WARN", "auth_missing", uri = parts.uri.path());
                return Err(AppError::unauthorized());
            }
        };

        match state.get_jwt_service().validate_token(token) {
            Ok(claims) => {
                let ctx = AuthContext::from(claims);
                parts.extensions.insert(ctx.clone());
                Ok(ctx)
            }
            Err(e) => {
                security_log!(
                    "WARN",
                    "auth_failed",
                    error = e.to_string(),
                    uri = parts.uri.path()
                );
                match e {
                    JwtError::ExpiredToken => Err(AppError::token_expired()),
                    _ => Err(AppError::invalid_token("Invalid token")),
                }
            }
        }
    }
}
