//! 认证授权模块
//!
//! 上游认证服务签发 JWT，本模块验证令牌并做权限检查：
//! - [`JwtService`] - 令牌验证 (HS256)
//! - [`AuthContext`] - 当前调用者上下文 (axum extractor)
//! - [`permissions`] - 权限常量

pub mod context;
pub mod jwt;
pub mod permissions;

pub use context::AuthContext;
pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
