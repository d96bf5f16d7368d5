//! Course Server - 课程结构编辑服务
//!
//! # 架构概述
//!
//! - **课程结构存储** (`curriculum`): redb 嵌入式存储，模块/课时有序集合
//! - **排序事务** (`reorder`): 原子排序、创建、删除，带权限与作用域检查
//! - **认证** (`auth`): JWT 验证 + 权限检查
//! - **HTTP API** (`api`): axum RESTful 接口
//!
//! # 模块结构
//!
//! ```text
//! course-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT、调用者身份、权限
//! ├── curriculum/    # redb 有序集合存储
//! ├── reorder/       # 结构变更服务
//! ├── api/           # HTTP 路由和处理器
//! ├── middleware/    # 请求日志
//! └── utils/         # 错误、日志、校验
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod curriculum;
pub mod middleware;
pub mod reorder;
pub mod utils;

// Re-export 公共类型
pub use auth::{AuthContext, JwtService};
pub use core::{Config, Server, ServerState};
pub use curriculum::{CurriculumStore, StorageError};
pub use reorder::{ReorderConfirmation, ReorderError, ReorderService, StructureEvent};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
