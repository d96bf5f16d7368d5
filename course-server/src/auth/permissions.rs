//! Permission Definitions
//!
//! ## 设计原则
//! - 查看课程结构无需权限
//! - 编辑课程结构需要 `courses:manage`（admin 角色默认拥有）
//! - 只能编辑自己创建的课程，`all` 超级权限除外

/// 课程结构管理（模块/课时 增删、排序）
pub const COURSES_MANAGE: &str = "courses:manage";

/// 超级权限，可编辑任意课程
pub const SUPER_PERMISSION: &str = "all";

/// Default role permissions
pub const DEFAULT_ADMIN_PERMISSIONS: &[&str] = &[COURSES_MANAGE];

/// Get permissions for a role name
pub fn get_default_permissions(role_name: &str) -> Vec<String> {
    match role_name {
        "admin" => DEFAULT_ADMIN_PERMISSIONS
            .iter()
            .map(|s| s.to_string())
            .collect(),
        _ => vec![],
    }
}
