//! Course structure API 模块
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/courses | POST | 创建课程 |
//! | /api/courses/{course_id} | PUT | 修改课程 |
//! | /api/courses/{course_id}/structure | GET | 课程结构 (模块 + 课时) |
//! | /api/courses/{course_id}/modules | POST | 新建模块 (追加到末尾) |
//! | /api/courses/{course_id}/modules/order | PUT | 模块排序 |
//! | /api/courses/{course_id}/modules/{module_id} | DELETE | 删除模块及其课时 |
//! | /api/courses/{course_id}/modules/{module_id}/lessons | POST | 新建课时 |
//! | /api/courses/{course_id}/modules/{module_id}/lessons/order | PUT | 课时排序 |
//! | /api/courses/{course_id}/modules/{module_id}/lessons/{lesson_id} | PUT | 修改课时内容 |
//! | /api/courses/{course_id}/modules/{module_id}/lessons/{lesson_id} | DELETE | 删除课时 |

mod handler;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/courses", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create_course))
        .route("/{course_id}", put(handler::update_course))
        .route("/{course_id}/structure", get(handler::outline))
        .route("/{course_id}/modules", post(handler::create_module))
        // Sort order update (must be before /{module_id} to avoid path conflicts)
        .route("/{course_id}/modules/order", put(handler::reorder_modules))
        .route("/{course_id}/modules/{module_id}", delete(handler::delete_module))
        .route(
            "/{course_id}/modules/{module_id}/lessons",
            post(handler::create_lesson),
        )
        .route(
            "/{course_id}/modules/{module_id}/lessons/order",
            put(handler::reorder_lessons),
        )
        .route(
            "/{course_id}/modules/{module_id}/lessons/{lesson_id}",
            put(handler::update_lesson).delete(handler::delete_lesson),
        )
}
