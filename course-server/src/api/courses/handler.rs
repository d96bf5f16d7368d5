//! Course structure API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{
    CourseCreate, CourseOutline, CourseUpdate, LessonCreate, LessonUpdate, ModuleCreate,
    ReorderRequest, ScopeRef,
};
use shared::{ActionResponse, ApiResponse};

use crate::auth::AuthContext;
use crate::core::ServerState;
use crate::reorder::{reorder_failure_message, ReorderError};
use crate::utils::{AppResult, ok};

/// GET /api/courses/{course_id}/structure - 课程结构
pub async fn outline(
    State(state): State<ServerState>,
    Path(course_id): Path<String>,
) -> AppResult<Json<ApiResponse<CourseOutline>>> {
    let outline = state
        .structure
        .outline(&course_id)
        .map_err(|e| e.into_app_error("Failed to load course structure"))?;
    Ok(ok(outline))
}

/// POST /api/courses - 创建课程 (调用者成为所有者)
pub async fn create_course(
    State(state): State<ServerState>,
    auth: AuthContext,
    Json(payload): Json<CourseCreate>,
) -> AppResult<Json<ActionResponse>> {
    let course = state
        .structure
        .create_course(&auth, &payload)
        .map_err(|e| e.into_app_error("Failed to create course"))?;
    Ok(Json(
        ActionResponse::success("Course created successfully").with_id(course.id),
    ))
}

/// PUT /api/courses/{course_id} - 修改课程
pub async fn update_course(
    State(state): State<ServerState>,
    auth: AuthContext,
    Path(course_id): Path<String>,
    Json(payload): Json<CourseUpdate>,
) -> AppResult<Json<ActionResponse>> {
    let updated = state
        .structure
        .update_course(&auth, &course_id, &payload)
        .map_err(|e| e.into_app_error("Failed to update course"))?;
    Ok(Json(
        ActionResponse::success("Course updated successfully").with_id(updated.value.id),
    ))
}

/// POST /api/courses/{course_id}/modules - 新建模块
pub async fn create_module(
    State(state): State<ServerState>,
    auth: AuthContext,
    Path(course_id): Path<String>,
    Json(payload): Json<ModuleCreate>,
) -> AppResult<Json<ActionResponse>> {
    let created = state
        .structure
        .create_module(&auth, &course_id, &payload)
        .map_err(|e| e.into_app_error("Failed to create module"))?;
    Ok(Json(
        ActionResponse::success("Module created successfully")
            .with_id(created.value.id)
            .with_version(created.version),
    ))
}

/// DELETE /api/courses/{course_id}/modules/{module_id} - 删除模块
pub async fn delete_module(
    State(state): State<ServerState>,
    auth: AuthContext,
    Path((course_id, module_id)): Path<(String, String)>,
) -> AppResult<Json<ActionResponse>> {
    let removed = state
        .structure
        .delete_module(&auth, &course_id, &module_id)
        .map_err(|e| e.into_app_error("Failed to delete module"))?;
    Ok(Json(
        ActionResponse::success("Module deleted successfully")
            .with_id(removed.value.id)
            .with_version(removed.version),
    ))
}

/// PUT /api/courses/{course_id}/modules/order - 模块排序
pub async fn reorder_modules(
    State(state): State<ServerState>,
    auth: AuthContext,
    Path(course_id): Path<String>,
    Json(request): Json<ReorderRequest>,
) -> AppResult<Json<ActionResponse>> {
    submit(&state, ScopeRef::course(course_id), &auth, request)
}

/// POST /api/courses/{course_id}/modules/{module_id}/lessons - 新建课时
pub async fn create_lesson(
    State(state): State<ServerState>,
    auth: AuthContext,
    Path((course_id, module_id)): Path<(String, String)>,
    Json(payload): Json<LessonCreate>,
) -> AppResult<Json<ActionResponse>> {
    let created = state
        .structure
        .create_lesson(&auth, &course_id, &module_id, &payload)
        .map_err(|e| e.into_app_error("Failed to create lesson"))?;
    Ok(Json(
        ActionResponse::success("Lesson created successfully")
            .with_id(created.value.id)
            .with_version(created.version),
    ))
}

/// PUT /api/courses/{course_id}/modules/{module_id}/lessons/{lesson_id} - 修改课时内容
pub async fn update_lesson(
    State(state): State<ServerState>,
    auth: AuthContext,
    Path((course_id, module_id, lesson_id)): Path<(String, String, String)>,
    Json(payload): Json<LessonUpdate>,
) -> AppResult<Json<ActionResponse>> {
    let updated = state
        .structure
        .update_lesson(&auth, &course_id, &module_id, &lesson_id, &payload)
        .map_err(|e| e.into_app_error("Failed to update lesson"))?;
    Ok(Json(
        ActionResponse::success("Lesson updated successfully")
            .with_id(updated.value.id)
            .with_version(updated.version),
    ))
}

/// DELETE /api/courses/{course_id}/modules/{module_id}/lessons/{lesson_id} - 删除课时
pub async fn delete_lesson(
    State(state): State<ServerState>,
    auth: AuthContext,
    Path((course_id, module_id, lesson_id)): Path<(String, String, String)>,
) -> AppResult<Json<ActionResponse>> {
    let removed = state
        .structure
        .delete_lesson(&auth, &course_id, &module_id, &lesson_id)
        .map_err(|e| e.into_app_error("Failed to delete lesson"))?;
    Ok(Json(
        ActionResponse::success("Lesson deleted successfully")
            .with_id(removed.value.id)
            .with_version(removed.version),
    ))
}

/// PUT /api/courses/{course_id}/modules/{module_id}/lessons/order - 课时排序
pub async fn reorder_lessons(
    State(state): State<ServerState>,
    auth: AuthContext,
    Path((course_id, module_id)): Path<(String, String)>,
    Json(request): Json<ReorderRequest>,
) -> AppResult<Json<ActionResponse>> {
    submit(&state, ScopeRef::module(course_id, module_id), &auth, request)
}

fn submit(
    state: &ServerState,
    scope: ScopeRef,
    auth: &AuthContext,
    request: ReorderRequest,
) -> AppResult<Json<ActionResponse>> {
    tracing::info!(
        scope = %scope,
        count = request.entries.len(),
        "Reorder request received"
    );

    let confirmation = state
        .structure
        .submit_reorder(&scope, auth, &request.entries, request.expected_version)
        .map_err(|e: ReorderError| {
            tracing::warn!(scope = %scope, kind = %e.kind(), error = %e, "Reorder rejected");
            e.into_app_error(reorder_failure_message(&scope))
        })?;

    Ok(Json(
        ActionResponse::success(confirmation.message).with_version(confirmation.version),
    ))
}
