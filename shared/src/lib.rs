//! Shared types for the course structure workspace
//!
//! Wire DTOs and domain models used by both `course-server` and
//! `course-client`: course/module/lesson records, reorder payloads,
//! drag payloads and the action/response envelopes.

pub mod error;
pub mod models;
pub mod response;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::ErrorKind;
pub use models::{
    Course, CourseCreate, CourseModule, CourseOutline, CourseUpdate, DragEvent, DragItem,
    DragPayload, Lesson, LessonCreate, LessonKind, LessonUpdate, ModuleCreate, ModuleOutline,
    ReorderEntry, ReorderRequest, ScopeRef,
};
pub use response::{API_CODE_SUCCESS, ActionResponse, ActionStatus, ApiResponse};
