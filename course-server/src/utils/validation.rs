//! Input validation helpers
//!
//! Centralized text length constants and validation functions for course
//! authoring payloads.

use crate::utils::AppError;
use shared::models::{CourseCreate, CourseUpdate, LessonCreate, LessonUpdate, ModuleCreate};

// ── Text length limits ──────────────────────────────────────────────

/// Course, module and lesson titles
pub const MAX_TITLE_LEN: usize = 200;

/// Lesson descriptions
pub const MAX_DESCRIPTION_LEN: usize = 2000;

/// Object storage keys of uploaded media
pub const MAX_MEDIA_KEY_LEN: usize = 512;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

pub fn validate_course_create(payload: &CourseCreate) -> Result<(), AppError> {
    validate_required_text(&payload.title, "title", MAX_TITLE_LEN)
}

pub fn validate_module_create(payload: &ModuleCreate) -> Result<(), AppError> {
    validate_required_text(&payload.title, "title", MAX_TITLE_LEN)
}

pub fn validate_lesson_create(payload: &LessonCreate) -> Result<(), AppError> {
    validate_required_text(&payload.title, "title", MAX_TITLE_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_DESCRIPTION_LEN)?;
    validate_optional_text(&payload.video_key, "video_key", MAX_MEDIA_KEY_LEN)?;
    validate_optional_text(&payload.document_key, "document_key", MAX_MEDIA_KEY_LEN)?;
    Ok(())
}

pub fn validate_course_update(payload: &CourseUpdate) -> Result<(), AppError> {
    match &payload.title {
        Some(title) => validate_required_text(title, "title", MAX_TITLE_LEN),
        None => Err(AppError::validation("No course fields to update")),
    }
}

pub fn validate_lesson_update(payload: &LessonUpdate) -> Result<(), AppError> {
    if payload.is_empty() {
        return Err(AppError::validation("No lesson fields to update"));
    }
    if let Some(title) = &payload.title {
        validate_required_text(title, "title", MAX_TITLE_LEN)?;
    }
    validate_optional_text(&payload.description, "description", MAX_DESCRIPTION_LEN)?;
    validate_optional_text(&payload.video_key, "video_key", MAX_MEDIA_KEY_LEN)?;
    validate_optional_text(&payload.document_key, "document_key", MAX_MEDIA_KEY_LEN)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Intro", "title", 10).is_ok());
        assert!(validate_required_text("   ", "title", 10).is_err());
        assert!(validate_required_text("abcdefghijk", "title", 10).is_err());
    }

    #[test]
    fn test_lesson_create_limits() {
        let mut payload = LessonCreate {
            title: "Ownership".into(),
            ..Default::default()
        };
        assert!(validate_lesson_create(&payload).is_ok());

        payload.description = Some("x".repeat(MAX_DESCRIPTION_LEN + 1));
        let err = validate_lesson_create(&payload).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("description")));
    }

    #[test]
    fn test_update_payloads() {
        assert!(validate_course_update(&CourseUpdate::default()).is_err());
        assert!(validate_course_update(&CourseUpdate {
            title: Some("  ".into())
        })
        .is_err());

        assert!(validate_lesson_update(&LessonUpdate::default()).is_err());
        let rename = LessonUpdate {
            title: Some("Borrowing".into()),
            ..Default::default()
        };
        assert!(validate_lesson_update(&rename).is_ok());
        let long_key = LessonUpdate {
            video_key: Some("k".repeat(MAX_MEDIA_KEY_LEN + 1)),
            ..Default::default()
        };
        assert!(validate_lesson_update(&long_key).is_err());
    }
}
