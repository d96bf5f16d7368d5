//! Course / Module / Lesson Models

use serde::{Deserialize, Serialize};

/// Course entity (root scope, owns modules)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    /// User that authored the course; only they (or a super admin) may edit it
    pub owner_id: String,
    pub created_at: i64,
}

/// Module entity (ordered within a course, owns lessons)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseModule {
    pub id: String,
    pub course_id: String,
    pub title: String,
    /// 1-based, contiguous among the course's modules
    pub position: u32,
    pub created_at: i64,
}

/// Lesson content type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LessonKind {
    #[default]
    Video,
    Document,
    Quiz,
    Resource,
}

/// Lesson entity (ordered within a module)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub module_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub kind: LessonKind,
    /// Object storage key of the uploaded video
    #[serde(default)]
    pub video_key: Option<String>,
    /// Object storage key of the attached document
    #[serde(default)]
    pub document_key: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    /// 1-based, contiguous among the module's lessons
    pub position: u32,
    pub created_at: i64,
}

/// Create course payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseCreate {
    pub title: String,
}

/// Create module payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleCreate {
    pub title: String,
}

/// Create lesson payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LessonCreate {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub kind: LessonKind,
    pub video_key: Option<String>,
    pub document_key: Option<String>,
    pub duration_minutes: Option<u32>,
}

/// Update course payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseUpdate {
    pub title: Option<String>,
}

/// Update lesson payload
///
/// `None` leaves a field unchanged; an empty string clears an optional text field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LessonUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub kind: Option<LessonKind>,
    pub video_key: Option<String>,
    pub document_key: Option<String>,
    pub duration_minutes: Option<u32>,
}

impl LessonUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.kind.is_none()
            && self.video_key.is_none()
            && self.document_key.is_none()
            && self.duration_minutes.is_none()
    }

    /// Apply to a lesson; ordering fields are untouched
    pub fn apply_to(&self, lesson: &mut Lesson) {
        fn patch(field: &mut Option<String>, value: &Option<String>) {
            if let Some(v) = value {
                let v = v.trim();
                *field = (!v.is_empty()).then(|| v.to_string());
            }
        }

        if let Some(title) = &self.title {
            lesson.title = title.trim().to_string();
        }
        patch(&mut lesson.description, &self.description);
        if let Some(kind) = self.kind {
            lesson.kind = kind;
        }
        patch(&mut lesson.video_key, &self.video_key);
        patch(&mut lesson.document_key, &self.document_key);
        if let Some(duration) = self.duration_minutes {
            lesson.duration_minutes = Some(duration);
        }
    }
}

/// A module with its lessons, as rendered by the structure editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleOutline {
    #[serde(flatten)]
    pub module: CourseModule,
    pub lessons: Vec<Lesson>,
    /// Scope version of this module's lesson list
    #[serde(default)]
    pub lessons_version: u64,
}

impl ModuleOutline {
    pub fn id(&self) -> &str {
        &self.module.id
    }
}

/// Full course structure: modules sorted by position, each with lessons sorted by position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseOutline {
    pub course: Course,
    pub modules: Vec<ModuleOutline>,
    /// Scope version of the course's module list
    #[serde(default)]
    pub modules_version: u64,
}

impl CourseOutline {
    pub fn module(&self, module_id: &str) -> Option<&ModuleOutline> {
        self.modules.iter().find(|m| m.module.id == module_id)
    }

    pub fn module_mut(&mut self, module_id: &str) -> Option<&mut ModuleOutline> {
        self.modules.iter_mut().find(|m| m.module.id == module_id)
    }

    /// Module ids in display order
    pub fn module_ids(&self) -> Vec<String> {
        self.modules.iter().map(|m| m.module.id.clone()).collect()
    }
}
