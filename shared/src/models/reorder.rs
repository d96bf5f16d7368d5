//! Reorder payloads and drag-and-drop types

use serde::{Deserialize, Serialize};
use std::fmt;

/// One `{id, position}` pair of a reorder request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderEntry {
    pub id: String,
    pub position: u32,
}

impl ReorderEntry {
    pub fn new(id: impl Into<String>, position: u32) -> Self {
        Self {
            id: id.into(),
            position,
        }
    }

    /// Renumber ids in list order, `position = index + 1`
    pub fn from_ids<I, S>(ids: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ids.into_iter()
            .enumerate()
            .map(|(index, id)| Self::new(id, index as u32 + 1))
            .collect()
    }
}

/// Body of `PUT .../order`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderRequest {
    pub entries: Vec<ReorderEntry>,
    /// Last scope version the client observed; `None` means last writer wins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<u64>,
}

/// The Parent Scope whose children are being ordered
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum ScopeRef {
    /// Modules of a course
    Course { course_id: String },
    /// Lessons of a module
    Module { course_id: String, module_id: String },
}

impl ScopeRef {
    pub fn course(course_id: impl Into<String>) -> Self {
        ScopeRef::Course {
            course_id: course_id.into(),
        }
    }

    pub fn module(course_id: impl Into<String>, module_id: impl Into<String>) -> Self {
        ScopeRef::Module {
            course_id: course_id.into(),
            module_id: module_id.into(),
        }
    }

    /// Course that owns the scope (authorization target)
    pub fn course_id(&self) -> &str {
        match self {
            ScopeRef::Course { course_id } | ScopeRef::Module { course_id, .. } => course_id,
        }
    }

    /// Id of the parent whose children are ordered
    pub fn parent_id(&self) -> &str {
        match self {
            ScopeRef::Course { course_id } => course_id,
            ScopeRef::Module { module_id, .. } => module_id,
        }
    }

    /// Storage key of the scope version counter
    pub fn version_key(&self) -> String {
        match self {
            ScopeRef::Course { course_id } => format!("course:{course_id}"),
            ScopeRef::Module { module_id, .. } => format!("module:{module_id}"),
        }
    }

    /// Noun used in user-facing messages ("modules" / "lessons")
    pub fn children_noun(&self) -> &'static str {
        match self {
            ScopeRef::Course { .. } => "modules",
            ScopeRef::Module { .. } => "lessons",
        }
    }
}

impl fmt::Display for ScopeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.version_key())
    }
}

/// Kind tag carried by a draggable item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DragPayload {
    Module,
    Lesson { module_id: String },
}

/// A draggable (or droppable) item: id plus its payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragItem {
    pub id: String,
    pub payload: DragPayload,
}

impl DragItem {
    pub fn module(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payload: DragPayload::Module,
        }
    }

    pub fn lesson(id: impl Into<String>, module_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payload: DragPayload::Lesson {
                module_id: module_id.into(),
            },
        }
    }
}

/// Drag-end event from the UI layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragEvent {
    pub active: DragItem,
    /// Drop target; `None` when dropped outside any item
    pub over: Option<DragItem>,
}

impl DragEvent {
    pub fn new(active: DragItem, over: Option<DragItem>) -> Self {
        Self { active, over }
    }
}
