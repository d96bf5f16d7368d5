//! Fixtures for structure tests

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::models::{
    Course, CourseModule, CourseOutline, Lesson, LessonKind, ModuleOutline, ReorderEntry, ScopeRef,
};
use shared::{ActionResponse, ErrorKind};
use tokio::sync::Notify;

use super::ReorderGateway;
use crate::{ClientError, ClientResult};

/// `course-1` with the given modules and lessons, positions 1..n
pub fn outline(modules: &[(&str, &[&str])]) -> CourseOutline {
    CourseOutline {
        course: Course {
            id: "course-1".into(),
            title: "Rust 101".into(),
            owner_id: "instructor-1".into(),
            created_at: 0,
        },
        modules: modules
            .iter()
            .enumerate()
            .map(|(i, (module_id, lessons))| ModuleOutline {
                module: CourseModule {
                    id: module_id.to_string(),
                    course_id: "course-1".into(),
                    title: format!("Module {module_id}"),
                    position: i as u32 + 1,
                    created_at: 0,
                },
                lessons: lessons
                    .iter()
                    .enumerate()
                    .map(|(j, lesson_id)| Lesson {
                        id: lesson_id.to_string(),
                        module_id: module_id.to_string(),
                        title: format!("Lesson {lesson_id}"),
                        description: None,
                        kind: LessonKind::Video,
                        video_key: None,
                        document_key: None,
                        duration_minutes: None,
                        position: j as u32 + 1,
                        created_at: 0,
                    })
                    .collect(),
                lessons_version: 0,
            })
            .collect(),
        modules_version: 0,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub scope: ScopeRef,
    pub entries: Vec<ReorderEntry>,
    pub expected_version: Option<u64>,
}

/// Scripted gateway: succeeds unless a failure was queued
#[derive(Default)]
pub struct MockGateway {
    calls: Mutex<Vec<RecordedCall>>,
    failures: Mutex<VecDeque<ErrorKind>>,
    gate: Option<Arc<Notify>>,
    version: AtomicU64,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every response until `gate` is notified
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    /// Fail the next call with `kind`
    pub fn fail_next(&self, kind: ErrorKind) {
        self.failures.lock().push_back(kind);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    async fn respond(&self, call: RecordedCall) -> ClientResult<ActionResponse> {
        let noun = call.scope.children_noun();
        self.calls.lock().push(call);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let failure = self.failures.lock().pop_front();
        if let Some(kind) = failure {
            return Err(ClientError::action(kind, format!("Failed to reorder {noun}")));
        }
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        let message = if noun == "modules" {
            "Modules reordered successfully"
        } else {
            "Lessons reordered successfully"
        };
        Ok(ActionResponse::success(message).with_version(version))
    }
}

#[async_trait]
impl ReorderGateway for MockGateway {
    async fn reorder_modules(
        &self,
        course_id: &str,
        entries: &[ReorderEntry],
        expected_version: Option<u64>,
    ) -> ClientResult<ActionResponse> {
        self.respond(RecordedCall {
            scope: ScopeRef::course(course_id),
            entries: entries.to_vec(),
            expected_version,
        })
        .await
    }

    async fn reorder_lessons(
        &self,
        module_id: &str,
        entries: &[ReorderEntry],
        course_id: &str,
        expected_version: Option<u64>,
    ) -> ClientResult<ActionResponse> {
        self.respond(RecordedCall {
            scope: ScopeRef::module(course_id, module_id),
            entries: entries.to_vec(),
            expected_version,
        })
        .await
    }
}
