//! ReorderService - atomic course structure changes
//!
//! # Reorder Flow
//!
//! ```text
//! submit_reorder(scope, auth, entries, expected_version)
//!     ├─ 1. Role check (may manage courses at all)
//!     ├─ 2. Shape validation (non-empty, unique ids, positions 1..n)
//!     ├─ 3. Begin write transaction
//!     ├─ 4. Ownership check on the course
//!     ├─ 5. Scope check (module belongs to course)
//!     ├─ 6. Version check (only when the client sent one)
//!     ├─ 7. Reposition children + bump scope version
//!     ├─ 8. Commit transaction
//!     └─ 9. Broadcast ScopeInvalidated
//! ```
//!
//! Any error before step 8 drops the transaction, so no position lands.
//! Nothing is retried.

mod error;
pub mod validator;

pub use error::*;

use crate::auth::AuthContext;
use crate::curriculum::{CurriculumStore, StorageError};
use crate::security_log;
use crate::utils::validation::{
    validate_course_create, validate_course_update, validate_lesson_create,
    validate_lesson_update, validate_module_create,
};
use redb::WriteTransaction;
use serde::Serialize;
use shared::models::{
    Course, CourseCreate, CourseModule, CourseOutline, CourseUpdate, Lesson, LessonCreate,
    LessonUpdate, ModuleCreate, ReorderEntry, ScopeRef,
};
use tokio::sync::broadcast;
use validator::ReorderValidator;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Emitted after every committed structure change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StructureEvent {
    /// Cached views of this scope are stale
    ScopeInvalidated { scope: ScopeRef, version: u64 },
}

/// Result of a committed reorder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderConfirmation {
    pub scope: ScopeRef,
    pub version: u64,
    pub message: String,
}

/// Result of a committed create, update or delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation<T> {
    pub value: T,
    pub scope: ScopeRef,
    pub version: u64,
}

/// Course structure service
pub struct ReorderService {
    store: CurriculumStore,
    event_tx: broadcast::Sender<StructureEvent>,
}

impl std::fmt::Debug for ReorderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReorderService")
            .field("store", &"<CurriculumStore>")
            .field("event_tx", &"<broadcast::Sender>")
            .finish()
    }
}

impl ReorderService {
    pub fn new(store: CurriculumStore) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { store, event_tx }
    }

    pub fn store(&self) -> &CurriculumStore {
        &self.store
    }

    /// Subscribe to structure change events
    pub fn subscribe(&self) -> broadcast::Receiver<StructureEvent> {
        self.event_tx.subscribe()
    }

    fn broadcast(&self, scope: ScopeRef, version: u64) {
        // No receivers is fine
        let _ = self
            .event_tx
            .send(StructureEvent::ScopeInvalidated { scope, version });
    }

    /// Persist a new order for all children of `scope` in one transaction
    pub fn submit_reorder(
        &self,
        scope: &ScopeRef,
        auth: &AuthContext,
        entries: &[ReorderEntry],
        expected_version: Option<u64>,
    ) -> Result<ReorderConfirmation, ReorderError> {
        tracing::debug!(
            scope = %scope,
            user_id = %auth.user_id,
            count = entries.len(),
            expected_version = ?expected_version,
            "Reorder request received"
        );

        require_manager(auth)?;
        let ordered_ids = ReorderValidator::new(entries, scope.children_noun()).validate()?;

        let txn = self.store.begin_write()?;
        self.authorize_txn(&txn, auth, scope.course_id())?;

        if let ScopeRef::Module {
            course_id,
            module_id,
        } = scope
        {
            self.module_in_course_txn(&txn, course_id, module_id)?;
        }

        let version_key = scope.version_key();
        if let Some(expected) = expected_version {
            let actual = self.store.scope_version_txn(&txn, &version_key)?;
            if actual != expected {
                tracing::warn!(scope = %scope, expected, actual, "Stale reorder rejected");
                return Err(ReorderError::StaleScope { expected, actual });
            }
        }

        let version = match scope {
            ScopeRef::Course { course_id } => {
                self.store
                    .reposition_txn::<CourseModule>(&txn, course_id, &ordered_ids)?
            }
            ScopeRef::Module { module_id, .. } => {
                self.store
                    .reposition_txn::<Lesson>(&txn, module_id, &ordered_ids)?
            }
        };

        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            scope = %scope,
            user_id = %auth.user_id,
            count = ordered_ids.len(),
            version,
            "Structure reordered"
        );
        self.broadcast(scope.clone(), version);

        Ok(ReorderConfirmation {
            scope: scope.clone(),
            version,
            message: reorder_success_message(scope).to_string(),
        })
    }

    // ========== Authoring ==========

    pub fn create_course(
        &self,
        auth: &AuthContext,
        payload: &CourseCreate,
    ) -> Result<Course, ReorderError> {
        require_manager(auth)?;
        validate_course_create(payload)?;

        let course = Course {
            id: shared::util::new_id(),
            title: payload.title.trim().to_string(),
            owner_id: auth.user_id.clone(),
            created_at: shared::util::now_millis(),
        };
        self.store.create_course(&course)?;

        tracing::info!(course_id = %course.id, owner_id = %course.owner_id, "Course created");
        Ok(course)
    }

    /// Rename a course; only its owner (or `all`) may
    pub fn update_course(
        &self,
        auth: &AuthContext,
        course_id: &str,
        payload: &CourseUpdate,
    ) -> Result<Mutation<Course>, ReorderError> {
        require_manager(auth)?;
        validate_course_update(payload)?;

        let scope = ScopeRef::course(course_id);
        let txn = self.store.begin_write()?;
        let mut course = self.authorize_txn(&txn, auth, course_id)?;
        if let Some(title) = &payload.title {
            course.title = title.trim().to_string();
        }
        self.store.update_course_txn(&txn, &course)?;
        let version = self.store.scope_version_txn(&txn, &scope.version_key())?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(course_id = %course_id, user_id = %auth.user_id, "Course updated");
        self.broadcast(scope.clone(), version);
        Ok(Mutation {
            value: course,
            scope,
            version,
        })
    }

    pub fn create_module(
        &self,
        auth: &AuthContext,
        course_id: &str,
        payload: &ModuleCreate,
    ) -> Result<Mutation<CourseModule>, ReorderError> {
        require_manager(auth)?;
        validate_module_create(payload)?;

        let scope = ScopeRef::course(course_id);
        let txn = self.store.begin_write()?;
        self.authorize_txn(&txn, auth, course_id)?;

        let module = self.store.append_txn(&txn, course_id, |position| CourseModule {
            id: shared::util::new_id(),
            course_id: course_id.to_string(),
            title: payload.title.trim().to_string(),
            position,
            created_at: shared::util::now_millis(),
        })?;
        let version = self.store.scope_version_txn(&txn, &scope.version_key())?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(course_id = %course_id, module_id = %module.id, position = module.position, "Module created");
        self.broadcast(scope.clone(), version);
        Ok(Mutation {
            value: module,
            scope,
            version,
        })
    }

    pub fn create_lesson(
        &self,
        auth: &AuthContext,
        course_id: &str,
        module_id: &str,
        payload: &LessonCreate,
    ) -> Result<Mutation<Lesson>, ReorderError> {
        require_manager(auth)?;
        validate_lesson_create(payload)?;

        let scope = ScopeRef::module(course_id, module_id);
        let txn = self.store.begin_write()?;
        self.authorize_txn(&txn, auth, course_id)?;
        self.module_in_course_txn(&txn, course_id, module_id)?;

        let lesson = self.store.append_txn(&txn, module_id, |position| Lesson {
            id: shared::util::new_id(),
            module_id: module_id.to_string(),
            title: payload.title.trim().to_string(),
            description: payload.description.clone(),
            kind: payload.kind,
            video_key: payload.video_key.clone(),
            document_key: payload.document_key.clone(),
            duration_minutes: payload.duration_minutes,
            position,
            created_at: shared::util::now_millis(),
        })?;
        let version = self.store.scope_version_txn(&txn, &scope.version_key())?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(module_id = %module_id, lesson_id = %lesson.id, position = lesson.position, "Lesson created");
        self.broadcast(scope.clone(), version);
        Ok(Mutation {
            value: lesson,
            scope,
            version,
        })
    }

    /// Edit a lesson's content; its module and position stay as they are
    pub fn update_lesson(
        &self,
        auth: &AuthContext,
        course_id: &str,
        module_id: &str,
        lesson_id: &str,
        payload: &LessonUpdate,
    ) -> Result<Mutation<Lesson>, ReorderError> {
        require_manager(auth)?;
        validate_lesson_update(payload)?;

        let scope = ScopeRef::module(course_id, module_id);
        let txn = self.store.begin_write()?;
        self.authorize_txn(&txn, auth, course_id)?;
        self.module_in_course_txn(&txn, course_id, module_id)?;
        self.lesson_in_module_txn(&txn, module_id, lesson_id)?;

        let lesson = self
            .store
            .update_txn::<Lesson>(&txn, lesson_id, |lesson| payload.apply_to(lesson))?;
        let version = self.store.scope_version_txn(&txn, &scope.version_key())?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(module_id = %module_id, lesson_id = %lesson_id, "Lesson updated");
        self.broadcast(scope.clone(), version);
        Ok(Mutation {
            value: lesson,
            scope,
            version,
        })
    }

    /// Delete a module with its lessons and close the gap among the remaining modules
    pub fn delete_module(
        &self,
        auth: &AuthContext,
        course_id: &str,
        module_id: &str,
    ) -> Result<Mutation<CourseModule>, ReorderError> {
        require_manager(auth)?;

        let scope = ScopeRef::course(course_id);
        let txn = self.store.begin_write()?;
        self.authorize_txn(&txn, auth, course_id)?;
        self.module_in_course_txn(&txn, course_id, module_id)?;

        let removed = self.store.remove_txn::<CourseModule>(&txn, module_id)?;
        let version = self.store.scope_version_txn(&txn, &scope.version_key())?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(course_id = %course_id, module_id = %module_id, "Module deleted");
        self.broadcast(scope.clone(), version);
        Ok(Mutation {
            value: removed,
            scope,
            version,
        })
    }

    /// Delete a lesson and close the gap among the remaining lessons
    pub fn delete_lesson(
        &self,
        auth: &AuthContext,
        course_id: &str,
        module_id: &str,
        lesson_id: &str,
    ) -> Result<Mutation<Lesson>, ReorderError> {
        require_manager(auth)?;

        let scope = ScopeRef::module(course_id, module_id);
        let txn = self.store.begin_write()?;
        self.authorize_txn(&txn, auth, course_id)?;
        self.module_in_course_txn(&txn, course_id, module_id)?;

        self.lesson_in_module_txn(&txn, module_id, lesson_id)?;

        let removed = self.store.remove_txn::<Lesson>(&txn, lesson_id)?;
        let version = self.store.scope_version_txn(&txn, &scope.version_key())?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(module_id = %module_id, lesson_id = %lesson_id, "Lesson deleted");
        self.broadcast(scope.clone(), version);
        Ok(Mutation {
            value: removed,
            scope,
            version,
        })
    }

    /// Full structure of a course
    pub fn outline(&self, course_id: &str) -> Result<CourseOutline, ReorderError> {
        self.store
            .outline(course_id)?
            .ok_or_else(|| ReorderError::ScopeNotFound(format!("course:{course_id}")))
    }

    // ========== Checks ==========

    /// Load the course and check the caller may edit it
    fn authorize_txn(
        &self,
        txn: &WriteTransaction,
        auth: &AuthContext,
        course_id: &str,
    ) -> Result<Course, ReorderError> {
        let course = self
            .store
            .find_course_txn(txn, course_id)?
            .ok_or_else(|| ReorderError::ScopeNotFound(format!("course:{course_id}")))?;

        if !auth.can_edit_course(&course.owner_id) {
            security_log!(
                "WARN",
                "course_edit_denied",
                user_id = auth.user_id.as_str(),
                course_id = course_id
            );
            return Err(ReorderError::Unauthorized(format!(
                "no write access to course {course_id}"
            )));
        }

        Ok(course)
    }

    fn module_in_course_txn(
        &self,
        txn: &WriteTransaction,
        course_id: &str,
        module_id: &str,
    ) -> Result<CourseModule, ReorderError> {
        let module = self
            .store
            .find_txn::<CourseModule>(txn, module_id)?
            .ok_or_else(|| ReorderError::ScopeNotFound(format!("module:{module_id}")))?;

        if module.course_id != course_id {
            return Err(ReorderError::CrossScope {
                course_id: course_id.to_string(),
                module_id: module_id.to_string(),
            });
        }

        Ok(module)
    }

    fn lesson_in_module_txn(
        &self,
        txn: &WriteTransaction,
        module_id: &str,
        lesson_id: &str,
    ) -> Result<Lesson, ReorderError> {
        match self.store.find_txn::<Lesson>(txn, lesson_id)? {
            Some(lesson) if lesson.module_id == module_id => Ok(lesson),
            _ => Err(ReorderError::ItemNotFound(format!("lesson {lesson_id}"))),
        }
    }
}

fn require_manager(auth: &AuthContext) -> Result<(), ReorderError> {
    if !auth.can_manage_courses() {
        security_log!("WARN", "manage_denied", user_id = auth.user_id.as_str());
        return Err(ReorderError::Unauthorized(
            "course management permission required".to_string(),
        ));
    }
    Ok(())
}

pub fn reorder_success_message(scope: &ScopeRef) -> &'static str {
    match scope {
        ScopeRef::Course { .. } => "Modules reordered successfully",
        ScopeRef::Module { .. } => "Lessons reordered successfully",
    }
}

pub fn reorder_failure_message(scope: &ScopeRef) -> &'static str {
    match scope {
        ScopeRef::Course { .. } => "Failed to reorder modules",
        ScopeRef::Module { .. } => "Failed to reorder lessons",
    }
}
