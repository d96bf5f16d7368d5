//! Ordered record abstraction
//!
//! Modules (ordered within a course) and lessons (ordered within a module)
//! share one set of storage operations. [`OrderedRecord`] tells the store
//! which tables hold the record and its parent, and how to read and write
//! the ordering fields.

use redb::{TableDefinition, WriteTransaction};
use serde::{Serialize, de::DeserializeOwned};
use shared::models::{CourseModule, Lesson};

use super::storage::{
    COURSES_TABLE, LESSONS_TABLE, MODULES_TABLE, StorageResult, purge_children_txn,
};

/// JSON-valued table keyed by id
pub type RecordTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// A child record ordered among its siblings by a 1-based `position`
pub trait OrderedRecord: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Table holding records of this kind
    const TABLE: RecordTable;
    /// Table holding the parent scope records
    const PARENT_TABLE: RecordTable;
    /// Prefix of the parent's scope version key (`course` / `module`)
    const PARENT_KIND: &'static str;
    /// Human readable kind used in errors and logs
    const KIND: &'static str;

    fn id(&self) -> &str;
    fn parent_id(&self) -> &str;
    fn position(&self) -> u32;
    fn set_position(&mut self, position: u32);

    /// Scope version key of the given parent
    fn scope_key(parent_id: &str) -> String {
        format!("{}:{}", Self::PARENT_KIND, parent_id)
    }

    /// Delete records owned by this one. Called inside the removing transaction.
    fn purge_children_txn(_txn: &WriteTransaction, _id: &str) -> StorageResult<usize> {
        Ok(0)
    }
}

impl OrderedRecord for CourseModule {
    const TABLE: RecordTable = MODULES_TABLE;
    const PARENT_TABLE: RecordTable = COURSES_TABLE;
    const PARENT_KIND: &'static str = "course";
    const KIND: &'static str = "module";

    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> &str {
        &self.course_id
    }

    fn position(&self) -> u32 {
        self.position
    }

    fn set_position(&mut self, position: u32) {
        self.position = position;
    }

    // A module owns its lessons
    fn purge_children_txn(txn: &WriteTransaction, id: &str) -> StorageResult<usize> {
        purge_children_txn::<Lesson>(txn, id)
    }
}

impl OrderedRecord for Lesson {
    const TABLE: RecordTable = LESSONS_TABLE;
    const PARENT_TABLE: RecordTable = MODULES_TABLE;
    const PARENT_KIND: &'static str = "module";
    const KIND: &'static str = "lesson";

    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> &str {
        &self.module_id
    }

    fn position(&self) -> u32 {
        self.position
    }

    fn set_position(&mut self, position: u32) {
        self.position = position;
    }
}
