//! redb-based storage for course structure
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `courses` | `course_id` | `Course` | Root scopes |
//! | `modules` | `module_id` | `CourseModule` | Ordered within a course |
//! | `lessons` | `lesson_id` | `Lesson` | Ordered within a module |
//! | `scope_versions` | `course:{id}` / `module:{id}` | `u64` | Bumped on every committed change of a scope |
//!
//! # Ordering
//!
//! For every parent, sibling positions are exactly `1..=n`. Each mutating
//! operation comes in two flavors: a `*_txn` variant that works inside a
//! caller-owned [`WriteTransaction`], and a standalone variant that opens,
//! runs and commits its own transaction. A transaction dropped without
//! `commit()` is aborted, so a failed multi-row write leaves nothing behind.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, Table, TableDefinition,
    WriteTransaction,
};
use shared::models::{Course, CourseModule, CourseOutline, Lesson, ModuleOutline};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use super::ordered::OrderedRecord;

/// Table for courses: key = course_id, value = JSON-serialized Course
pub(crate) const COURSES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("courses");

/// Table for modules: key = module_id, value = JSON-serialized CourseModule
pub(crate) const MODULES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("modules");

/// Table for lessons: key = lesson_id, value = JSON-serialized Lesson
pub(crate) const LESSONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("lessons");

/// Table for scope versions: key = scope key, value = version counter
const SCOPE_VERSIONS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("scope_versions");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Scope not found: {0}")]
    ScopeNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Ordering invariant violated: {0}")]
    InvariantViolation(String),

    #[cfg(test)]
    #[error("Injected write fault after {0} writes")]
    InjectedFault(usize),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Course structure storage backed by redb
#[derive(Clone)]
pub struct CurriculumStore {
    db: Arc<Database>,
    /// Entries `reposition_txn` may process before it fails
    #[cfg(test)]
    fault_after: Arc<std::sync::atomic::AtomicUsize>,
}

impl CurriculumStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests and ephemeral servers)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        // Create all tables if they don't exist
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(COURSES_TABLE)?;
            let _ = write_txn.open_table(MODULES_TABLE)?;
            let _ = write_txn.open_table(LESSONS_TABLE)?;
            let _ = write_txn.open_table(SCOPE_VERSIONS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(db),
            #[cfg(test)]
            fault_after: Arc::new(std::sync::atomic::AtomicUsize::new(usize::MAX)),
        })
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Run `f` in a fresh write transaction and commit it if `f` succeeds
    fn write<R>(&self, f: impl FnOnce(&WriteTransaction) -> StorageResult<R>) -> StorageResult<R> {
        let txn = self.db.begin_write()?;
        let result = f(&txn)?;
        txn.commit()?;
        Ok(result)
    }

    /// Make `reposition_txn` fail after processing `writes` entries
    #[cfg(test)]
    pub(crate) fn fail_writes_after(&self, writes: usize) {
        self.fault_after
            .store(writes, std::sync::atomic::Ordering::SeqCst);
    }

    // ========== Courses ==========

    /// Create a root scope
    pub fn create_course_txn(&self, txn: &WriteTransaction, course: &Course) -> StorageResult<()> {
        let mut table = txn.open_table(COURSES_TABLE)?;
        let value = serde_json::to_vec(course)?;
        table.insert(course.id.as_str(), value.as_slice())?;
        Ok(())
    }

    pub fn create_course(&self, course: &Course) -> StorageResult<()> {
        self.write(|txn| self.create_course_txn(txn, course))
    }

    /// Rewrite an existing course record
    pub fn update_course_txn(&self, txn: &WriteTransaction, course: &Course) -> StorageResult<()> {
        let mut table = txn.open_table(COURSES_TABLE)?;
        if table.get(course.id.as_str())?.is_none() {
            return Err(StorageError::ScopeNotFound(format!("course:{}", course.id)));
        }
        let value = serde_json::to_vec(course)?;
        table.insert(course.id.as_str(), value.as_slice())?;
        Ok(())
    }

    pub fn find_course(&self, course_id: &str) -> StorageResult<Option<Course>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COURSES_TABLE)?;
        get_record(&table, course_id)
    }

    pub fn find_course_txn(
        &self,
        txn: &WriteTransaction,
        course_id: &str,
    ) -> StorageResult<Option<Course>> {
        let table = txn.open_table(COURSES_TABLE)?;
        get_record(&table, course_id)
    }

    pub fn course_count(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COURSES_TABLE)?;
        Ok(table.len()?)
    }

    // ========== Ordered items ==========

    /// Get a single ordered item by id
    pub fn find<T: OrderedRecord>(&self, id: &str) -> StorageResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(T::TABLE)?;
        get_record(&table, id)
    }

    /// Get a single ordered item by id (within transaction)
    pub fn find_txn<T: OrderedRecord>(
        &self,
        txn: &WriteTransaction,
        id: &str,
    ) -> StorageResult<Option<T>> {
        let table = txn.open_table(T::TABLE)?;
        get_record(&table, id)
    }

    /// Children of a parent, sorted by position
    pub fn children<T: OrderedRecord>(&self, parent_id: &str) -> StorageResult<Vec<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(T::TABLE)?;
        load_children(&table, parent_id)
    }

    /// Children of a parent, sorted by position (within transaction)
    pub fn children_txn<T: OrderedRecord>(
        &self,
        txn: &WriteTransaction,
        parent_id: &str,
    ) -> StorageResult<Vec<T>> {
        let table = txn.open_table(T::TABLE)?;
        load_children(&table, parent_id)
    }

    /// Append a new item at the end of its parent's list
    ///
    /// `build` receives the position assigned to the new item
    /// (`max(sibling positions) + 1`).
    pub fn append_txn<T: OrderedRecord>(
        &self,
        txn: &WriteTransaction,
        parent_id: &str,
        build: impl FnOnce(u32) -> T,
    ) -> StorageResult<T> {
        {
            let parents = txn.open_table(T::PARENT_TABLE)?;
            if parents.get(parent_id)?.is_none() {
                return Err(StorageError::ScopeNotFound(T::scope_key(parent_id)));
            }
        }

        let record = {
            let mut table = txn.open_table(T::TABLE)?;
            let siblings: Vec<T> = load_children(&table, parent_id)?;
            let position = siblings.iter().map(|s| s.position()).max().unwrap_or(0) + 1;
            let record = build(position);
            put_record(&mut table, &record)?;
            record
        };

        self.bump_version_txn(txn, &T::scope_key(parent_id))?;

        tracing::debug!(
            kind = T::KIND,
            id = %record.id(),
            parent_id = %parent_id,
            position = record.position(),
            "Appended ordered item"
        );
        Ok(record)
    }

    pub fn append<T: OrderedRecord>(
        &self,
        parent_id: &str,
        build: impl FnOnce(u32) -> T,
    ) -> StorageResult<T> {
        self.write(|txn| self.append_txn(txn, parent_id, build))
    }

    /// Rewrite an item's content in place
    ///
    /// Parent and position belong to the ordering and may not change here, so
    /// the scope version is left alone.
    pub fn update_txn<T: OrderedRecord>(
        &self,
        txn: &WriteTransaction,
        id: &str,
        edit: impl FnOnce(&mut T),
    ) -> StorageResult<T> {
        let mut table = txn.open_table(T::TABLE)?;
        let mut item: T = get_record(&table, id)?
            .ok_or_else(|| StorageError::ItemNotFound(format!("{} {}", T::KIND, id)))?;
        let parent_id = item.parent_id().to_string();
        let position = item.position();

        edit(&mut item);
        if item.id() != id || item.parent_id() != parent_id || item.position() != position {
            return Err(StorageError::InvariantViolation(format!(
                "update of {} {} changed its place in the ordering",
                T::KIND,
                id
            )));
        }

        put_record(&mut table, &item)?;
        Ok(item)
    }

    /// Delete an item and close the gap it leaves among its siblings
    ///
    /// Records owned by the item are deleted in the same transaction.
    pub fn remove_txn<T: OrderedRecord>(
        &self,
        txn: &WriteTransaction,
        id: &str,
    ) -> StorageResult<T> {
        let removed = {
            let mut table = txn.open_table(T::TABLE)?;
            let removed: T = get_record(&table, id)?
                .ok_or_else(|| StorageError::ItemNotFound(format!("{} {}", T::KIND, id)))?;
            table.remove(id)?;

            // Compact: every later sibling moves up one slot
            let siblings: Vec<T> = load_children(&table, removed.parent_id())?;
            for mut sibling in siblings {
                if sibling.position() > removed.position() {
                    sibling.set_position(sibling.position() - 1);
                    put_record(&mut table, &sibling)?;
                }
            }
            removed
        };

        let purged = T::purge_children_txn(txn, id)?;
        self.bump_version_txn(txn, &T::scope_key(removed.parent_id()))?;

        tracing::debug!(
            kind = T::KIND,
            id = %id,
            parent_id = %removed.parent_id(),
            purged,
            "Removed ordered item"
        );
        Ok(removed)
    }

    pub fn remove<T: OrderedRecord>(&self, id: &str) -> StorageResult<T> {
        self.write(|txn| self.remove_txn(txn, id))
    }

    /// Assign `position = index + 1` in list order
    ///
    /// `ordered_ids` must be exactly the parent's current children, each
    /// once. Returns the new scope version.
    pub fn reposition_txn<T: OrderedRecord>(
        &self,
        txn: &WriteTransaction,
        parent_id: &str,
        ordered_ids: &[String],
    ) -> StorageResult<u64> {
        {
            let mut table = txn.open_table(T::TABLE)?;
            let siblings: Vec<T> = load_children(&table, parent_id)?;

            let current: HashSet<&str> = siblings.iter().map(|s| s.id()).collect();
            let requested: HashSet<&str> = ordered_ids.iter().map(String::as_str).collect();
            if requested.len() != ordered_ids.len() {
                return Err(StorageError::InvariantViolation(format!(
                    "duplicate {} ids for {}",
                    T::KIND,
                    T::scope_key(parent_id)
                )));
            }
            if current != requested {
                return Err(StorageError::InvariantViolation(format!(
                    "{} ids do not match the children of {}",
                    T::KIND,
                    T::scope_key(parent_id)
                )));
            }

            let mut by_id: std::collections::HashMap<String, T> = siblings
                .into_iter()
                .map(|s| (s.id().to_string(), s))
                .collect();

            for (index, id) in ordered_ids.iter().enumerate() {
                #[cfg(test)]
                if index >= self.fault_after.load(std::sync::atomic::Ordering::SeqCst) {
                    return Err(StorageError::InjectedFault(index));
                }

                let Some(mut record) = by_id.remove(id) else {
                    return Err(StorageError::ItemNotFound(format!("{} {}", T::KIND, id)));
                };
                let position = index as u32 + 1;
                if record.position() != position {
                    record.set_position(position);
                    put_record(&mut table, &record)?;
                }
            }
        }

        self.bump_version_txn(txn, &T::scope_key(parent_id))
    }

    pub fn reposition<T: OrderedRecord>(
        &self,
        parent_id: &str,
        ordered_ids: &[String],
    ) -> StorageResult<u64> {
        self.write(|txn| self.reposition_txn::<T>(txn, parent_id, ordered_ids))
    }

    // ========== Scope versions ==========

    /// Current version of a scope (0 if never changed)
    pub fn scope_version(&self, scope_key: &str) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SCOPE_VERSIONS_TABLE)?;
        Ok(table.get(scope_key)?.map(|guard| guard.value()).unwrap_or(0))
    }

    pub fn scope_version_txn(&self, txn: &WriteTransaction, scope_key: &str) -> StorageResult<u64> {
        let table = txn.open_table(SCOPE_VERSIONS_TABLE)?;
        Ok(table.get(scope_key)?.map(|guard| guard.value()).unwrap_or(0))
    }

    /// Increment and return the version of a scope
    pub fn bump_version_txn(&self, txn: &WriteTransaction, scope_key: &str) -> StorageResult<u64> {
        let mut table = txn.open_table(SCOPE_VERSIONS_TABLE)?;
        let current = table.get(scope_key)?.map(|guard| guard.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(scope_key, next)?;
        Ok(next)
    }

    // ========== Outline ==========

    /// Full structure of a course in display order
    pub fn outline(&self, course_id: &str) -> StorageResult<Option<CourseOutline>> {
        let read_txn = self.db.begin_read()?;
        let courses = read_txn.open_table(COURSES_TABLE)?;
        let Some(course) = get_record::<Course>(&courses, course_id)? else {
            return Ok(None);
        };

        let modules_table = read_txn.open_table(MODULES_TABLE)?;
        let lessons_table = read_txn.open_table(LESSONS_TABLE)?;
        let versions = read_txn.open_table(SCOPE_VERSIONS_TABLE)?;

        let version_of = |key: String| -> StorageResult<u64> {
            Ok(versions.get(key.as_str())?.map(|guard| guard.value()).unwrap_or(0))
        };

        let mut modules = Vec::new();
        for module in load_children::<CourseModule>(&modules_table, course_id)? {
            let lessons = load_children::<Lesson>(&lessons_table, &module.id)?;
            let lessons_version = version_of(Lesson::scope_key(&module.id))?;
            modules.push(ModuleOutline {
                module,
                lessons,
                lessons_version,
            });
        }

        Ok(Some(CourseOutline {
            modules_version: version_of(CourseModule::scope_key(course_id))?,
            course,
            modules,
        }))
    }
}

// ========== Table helpers ==========

fn get_record<T: serde::de::DeserializeOwned>(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
    id: &str,
) -> StorageResult<Option<T>> {
    match table.get(id)? {
        Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
        None => Ok(None),
    }
}

fn put_record<T: OrderedRecord>(
    table: &mut Table<'_, &'static str, &'static [u8]>,
    record: &T,
) -> StorageResult<()> {
    let value = serde_json::to_vec(record)?;
    table.insert(record.id(), value.as_slice())?;
    Ok(())
}

/// Scan a table for the children of `parent_id`, sorted by position
fn load_children<T: OrderedRecord>(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
    parent_id: &str,
) -> StorageResult<Vec<T>> {
    let mut children = Vec::new();
    for result in table.iter()? {
        let (_key, value) = result?;
        let record: T = serde_json::from_slice(value.value())?;
        if record.parent_id() == parent_id {
            children.push(record);
        }
    }
    children.sort_by_key(|c| c.position());
    Ok(children)
}

/// Delete every `T` owned by `parent_id`, together with the parent's scope version
pub(crate) fn purge_children_txn<T: OrderedRecord>(
    txn: &WriteTransaction,
    parent_id: &str,
) -> StorageResult<usize> {
    let purged = {
        let mut table = txn.open_table(T::TABLE)?;
        let children: Vec<T> = load_children(&table, parent_id)?;
        for child in &children {
            table.remove(child.id())?;
        }
        children.len()
    };

    let mut versions = txn.open_table(SCOPE_VERSIONS_TABLE)?;
    versions.remove(T::scope_key(parent_id).as_str())?;
    Ok(purged)
}
