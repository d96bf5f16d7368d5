//! 课程结构存储 - 有序集合模型
//!
//! A course owns an ordered list of modules, a module owns an ordered list
//! of lessons. Both levels share [`OrderedRecord`] and the generic
//! append / remove / reposition operations of [`CurriculumStore`].

pub mod ordered;
pub mod storage;

pub use ordered::OrderedRecord;
pub use storage::{CurriculumStore, StorageError, StorageResult};
