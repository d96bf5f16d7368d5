//! Data models
//!
//! Shared between course-server and course-client (via API).
//! All IDs are UUID v4 strings.

pub mod course;
pub mod reorder;

// Re-exports
pub use course::*;
pub use reorder::*;
