use async_trait::async_trait;
use shared::models::ReorderEntry;
use shared::ActionResponse;

use crate::ClientResult;

/// Remote side of a reorder
///
/// One call per scope; `entries` is always the complete renumbered list.
#[async_trait]
pub trait ReorderGateway: Send + Sync {
    async fn reorder_modules(
        &self,
        course_id: &str,
        entries: &[ReorderEntry],
        expected_version: Option<u64>,
    ) -> ClientResult<ActionResponse>;

    async fn reorder_lessons(
        &self,
        module_id: &str,
        entries: &[ReorderEntry],
        course_id: &str,
        expected_version: Option<u64>,
    ) -> ClientResult<ActionResponse>;
}
