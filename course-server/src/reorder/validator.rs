use shared::models::ReorderEntry;
use std::collections::HashSet;

use super::ReorderError;

/// Upper bound on siblings in one request; structures hold tens of items
const REORDER_ENTRIES_LIMIT: usize = 1000;

/// Shape checks that need no storage access
pub struct ReorderValidator<'a> {
    entries: &'a [ReorderEntry],
    noun: &'static str,
}

impl<'a> ReorderValidator<'a> {
    pub fn new(entries: &'a [ReorderEntry], noun: &'static str) -> Self {
        Self { entries, noun }
    }

    /// Validate and return the ids in position order
    pub fn validate(&self) -> Result<Vec<String>, ReorderError> {
        self.validate_not_empty()?;
        self.validate_limit()?;
        self.validate_unique_ids()?;
        self.validate_contiguous_positions()?;

        let mut sorted: Vec<&ReorderEntry> = self.entries.iter().collect();
        sorted.sort_by_key(|e| e.position);
        Ok(sorted.into_iter().map(|e| e.id.clone()).collect())
    }

    fn validate_not_empty(&self) -> Result<(), ReorderError> {
        if self.entries.is_empty() {
            return Err(ReorderError::EmptyRequest(self.noun));
        }

        Ok(())
    }

    fn validate_limit(&self) -> Result<(), ReorderError> {
        if self.entries.len() > REORDER_ENTRIES_LIMIT {
            return Err(ReorderError::Validation(format!(
                "Can not reorder more than {} {}",
                REORDER_ENTRIES_LIMIT, self.noun
            )));
        }

        Ok(())
    }

    fn validate_unique_ids(&self) -> Result<(), ReorderError> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        for entry in self.entries {
            if !seen.insert(entry.id.as_str()) {
                return Err(ReorderError::DuplicateId(entry.id.clone()));
            }
        }

        Ok(())
    }

    fn validate_contiguous_positions(&self) -> Result<(), ReorderError> {
        let n = self.entries.len();
        let mut positions: Vec<u32> = self.entries.iter().map(|e| e.position).collect();
        positions.sort_unstable();

        let contiguous = positions
            .iter()
            .enumerate()
            .all(|(index, &position)| position as usize == index + 1);
        if !contiguous {
            return Err(ReorderError::PositionsNotContiguous(n));
        }

        Ok(())
    }
}
