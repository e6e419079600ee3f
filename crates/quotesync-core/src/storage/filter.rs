//! Persisted category filter selection

use tracing::warn;

use super::error::StorageResult;
use super::slots::{SlotStore, FILTER_KEY};
use crate::models::CategoryFilter;

/// The user's last selected category, or "all"
#[derive(Debug, Clone)]
pub struct FilterState {
    slots: SlotStore,
}

impl FilterState {
    pub fn new(slots: SlotStore) -> Self {
        Self { slots }
    }

    /// Persist the selection
    ///
    /// Not checked against the category index; an unknown category simply
    /// filters everything out.
    pub fn save(&self, filter: &CategoryFilter) -> StorageResult<()> {
        self.slots.write(FILTER_KEY, filter.as_str())
    }

    /// Restore the selection, defaulting to `All`
    pub fn load(&self) -> CategoryFilter {
        match self.slots.read(FILTER_KEY) {
            Ok(Some(value)) => CategoryFilter::parse(&value),
            Ok(None) => CategoryFilter::All,
            Err(e) => {
                warn!("Ignoring unreadable filter selection: {}", e);
                CategoryFilter::All
            }
        }
    }
}
