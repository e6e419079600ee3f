//! The shared, mutable quote collection
//!
//! Pairs the `RecordStore` with its derived `CategoryIndex` so the index
//! is recomputed after every mutation. Local adds and sync cycles both go
//! through a `Library` behind one async mutex.

use tracing::debug;

use crate::index::CategoryIndex;
use crate::models::Quote;
use crate::storage::{RecordStore, StorageResult};

#[derive(Debug)]
pub struct Library {
    records: RecordStore,
    categories: CategoryIndex,
}

impl Library {
    pub fn new(records: RecordStore) -> Self {
        let categories = CategoryIndex::derive(records.all());
        Self {
            records,
            categories,
        }
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn categories(&self) -> &CategoryIndex {
        &self.categories
    }

    /// Append a quote and write the collection immediately
    ///
    /// On a write failure the quote stays in memory; the next successful
    /// write makes it durable.
    pub fn add(&mut self, quote: Quote) -> StorageResult<()> {
        self.records.append(quote);
        self.reindex();
        self.records.persist()
    }

    /// Append several quotes in one write, or none at all
    pub fn extend(&mut self, quotes: Vec<Quote>) -> StorageResult<()> {
        if quotes.is_empty() {
            return Ok(());
        }
        let mut combined = self.records.all().to_vec();
        combined.extend(quotes);
        self.replace(combined)
    }

    /// Persist and adopt a new collection
    pub fn replace(&mut self, quotes: Vec<Quote>) -> StorageResult<()> {
        self.records.commit(quotes)?;
        self.reindex();
        Ok(())
    }

    fn reindex(&mut self) {
        self.categories = CategoryIndex::derive(self.records.all());
        debug!(
            "Category index rebuilt: {} categories over {} quotes",
            self.categories.len(),
            self.records.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SlotStore;
    use tempfile::TempDir;

    fn q(text: &str, category: &str) -> Quote {
        Quote {
            text: text.to_string(),
            category: category.to_string(),
        }
    }

    #[test]
    fn test_index_follows_mutations() {
        let temp_dir = TempDir::new().unwrap();
        let mut library = Library::new(RecordStore::empty(SlotStore::new(temp_dir.path())));
        assert!(library.categories().is_empty());

        library.add(q("A", "Design")).unwrap();
        library.add(q("B", "Code")).unwrap();
        assert_eq!(library.categories().as_slice(), &["Design", "Code"]);

        library.replace(vec![q("C", "Zen")]).unwrap();
        assert_eq!(library.categories().as_slice(), &["Zen"]);
    }

    #[test]
    fn test_add_is_durable() {
        let temp_dir = TempDir::new().unwrap();
        let slots = SlotStore::new(temp_dir.path());
        let mut library = Library::new(RecordStore::load(slots.clone()));

        library.add(q("A", "Design")).unwrap();

        assert_eq!(RecordStore::load(slots).all(), &[q("A", "Design")]);
    }

    #[test]
    fn test_extend_writes_once() {
        let temp_dir = TempDir::new().unwrap();
        let slots = SlotStore::new(temp_dir.path());
        let mut library = Library::new(RecordStore::load(slots.clone()));

        library.add(q("A", "x")).unwrap();
        library.extend(vec![q("B", "y"), q("C", "x")]).unwrap();

        assert_eq!(RecordStore::load(slots).len(), 3);
        assert_eq!(library.categories().len(), 2);
    }
}
