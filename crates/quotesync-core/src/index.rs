//! Category index
//!
//! Derived from the quote collection, never stored.

use std::collections::HashSet;

use crate::models::Quote;

/// Unique categories in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryIndex {
    categories: Vec<String>,
}

impl CategoryIndex {
    /// Scan `quotes` once, keeping the first occurrence of each category
    pub fn derive(quotes: &[Quote]) -> Self {
        let mut seen = HashSet::new();
        let categories = quotes
            .iter()
            .filter(|&q| seen.insert(q.category.as_str()))
            .map(|q| q.category.clone())
            .collect();
        Self { categories }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.categories
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
