//! Data models for quotesync
//!
//! Defines the quote record and the typed category filter.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persisted sentinel meaning "no filtering"
pub const ALL_CATEGORIES: &str = "all";

/// A short text tagged with a category
///
/// `text` doubles as the merge key; uniqueness is not enforced here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Quote {
    pub text: String,
    pub category: String,
}

impl Quote {
    /// Create a quote from user input
    ///
    /// Both fields are trimmed and must be non-empty afterwards.
    pub fn new(
        text: impl AsRef<str>,
        category: impl AsRef<str>,
    ) -> Result<Self, ValidationError> {
        let text = text.as_ref().trim();
        let category = category.as_ref().trim();

        if text.is_empty() {
            return Err(ValidationError::EmptyText);
        }
        if category.is_empty() {
            return Err(ValidationError::EmptyCategory);
        }

        Ok(Self {
            text: text.to_string(),
            category: category.to_string(),
        })
    }

    /// The starter quotes shipped with the application
    pub fn defaults() -> Vec<Quote> {
        [
            (
                "The best way to get started is to quit talking and begin doing.",
                "Motivation",
            ),
            (
                "Design is not just what it looks like and feels like. Design is how it works.",
                "Design",
            ),
            (
                "Code is like humor. When you have to explain it, it\u{2019}s bad.",
                "Programming",
            ),
        ]
        .into_iter()
        .map(|(text, category)| Quote {
            text: text.to_string(),
            category: category.to_string(),
        })
        .collect()
    }
}

/// Which quotes the user wants to see
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// No filtering
    #[default]
    All,
    /// Only quotes whose category matches exactly
    Category(String),
}

impl CategoryFilter {
    /// Parse the persisted/user-supplied form; `"all"` is the sentinel
    pub fn parse(value: &str) -> Self {
        if value == ALL_CATEGORIES {
            CategoryFilter::All
        } else {
            CategoryFilter::Category(value.to_string())
        }
    }

    /// The form written to storage
    pub fn as_str(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_CATEGORIES,
            CategoryFilter::Category(category) => category,
        }
    }

    pub fn matches(&self, quote: &Quote) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Category(category) => quote.category == *category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected user input or import payload
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Quote text must not be empty")]
    EmptyText,

    #[error("Quote category must not be empty")]
    EmptyCategory,

    /// Payload is not a JSON array of `{text, category}` objects
    #[error("Import payload is not a list of quotes: {details}")]
    Malformed { details: String },

    /// Payload has the right shape but one entry is unusable
    #[error("Import entry {index} is invalid: {source}")]
    InvalidEntry {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },
}
