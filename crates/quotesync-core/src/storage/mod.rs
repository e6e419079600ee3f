//! Storage layer
//!
//! Durable state lives in small key/value slots on disk:
//!
//! - `records`: JSON array of `{text, category}`
//! - `selectedFilter`: category name or `"all"`
//!
//! Session-only values (the last viewed quote) are kept in memory.

pub mod error;
pub mod filter;
pub mod records;
pub mod session;
pub mod slots;

pub use error::{StorageError, StorageResult};
pub use filter::FilterState;
pub use records::RecordStore;
pub use session::SessionState;
pub use slots::{SlotStore, FILTER_KEY, RECORDS_KEY};
