//! Quote collection persistence
//!
//! `RecordStore` owns the in-memory quote collection and its durable copy
//! in the `records` slot. Loading never fails: a missing slot is an empty
//! collection, and an unreadable one is backed up and treated as empty.

use tracing::{debug, info, warn};

use super::error::{StorageError, StorageResult};
use super::slots::{SlotStore, RECORDS_KEY};
use crate::models::Quote;

/// The authoritative quote collection
#[derive(Debug)]
pub struct RecordStore {
    slots: SlotStore,
    quotes: Vec<Quote>,
}

impl RecordStore {
    /// An empty store backed by `slots`, without reading anything
    pub fn empty(slots: SlotStore) -> Self {
        Self {
            slots,
            quotes: Vec::new(),
        }
    }

    /// Load the persisted collection, defaulting to empty
    pub fn load(slots: SlotStore) -> Self {
        Self::load_checked(slots).0
    }

    /// Load the persisted collection, also reporting a recovered error
    ///
    /// The error (if any) has already been handled; it is returned so the
    /// caller can tell the user their data was reset.
    pub fn load_checked(slots: SlotStore) -> (Self, Option<StorageError>) {
        match read_quotes(&slots) {
            Ok(quotes) => {
                info!("Loaded {} quotes", quotes.len());
                (Self { slots, quotes }, None)
            }
            Err(e) => {
                warn!("Starting with an empty collection: {}", e);
                (Self::empty(slots), Some(e))
            }
        }
    }

    /// Write the whole in-memory collection to the slot
    pub fn persist(&self) -> StorageResult<()> {
        write_quotes(&self.slots, &self.quotes)
    }

    /// Persist a replacement collection, then adopt it
    ///
    /// Memory is only updated once the write has succeeded.
    pub fn commit(&mut self, quotes: Vec<Quote>) -> StorageResult<()> {
        write_quotes(&self.slots, &quotes)?;
        debug!("Committed {} quotes", quotes.len());
        self.quotes = quotes;
        Ok(())
    }

    /// Add a quote in memory; call `persist` to make it durable
    pub fn append(&mut self, quote: Quote) {
        self.quotes.push(quote);
    }

    pub fn all(&self) -> &[Quote] {
        &self.quotes
    }

    /// Quotes whose category matches exactly (case-sensitive)
    pub fn by_category(&self, category: &str) -> Vec<&Quote> {
        self.quotes
            .iter()
            .filter(|q| q.category == category)
            .collect()
    }

    pub fn contains_text(&self, text: &str) -> bool {
        self.quotes.iter().any(|q| q.text == text)
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

fn read_quotes(slots: &SlotStore) -> StorageResult<Vec<Quote>> {
    let content = match slots.read(RECORDS_KEY) {
        Ok(Some(content)) => content,
        Ok(None) => return Ok(Vec::new()),
        // Whatever is on disk is about to be replaced; keep a copy first
        Err(e) => return Err(set_aside(slots, e)),
    };

    serde_json::from_str(&content).map_err(|e| {
        set_aside(
            slots,
            StorageError::InvalidFormat {
                key: RECORDS_KEY.to_string(),
                details: e.to_string(),
            },
        )
    })
}

/// Back up an unusable records slot
///
/// Returns `CorruptSlot` pointing at the backup, or `error` itself when no
/// backup could be made.
fn set_aside(slots: &SlotStore, error: StorageError) -> StorageError {
    match slots.backup(RECORDS_KEY) {
        Ok(backup_path) => StorageError::CorruptSlot {
            key: RECORDS_KEY.to_string(),
            path: slots.path(RECORDS_KEY),
            backup_path,
            details: match error {
                StorageError::InvalidFormat { details, .. } => details,
                other => other.to_string(),
            },
        },
        Err(backup_err) => {
            warn!("Could not back up unreadable records slot: {}", backup_err);
            error
        }
    }
}

fn write_quotes(slots: &SlotStore, quotes: &[Quote]) -> StorageResult<()> {
    let json = serde_json::to_string(quotes).map_err(|e| StorageError::Encode {
        key: RECORDS_KEY.to_string(),
        source: e,
    })?;
    slots.write(RECORDS_KEY, &json)
}
