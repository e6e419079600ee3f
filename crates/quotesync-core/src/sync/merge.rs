//! Remote/local reconciliation
//!
//! Quotes are keyed by their text. The remote snapshot always wins a key
//! collision; local quotes whose text the remote does not know are kept.
//! The rule is not commutative but it is idempotent:
//! `merge(r, merge(r, l)) == merge(r, l)`.
//!
//! Two different quotes that happen to share their text collide, and the
//! remote one silently replaces the local one.

use std::collections::HashMap;

use crate::models::Quote;

/// Counts describing one reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Distinct quotes taken from the remote snapshot
    pub remote: usize,
    /// Local quotes whose category was replaced by the remote's
    pub overridden: usize,
    /// Local quotes kept because the remote does not have them
    pub local_only: usize,
}

impl MergeSummary {
    pub fn total(&self) -> usize {
        self.remote + self.local_only
    }
}

/// Result of reconciling a snapshot with the local collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub quotes: Vec<Quote>,
    pub summary: MergeSummary,
    /// False when the merged collection equals the local one
    pub changed: bool,
}

/// Merge `remote` over `local`
///
/// Output order: remote quotes in snapshot order, then local-only quotes in
/// local order.
pub fn merge(remote: &[Quote], local: &[Quote]) -> Vec<Quote> {
    reconcile(remote, local).quotes
}

/// Merge and report what happened
pub fn reconcile(remote: &[Quote], local: &[Quote]) -> Reconciliation {
    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(remote.len() + local.len());
    let mut quotes: Vec<Quote> = Vec::with_capacity(remote.len() + local.len());

    for quote in remote {
        match positions.get(quote.text.as_str()) {
            // Later duplicates in the snapshot overwrite in place
            Some(&i) => quotes[i] = quote.clone(),
            None => {
                positions.insert(quote.text.as_str(), quotes.len());
                quotes.push(quote.clone());
            }
        }
    }

    let remote_count = quotes.len();
    let mut overridden = 0;

    for quote in local {
        match positions.get(quote.text.as_str()) {
            Some(&i) => {
                if i < remote_count && quotes[i].category != quote.category {
                    overridden += 1;
                }
            }
            None => {
                positions.insert(quote.text.as_str(), quotes.len());
                quotes.push(quote.clone());
            }
        }
    }

    let summary = MergeSummary {
        remote: remote_count,
        overridden,
        local_only: quotes.len() - remote_count,
    };
    let changed = quotes.as_slice() != local;

    Reconciliation {
        quotes,
        summary,
        changed,
    }
}
