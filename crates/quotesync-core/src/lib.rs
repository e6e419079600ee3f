//! quotesync core library
//!
//! A small, durable collection of quotes tagged with categories, kept in step
//! with a remote authoritative HTTP source.
//!
//! # Architecture
//!
//! - **Slots**: durable key/value files (`records`, `selectedFilter`)
//! - **Library**: the in-memory collection plus its derived category index
//! - **Sync**: periodic/manual fetch of the remote snapshot, merged
//!   remote-wins by quote text
//!
//! # Quick Start
//!
//! ```text
//! let mut book = QuoteBook::open(Config::load()?, Notifier::silent())?;
//!
//! book.add_quote("Talk is cheap. Show me the code.", "Programming").await?;
//! let categories = book.categories().await;
//! book.trigger_manual_sync().await;
//! ```
//!
//! # Modules
//!
//! - `book`: the facade presentation code talks to (main entry point)
//! - `models`: quotes and the category filter
//! - `index`: category derivation
//! - `library`: the shared collection
//! - `storage`: slot persistence, filter state, session state
//! - `sync`: remote client, merge, sync orchestration
//! - `notify`: user-facing notifications
//! - `config`: application configuration

pub mod book;
pub mod config;
pub mod index;
pub mod library;
pub mod models;
pub mod notify;
pub mod storage;
pub mod sync;

pub use book::{ImportError, ImportSummary, QuoteBook};
pub use config::Config;
pub use index::CategoryIndex;
pub use library::Library;
pub use models::{CategoryFilter, Quote, ValidationError, ALL_CATEGORIES};
pub use notify::{Notification, NotificationKind, Notifier};
pub use storage::{RecordStore, StorageError};
pub use sync::{
    merge, HttpRemote, MergeSummary, NetworkError, RemoteSource, SyncHandle, SyncOutcome,
    SyncPhase,
};
