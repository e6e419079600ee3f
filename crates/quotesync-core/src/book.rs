//! The collaborator-facing facade
//!
//! `QuoteBook` ties together the quote library, the persisted filter, the
//! session state and (when configured) the remote sync machinery. Presentation
//! code talks to this type only.
//!
//! ## Usage
//!
//! ```ignore
//! let (notifier, mut notifications) = Notifier::channel();
//! let mut book = QuoteBook::open(Config::load()?, notifier)?;
//!
//! book.add_quote("Simplicity is prerequisite for reliability.", "Programming").await?;
//! let quote = book.random_quote(&CategoryFilter::All).await;
//!
//! let handle = book.start_sync();
//! ```
//!
//! Nothing here returns an error for remote failures; those surface as
//! notifications and the local collection stays as it was.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::library::Library;
use crate::models::{CategoryFilter, Quote, ValidationError};
use crate::notify::{NotificationKind, Notifier};
use crate::storage::{
    FilterState, RecordStore, SessionState, SlotStore, StorageError, StorageResult, RECORDS_KEY,
};
use crate::sync::{
    HttpRemote, RemoteSource, SyncHandle, SyncOrchestrator, SyncOutcome, SyncPhase, SyncTrigger,
};

/// What an import did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Quotes appended to the collection
    pub added: usize,
    /// Entries whose text was already present
    pub skipped: usize,
}

/// Why an import was refused
#[derive(Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The quote collection as seen by presentation code
pub struct QuoteBook {
    config: Config,
    library: Arc<Mutex<Library>>,
    filter: FilterState,
    session: SessionState,
    remote: Option<Arc<dyn RemoteSource>>,
    orchestrator: Option<Arc<SyncOrchestrator>>,
    notifier: Notifier,
    pushes: JoinSet<()>,
}

impl QuoteBook {
    /// Open the book described by `config`
    ///
    /// Builds an HTTP remote when sync is enabled and an endpoint is set.
    pub fn open(config: Config, notifier: Notifier) -> Result<Self> {
        let remote: Option<Arc<dyn RemoteSource>> = if config.sync_active() {
            let remote =
                HttpRemote::from_config(&config).context("Failed to set up remote client")?;
            Some(Arc::new(remote))
        } else {
            None
        };
        Self::open_with_remote(config, remote, notifier)
    }

    /// Open the book with an explicit remote (or none)
    pub fn open_with_remote(
        config: Config,
        remote: Option<Arc<dyn RemoteSource>>,
        notifier: Notifier,
    ) -> Result<Self> {
        let slots = SlotStore::new(config.slot_dir());

        let (records, recovered) = RecordStore::load_checked(slots.clone());
        if let Some(e) = recovered {
            let mut message = if e.is_corruption() {
                format!("Saved quotes were corrupted and have been reset: {}", e)
            } else {
                format!("Saved quotes could not be read; starting empty: {}", e)
            };
            if let Some(suggestion) = e.recovery_suggestion() {
                message.push_str(&format!(" ({})", suggestion));
            }
            notifier.notify(NotificationKind::StorageRecovered, message);
        }

        let library = Arc::new(Mutex::new(Library::new(records)));

        let orchestrator = remote.as_ref().map(|remote| {
            Arc::new(SyncOrchestrator::new(
                Arc::clone(remote),
                Arc::clone(&library),
                notifier.clone(),
                config.request_timeout(),
            ))
        });

        info!(
            "Opened quote book at {:?} (sync {})",
            slots.dir(),
            if orchestrator.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            config,
            library,
            filter: FilterState::new(slots),
            session: SessionState::new(),
            remote,
            orchestrator,
            notifier,
            pushes: JoinSet::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ==================== Reading ====================

    /// Every quote, in collection order
    pub async fn all_quotes(&self) -> Vec<Quote> {
        self.library.lock().await.records().all().to_vec()
    }

    /// Quotes the given filter lets through
    pub async fn quotes_in(&self, filter: &CategoryFilter) -> Vec<Quote> {
        match filter {
            CategoryFilter::All => self.all_quotes().await,
            CategoryFilter::Category(category) => self
                .library
                .lock()
                .await
                .records()
                .by_category(category)
                .into_iter()
                .cloned()
                .collect(),
        }
    }

    /// Quotes the persisted filter lets through
    pub async fn filtered_quotes(&self) -> Vec<Quote> {
        let filter = self.filter();
        self.quotes_in(&filter).await
    }

    /// Pick a quote uniformly at random and remember it as last viewed
    ///
    /// Returns `None` when nothing matches the filter.
    pub async fn random_quote(&mut self, filter: &CategoryFilter) -> Option<Quote> {
        let candidates = self.quotes_in(filter).await;
        if candidates.is_empty() {
            debug!("No quotes match filter {}", filter);
            return None;
        }
        let quote = candidates[rand::random_range(0..candidates.len())].clone();
        self.session.set_last_viewed(quote.text.as_str());
        Some(quote)
    }

    /// Unique categories in first-seen order
    pub async fn categories(&self) -> Vec<String> {
        self.library.lock().await.categories().as_slice().to_vec()
    }

    pub async fn has_category(&self, category: &str) -> bool {
        self.library.lock().await.categories().contains(category)
    }

    /// Text of the quote most recently returned by `random_quote`
    pub fn last_viewed(&self) -> Option<&str> {
        self.session.last_viewed()
    }

    // ==================== Filter ====================

    /// Persist the selected filter
    ///
    /// The category is not checked against the index.
    pub fn set_filter(&self, filter: &CategoryFilter) -> StorageResult<()> {
        self.filter.save(filter)
    }

    /// The persisted filter, `All` if none is stored
    pub fn filter(&self) -> CategoryFilter {
        self.filter.load()
    }

    // ==================== Writing ====================

    /// Validate, append and persist a quote, then push it in the background
    ///
    /// A failed local write keeps the quote in memory and raises a
    /// notification. A failed push only raises a notification; the quote
    /// stays local and survives the next sync because the remote does not
    /// know its text.
    pub async fn add_quote(
        &mut self,
        text: &str,
        category: &str,
    ) -> Result<Quote, ValidationError> {
        let quote = Quote::new(text, category)?;

        if let Err(e) = self.library.lock().await.add(quote.clone()) {
            let retry = if e.is_recoverable() {
                " It will be saved with the next successful write."
            } else {
                ""
            };
            self.notifier.notify(
                NotificationKind::StorageFailed,
                format!("Quote added but not saved: {}.{}", e, retry),
            );
        }
        info!("Added quote in category {}", quote.category);

        self.reap_pushes();

        if let Some(ref remote) = self.remote {
            let remote = Arc::clone(remote);
            let notifier = self.notifier.clone();
            let pushed = quote.clone();
            self.pushes.spawn(async move {
                match remote.push_record(&pushed).await {
                    Ok(()) => debug!("Pushed quote to {}", remote.endpoint()),
                    Err(e) => notifier.notify(
                        NotificationKind::PushFailed,
                        format!("Could not send quote to server: {}", e),
                    ),
                }
            });
        }

        Ok(quote)
    }

    /// Drop pushes that have already finished
    fn reap_pushes(&mut self) {
        while let Some(result) = self.pushes.try_join_next() {
            if let Err(e) = result {
                warn!("Push task ended abnormally: {}", e);
            }
        }
    }

    /// Wait for background pushes started by `add_quote`
    pub async fn flush_pushes(&mut self) {
        while let Some(result) = self.pushes.join_next().await {
            if let Err(e) = result {
                warn!("Push task ended abnormally: {}", e);
            }
        }
    }

    /// Add the starter quotes whose text is not present yet
    ///
    /// Returns how many were added.
    pub async fn seed_defaults(&self) -> StorageResult<usize> {
        let mut library = self.library.lock().await;
        let missing: Vec<Quote> = Quote::defaults()
            .into_iter()
            .filter(|q| !library.records().contains_text(&q.text))
            .collect();
        let added = missing.len();
        library.extend(missing)?;
        Ok(added)
    }

    // ==================== Import / export ====================

    /// The whole collection as pretty-printed JSON
    pub async fn export_json(&self) -> StorageResult<String> {
        let library = self.library.lock().await;
        serde_json::to_string_pretty(library.records().all()).map_err(|e| StorageError::Encode {
            key: RECORDS_KEY.to_string(),
            source: e,
        })
    }

    /// Append quotes from a JSON array, all or nothing
    ///
    /// Any malformed or blank entry rejects the whole payload. Entries whose
    /// text already exists (locally or earlier in the payload) are skipped.
    pub async fn import_json(&self, payload: &str) -> Result<ImportSummary, ImportError> {
        let result = self.apply_import(payload).await;
        match &result {
            Ok(summary) => self.notifier.notify(
                NotificationKind::ImportCompleted,
                format!(
                    "Imported {} quotes ({} already present)",
                    summary.added, summary.skipped
                ),
            ),
            Err(e) => self.notifier.notify(
                NotificationKind::ImportRejected,
                format!("Import rejected: {}", e),
            ),
        }
        result
    }

    async fn apply_import(&self, payload: &str) -> Result<ImportSummary, ImportError> {
        let incoming = parse_import(payload)?;

        let mut library = self.library.lock().await;
        let mut seen: HashSet<String> = library
            .records()
            .all()
            .iter()
            .map(|q| q.text.clone())
            .collect();

        let total = incoming.len();
        let fresh: Vec<Quote> = incoming
            .into_iter()
            .filter(|q| seen.insert(q.text.clone()))
            .collect();
        let summary = ImportSummary {
            added: fresh.len(),
            skipped: total - fresh.len(),
        };

        library.extend(fresh)?;
        Ok(summary)
    }

    // ==================== Sync ====================

    /// Run one sync cycle now
    ///
    /// Dropped (`Skipped`) if a cycle is already in flight.
    pub async fn trigger_manual_sync(&self) -> SyncOutcome {
        match self.orchestrator {
            Some(ref orchestrator) => orchestrator.run_cycle(SyncTrigger::Manual).await,
            None => {
                debug!("Manual sync requested but no remote is configured");
                SyncOutcome::Disabled
            }
        }
    }

    /// Start periodic syncing at the configured interval
    ///
    /// Returns `None` when no remote is configured.
    pub fn start_sync(&self) -> Option<SyncHandle> {
        self.orchestrator
            .as_ref()
            .map(|orchestrator| orchestrator.start(self.config.sync_interval()))
    }

    pub fn sync_phase(&self) -> SyncPhase {
        self.orchestrator
            .as_ref()
            .map_or(SyncPhase::Idle, |orchestrator| orchestrator.phase())
    }

    pub fn sync_enabled(&self) -> bool {
        self.orchestrator.is_some()
    }
}

impl Drop for QuoteBook {
    fn drop(&mut self) {
        // Pushes still in flight finish on the runtime instead of being aborted
        self.pushes.detach_all();
    }
}

/// Parse and normalize an import payload
fn parse_import(payload: &str) -> Result<Vec<Quote>, ValidationError> {
    let entries: Vec<Quote> =
        serde_json::from_str(payload).map_err(|e| ValidationError::Malformed {
            details: e.to_string(),
        })?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            Quote::new(&entry.text, &entry.category).map_err(|e| ValidationError::InvalidEntry {
                index,
                source: Box::new(e),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Notification;
    use crate::sync::NetworkError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::{mpsc, Notify};

    fn q(text: &str, category: &str) -> Quote {
        Quote {
            text: text.to_string(),
            category: category.to_string(),
        }
    }

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            sync_interval_secs: 1,
            request_timeout_secs: 2,
            ..Default::default()
        }
    }

    /// In-memory remote with switchable connectivity
    struct FakeRemote {
        snapshot: std::sync::Mutex<Vec<Quote>>,
        online: std::sync::atomic::AtomicBool,
        gate: Option<Arc<Notify>>,
        fetches: AtomicUsize,
        pushed: std::sync::Mutex<Vec<Quote>>,
    }

    impl FakeRemote {
        fn new(snapshot: Vec<Quote>) -> Self {
            Self {
                snapshot: std::sync::Mutex::new(snapshot),
                online: std::sync::atomic::AtomicBool::new(true),
                gate: None,
                fetches: AtomicUsize::new(0),
                pushed: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn set_online(&self, online: bool) {
            self.online.store(online, Ordering::SeqCst);
        }

        fn offline_error(&self) -> NetworkError {
            NetworkError::Status {
                url: "fake://quotes".to_string(),
                status: 503,
            }
        }
    }

    #[async_trait]
    impl RemoteSource for FakeRemote {
        fn endpoint(&self) -> &str {
            "fake://quotes"
        }

        async fn fetch_remote(&self) -> Result<Vec<Quote>, NetworkError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(ref gate) = self.gate {
                gate.notified().await;
            }
            if !self.online.load(Ordering::SeqCst) {
                return Err(self.offline_error());
            }
            Ok(self.snapshot.lock().unwrap().clone())
        }

        async fn push_record(&self, quote: &Quote) -> Result<(), NetworkError> {
            if !self.online.load(Ordering::SeqCst) {
                return Err(self.offline_error());
            }
            self.pushed.lock().unwrap().push(quote.clone());
            Ok(())
        }
    }

    fn open_with(
        temp_dir: &TempDir,
        remote: Option<Arc<FakeRemote>>,
    ) -> (QuoteBook, mpsc::UnboundedReceiver<Notification>) {
        let (notifier, rx) = Notifier::channel();
        let remote = remote.map(|r| r as Arc<dyn RemoteSource>);
        let book = QuoteBook::open_with_remote(test_config(temp_dir), remote, notifier).unwrap();
        (book, rx)
    }

    #[tokio::test]
    async fn test_add_quote_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let (mut book, _rx) = open_with(&temp_dir, None);
            book.add_quote(" Less is more ", "Design").await.unwrap();
        }

        let (book, _rx) = open_with(&temp_dir, None);
        assert_eq!(book.all_quotes().await, vec![q("Less is more", "Design")]);
        assert_eq!(book.categories().await, vec!["Design"]);
    }

    #[tokio::test]
    async fn test_add_quote_rejects_blank_input() {
        let temp_dir = TempDir::new().unwrap();
        let (mut book, _rx) = open_with(&temp_dir, None);

        assert!(matches!(
            book.add_quote("", "Design").await,
            Err(ValidationError::EmptyText)
        ));
        assert!(book.all_quotes().await.is_empty());
    }

    #[tokio::test]
    async fn test_categories_unique_first_seen() {
        let temp_dir = TempDir::new().unwrap();
        let (mut book, _rx) = open_with(&temp_dir, None);
        book.add_quote("1", "a").await.unwrap();
        book.add_quote("2", "b").await.unwrap();
        book.add_quote("3", "a").await.unwrap();

        assert_eq!(book.categories().await, vec!["a", "b"]);
        assert!(book.has_category("b").await);
        assert!(!book.has_category("B").await);
    }

    #[tokio::test]
    async fn test_filter_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let (book, _rx) = open_with(&temp_dir, None);
            assert_eq!(book.filter(), CategoryFilter::All);
            book.set_filter(&CategoryFilter::parse("Design")).unwrap();
        }

        let (book, _rx) = open_with(&temp_dir, None);
        assert_eq!(
            book.filter(),
            CategoryFilter::Category("Design".to_string())
        );
    }

    #[tokio::test]
    async fn test_filtered_quotes_follow_filter() {
        let temp_dir = TempDir::new().unwrap();
        let (mut book, _rx) = open_with(&temp_dir, None);
        book.add_quote("1", "a").await.unwrap();
        book.add_quote("2", "b").await.unwrap();

        book.set_filter(&CategoryFilter::parse("b")).unwrap();
        assert_eq!(book.filtered_quotes().await, vec![q("2", "b")]);

        book.set_filter(&CategoryFilter::parse("gone")).unwrap();
        assert!(book.filtered_quotes().await.is_empty());

        book.set_filter(&CategoryFilter::All).unwrap();
        assert_eq!(book.filtered_quotes().await.len(), 2);
    }

    #[tokio::test]
    async fn test_random_quote_records_last_viewed() {
        let temp_dir = TempDir::new().unwrap();
        let (mut book, _rx) = open_with(&temp_dir, None);
        assert!(book.random_quote(&CategoryFilter::All).await.is_none());
        assert!(book.last_viewed().is_none());

        book.add_quote("1", "a").await.unwrap();
        book.add_quote("2", "b").await.unwrap();

        let picked = book
            .random_quote(&CategoryFilter::parse("b"))
            .await
            .unwrap();
        assert_eq!(picked, q("2", "b"));
        assert_eq!(book.last_viewed(), Some("2"));
    }

    #[tokio::test]
    async fn test_last_viewed_is_not_persisted() {
        let temp_dir = TempDir::new().unwrap();
        {
            let (mut book, _rx) = open_with(&temp_dir, None);
            book.add_quote("1", "a").await.unwrap();
            book.random_quote(&CategoryFilter::All).await.unwrap();
            assert!(book.last_viewed().is_some());
        }

        let (book, _rx) = open_with(&temp_dir, None);
        assert!(book.last_viewed().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_records_reset_with_notification() {
        let temp_dir = TempDir::new().unwrap();
        let slots = SlotStore::new(test_config(&temp_dir).slot_dir());
        slots.write(RECORDS_KEY, "{not json").unwrap();

        let (book, mut rx) = open_with(&temp_dir, None);

        assert!(book.all_quotes().await.is_empty());
        let n = rx.recv().await.unwrap();
        assert_eq!(n.kind, NotificationKind::StorageRecovered);
        assert!(slots.exists("records.corrupt.backup"));
    }

    #[tokio::test]
    async fn test_unreadable_records_survive_in_backup_after_add() {
        let temp_dir = TempDir::new().unwrap();
        let slots = SlotStore::new(test_config(&temp_dir).slot_dir());
        let original = b"[{\"text\":\"Caf\xe9\",\"category\":\"X\"}]".to_vec();
        std::fs::create_dir_all(slots.dir()).unwrap();
        std::fs::write(slots.path(RECORDS_KEY), &original).unwrap();

        let (mut book, mut rx) = open_with(&temp_dir, None);
        assert_eq!(
            rx.recv().await.unwrap().kind,
            NotificationKind::StorageRecovered
        );

        book.add_quote("New", "Y").await.unwrap();

        let backup = slots.path("records.corrupt.backup");
        assert_eq!(std::fs::read(backup).unwrap(), original);
        assert_eq!(book.all_quotes().await, vec![q("New", "Y")]);
    }

    #[tokio::test]
    async fn test_offline_add_survives_later_sync() {
        let temp_dir = TempDir::new().unwrap();
        let remote = Arc::new(FakeRemote::new(vec![q("R", "Remote")]));
        remote.set_online(false);
        let (mut book, mut rx) = open_with(&temp_dir, Some(Arc::clone(&remote)));

        book.add_quote("Z", "New").await.unwrap();
        book.flush_pushes().await;

        assert_eq!(rx.recv().await.unwrap().kind, NotificationKind::PushFailed);
        assert_eq!(book.all_quotes().await, vec![q("Z", "New")]);

        remote.set_online(true);
        let outcome = book.trigger_manual_sync().await;

        assert!(outcome.is_completed());
        assert_eq!(
            book.all_quotes().await,
            vec![q("R", "Remote"), q("Z", "New")]
        );
        assert_eq!(rx.recv().await.unwrap().kind, NotificationKind::SyncSucceeded);
    }

    #[tokio::test]
    async fn test_push_sends_added_quote() {
        let temp_dir = TempDir::new().unwrap();
        let remote = Arc::new(FakeRemote::new(vec![]));
        let (mut book, _rx) = open_with(&temp_dir, Some(Arc::clone(&remote)));

        book.add_quote("A", "X").await.unwrap();
        book.flush_pushes().await;

        assert_eq!(*remote.pushed.lock().unwrap(), vec![q("A", "X")]);
    }

    #[tokio::test]
    async fn test_finished_pushes_are_reaped_on_add() {
        let temp_dir = TempDir::new().unwrap();
        let remote = Arc::new(FakeRemote::new(vec![]));
        let (mut book, _rx) = open_with(&temp_dir, Some(Arc::clone(&remote)));

        for i in 0..20 {
            book.add_quote(&format!("Quote {}", i), "X").await.unwrap();
            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
        }

        assert!(book.pushes.len() <= 1);
        assert_eq!(remote.pushed.lock().unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_dropping_book_lets_pending_push_finish() {
        let temp_dir = TempDir::new().unwrap();
        let remote = Arc::new(FakeRemote::new(vec![]));
        let (mut book, _rx) = open_with(&temp_dir, Some(Arc::clone(&remote)));

        book.add_quote("Last words", "X").await.unwrap();
        drop(book);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert_eq!(*remote.pushed.lock().unwrap(), vec![q("Last words", "X")]);
    }

    #[tokio::test]
    async fn test_manual_sync_while_syncing_is_dropped() {
        let temp_dir = TempDir::new().unwrap();
        let gate = Arc::new(Notify::new());
        let mut remote = FakeRemote::new(vec![q("R", "Remote")]);
        remote.gate = Some(Arc::clone(&gate));
        let remote = Arc::new(remote);
        let (book, _rx) = open_with(&temp_dir, Some(Arc::clone(&remote)));

        let (first, second) = tokio::join!(book.trigger_manual_sync(), async {
            while book.sync_phase() != SyncPhase::Syncing {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            let second = book.trigger_manual_sync().await;
            assert_eq!(book.sync_phase(), SyncPhase::Syncing);

            let third = book.trigger_manual_sync().await;
            assert!(matches!(third, SyncOutcome::Skipped));
            assert_eq!(remote.fetches.load(Ordering::SeqCst), 1);
            assert_eq!(book.sync_phase(), SyncPhase::Syncing);

            gate.notify_one();
            second
        });

        assert!(matches!(second, SyncOutcome::Skipped));
        assert!(first.is_completed());
        assert_eq!(remote.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(book.all_quotes().await, vec![q("R", "Remote")]);
        assert_eq!(book.sync_phase(), SyncPhase::Idle);
    }

    #[tokio::test]
    async fn test_failed_sync_leaves_collection_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let remote = Arc::new(FakeRemote::new(vec![q("A", "Y")]));
        remote.set_online(false);
        let (mut book, mut rx) = open_with(&temp_dir, Some(Arc::clone(&remote)));
        book.add_quote("A", "X").await.unwrap();
        book.flush_pushes().await;
        let _push_failed = rx.recv().await.unwrap();

        let outcome = book.trigger_manual_sync().await;

        assert!(matches!(outcome, SyncOutcome::Failed(_)));
        assert_eq!(book.all_quotes().await, vec![q("A", "X")]);
        assert_eq!(rx.recv().await.unwrap().kind, NotificationKind::SyncFailed);
    }

    #[tokio::test]
    async fn test_sync_disabled_without_remote() {
        let temp_dir = TempDir::new().unwrap();
        let (book, _rx) = open_with(&temp_dir, None);

        assert!(matches!(
            book.trigger_manual_sync().await,
            SyncOutcome::Disabled
        ));
        assert!(book.start_sync().is_none());
        assert!(!book.sync_enabled());
    }

    #[tokio::test]
    async fn test_start_sync_runs_cycles() {
        let temp_dir = TempDir::new().unwrap();
        let remote = Arc::new(FakeRemote::new(vec![q("R", "Remote")]));
        let (book, mut rx) = open_with(&temp_dir, Some(Arc::clone(&remote)));

        let handle = book.start_sync().unwrap();
        let n = rx.recv().await.unwrap();
        handle.stop().await;

        assert_eq!(n.kind, NotificationKind::SyncSucceeded);
        assert_eq!(book.all_quotes().await, vec![q("R", "Remote")]);
    }

    #[tokio::test]
    async fn test_import_appends_and_skips_known_texts() {
        let temp_dir = TempDir::new().unwrap();
        let (mut book, mut rx) = open_with(&temp_dir, None);
        book.add_quote("A", "X").await.unwrap();

        let summary = book
            .import_json(
                r#"[{"text":"A","category":"Other"},{"text":" B ","category":"Y"},{"text":"B","category":"Z"}]"#,
            )
            .await
            .unwrap();

        assert_eq!(summary, ImportSummary { added: 1, skipped: 2 });
        assert_eq!(book.all_quotes().await, vec![q("A", "X"), q("B", "Y")]);
        assert_eq!(
            rx.recv().await.unwrap().kind,
            NotificationKind::ImportCompleted
        );
    }

    #[tokio::test]
    async fn test_import_rejects_malformed_payload_whole() {
        let temp_dir = TempDir::new().unwrap();
        let (mut book, mut rx) = open_with(&temp_dir, None);
        book.add_quote("A", "X").await.unwrap();

        let not_a_list = book.import_json(r#"{"text":"B","category":"Y"}"#).await;
        assert!(matches!(
            not_a_list,
            Err(ImportError::Invalid(ValidationError::Malformed { .. }))
        ));

        let blank_entry = book
            .import_json(r#"[{"text":"B","category":"Y"},{"text":"  ","category":"Y"}]"#)
            .await;
        assert!(matches!(
            blank_entry,
            Err(ImportError::Invalid(ValidationError::InvalidEntry { index: 1, .. }))
        ));

        assert_eq!(book.all_quotes().await, vec![q("A", "X")]);
        assert_eq!(rx.recv().await.unwrap().kind, NotificationKind::ImportRejected);
        assert_eq!(rx.recv().await.unwrap().kind, NotificationKind::ImportRejected);
    }

    #[tokio::test]
    async fn test_export_then_import_into_fresh_book() {
        let source_dir = TempDir::new().unwrap();
        let (mut source, _rx) = open_with(&source_dir, None);
        source.add_quote("A", "X").await.unwrap();
        source.add_quote("B", "Y").await.unwrap();
        let exported = source.export_json().await.unwrap();

        let target_dir = TempDir::new().unwrap();
        let (target, _rx) = open_with(&target_dir, None);
        target.import_json(&exported).await.unwrap();

        assert_eq!(target.all_quotes().await, source.all_quotes().await);
    }

    #[tokio::test]
    async fn test_seed_defaults_only_once() {
        let temp_dir = TempDir::new().unwrap();
        let (book, _rx) = open_with(&temp_dir, None);

        assert_eq!(book.seed_defaults().await.unwrap(), 3);
        assert_eq!(book.seed_defaults().await.unwrap(), 0);
        assert_eq!(
            book.categories().await,
            vec!["Motivation", "Design", "Programming"]
        );
    }

    #[tokio::test]
    async fn test_periodic_trigger_uses_orchestrator() {
        let temp_dir = TempDir::new().unwrap();
        let remote = Arc::new(FakeRemote::new(vec![]));
        let (book, _rx) = open_with(&temp_dir, Some(Arc::clone(&remote)));

        let orchestrator = book.orchestrator.as_ref().unwrap();
        assert!(orchestrator.run_cycle(SyncTrigger::Periodic).await.is_completed());
        assert_eq!(remote.fetches.load(Ordering::SeqCst), 1);
    }
}
