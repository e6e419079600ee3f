//! Sync cycle state machine
//!
//! One cycle is `Idle -> Syncing -> Applying -> Idle`, or
//! `Idle -> Syncing -> Idle` when the fetch fails. At most one cycle is in
//! flight; a trigger that arrives meanwhile is dropped, not queued.
//!
//! The fetch runs without holding the library lock, so local adds made
//! while the network is slow complete immediately. The merge reads the
//! library as it is once the snapshot has arrived.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::merge::{reconcile, MergeSummary};
use super::remote::{NetworkError, RemoteSource};
use crate::library::Library;
use crate::notify::{NotificationKind, Notifier};
use crate::storage::StorageError;

/// Where the orchestrator is in a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    /// Waiting on the remote snapshot
    Syncing,
    /// Merging and persisting
    Applying,
}

/// What started a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    Periodic,
    Manual,
}

/// Why a cycle aborted
#[derive(Error, Debug)]
pub enum SyncFailure {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// How a cycle ended
#[derive(Debug)]
pub enum SyncOutcome {
    /// Remote snapshot merged (possibly with nothing to change)
    Completed(MergeSummary),
    /// Another cycle was in flight; nothing happened
    Skipped,
    /// No remote configured
    Disabled,
    /// Cycle aborted; local state untouched
    Failed(SyncFailure),
}

impl SyncOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SyncOutcome::Completed(_))
    }
}

/// Drives fetch -> merge -> persist cycles against one remote
pub struct SyncOrchestrator {
    remote: Arc<dyn RemoteSource>,
    library: Arc<Mutex<Library>>,
    notifier: Notifier,
    fetch_timeout: Duration,
    phase: watch::Sender<SyncPhase>,
}

impl SyncOrchestrator {
    pub fn new(
        remote: Arc<dyn RemoteSource>,
        library: Arc<Mutex<Library>>,
        notifier: Notifier,
        fetch_timeout: Duration,
    ) -> Self {
        let (phase, _) = watch::channel(SyncPhase::Idle);
        Self {
            remote,
            library,
            notifier,
            fetch_timeout,
            phase,
        }
    }

    pub fn phase(&self) -> SyncPhase {
        *self.phase.borrow()
    }

    /// Subscribe to phase changes
    pub fn subscribe_phase(&self) -> watch::Receiver<SyncPhase> {
        self.phase.subscribe()
    }

    /// Run one cycle unless one is already in flight
    pub async fn run_cycle(&self, trigger: SyncTrigger) -> SyncOutcome {
        let Some(_cycle) = CycleGuard::acquire(&self.phase) else {
            debug!(?trigger, "Sync already in flight, dropping trigger");
            return SyncOutcome::Skipped;
        };

        info!(?trigger, "Sync started against {}", self.remote.endpoint());

        let fetched = tokio::time::timeout(self.fetch_timeout, self.remote.fetch_remote()).await;
        let snapshot = match fetched {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(e)) => return self.fail(SyncFailure::Network(e)),
            Err(_) => {
                return self.fail(SyncFailure::Network(NetworkError::Timeout {
                    url: self.remote.endpoint().to_string(),
                }))
            }
        };

        self.phase.send_replace(SyncPhase::Applying);

        let mut library = self.library.lock().await;
        let reconciliation = reconcile(&snapshot, library.records().all());
        if reconciliation.changed {
            if let Err(e) = library.replace(reconciliation.quotes) {
                drop(library);
                return self.fail(SyncFailure::Storage(e));
            }
        }
        let categories = library.categories().len();
        drop(library);

        let summary = reconciliation.summary;
        let message = if reconciliation.changed {
            format!(
                "Synced with server: {} quotes in {} categories ({} updated from server)",
                summary.total(),
                categories,
                summary.overridden
            )
        } else {
            "Synced with server: already up to date".to_string()
        };
        self.notifier
            .notify(NotificationKind::SyncSucceeded, message);

        SyncOutcome::Completed(summary)
    }

    fn fail(&self, failure: SyncFailure) -> SyncOutcome {
        warn!("Sync failed: {}", failure);
        self.notifier.notify(
            NotificationKind::SyncFailed,
            format!("Sync failed: {}", failure),
        );
        SyncOutcome::Failed(failure)
    }

    /// Start periodic syncing on a background task
    ///
    /// The first tick fires immediately. Ticks that land while a cycle is
    /// in flight are dropped.
    pub fn start(self: &Arc<Self>, period: Duration) -> SyncHandle {
        let (command_tx, command_rx) = mpsc::channel(16);
        let task = tokio::spawn(sync_ticker_task(Arc::clone(self), period, command_rx));
        info!("Periodic sync every {:?}", period);
        SyncHandle { command_tx, task }
    }
}

/// Holds the in-flight slot; releases it on every exit path
struct CycleGuard<'a> {
    phase: &'a watch::Sender<SyncPhase>,
}

impl<'a> CycleGuard<'a> {
    fn acquire(phase: &'a watch::Sender<SyncPhase>) -> Option<Self> {
        let acquired = phase.send_if_modified(|current| {
            if *current == SyncPhase::Idle {
                *current = SyncPhase::Syncing;
                true
            } else {
                false
            }
        });
        if !acquired {
            return None;
        }
        Some(Self { phase })
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.phase.send_replace(SyncPhase::Idle);
    }
}

/// Commands sent to the ticker task
#[derive(Debug)]
enum SyncCommand {
    SyncNow,
    Shutdown,
}

/// Handle for controlling the background sync task
pub struct SyncHandle {
    command_tx: mpsc::Sender<SyncCommand>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Ask for an immediate cycle; dropped if one is in flight
    ///
    /// Returns false if the task has already stopped.
    pub async fn trigger(&self) -> bool {
        self.command_tx.send(SyncCommand::SyncNow).await.is_ok()
    }

    /// Stop ticking. A cycle already in flight runs to completion.
    pub async fn stop(self) {
        let _ = self.command_tx.send(SyncCommand::Shutdown).await;
        self.join().await;
    }

    /// Wait for the ticker task to end
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            warn!("Sync ticker task ended abnormally: {}", e);
        }
    }
}

async fn sync_ticker_task(
    orchestrator: Arc<SyncOrchestrator>,
    period: Duration,
    mut command_rx: mpsc::Receiver<SyncCommand>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => spawn_cycle(&orchestrator, SyncTrigger::Periodic),
            cmd = command_rx.recv() => match cmd {
                Some(SyncCommand::SyncNow) => spawn_cycle(&orchestrator, SyncTrigger::Manual),
                Some(SyncCommand::Shutdown) | None => break,
            },
        }
    }

    debug!("Sync ticker stopped");
}

fn spawn_cycle(orchestrator: &Arc<SyncOrchestrator>, trigger: SyncTrigger) {
    if orchestrator.phase() != SyncPhase::Idle {
        debug!(?trigger, "Sync already in flight, dropping trigger");
        return;
    }
    let orchestrator = Arc::clone(orchestrator);
    tokio::spawn(async move {
        orchestrator.run_cycle(trigger).await;
    });
}
