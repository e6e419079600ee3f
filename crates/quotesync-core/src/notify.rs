//! User-facing notifications
//!
//! The core never renders anything. It hands short, human-readable messages
//! to whatever callback the presentation layer registered.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// What a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// A sync cycle merged the remote snapshot
    SyncSucceeded,
    /// A sync cycle aborted without touching local state
    SyncFailed,
    /// A newly added quote could not be sent to the remote
    PushFailed,
    /// Persisted data was unreadable and has been reset
    StorageRecovered,
    /// A local write could not be made durable
    StorageFailed,
    /// An import payload was rejected as a whole
    ImportRejected,
    /// An import payload was applied
    ImportCompleted,
}

impl NotificationKind {
    pub fn is_error(self) -> bool {
        matches!(
            self,
            NotificationKind::SyncFailed
                | NotificationKind::PushFailed
                | NotificationKind::StorageRecovered
                | NotificationKind::StorageFailed
                | NotificationKind::ImportRejected
        )
    }
}

/// A transient message for the user
#[derive(Debug, Clone)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

type Callback = dyn Fn(Notification) + Send + Sync;

/// Delivers notifications to the presentation layer
#[derive(Clone)]
pub struct Notifier {
    callback: Arc<Callback>,
}

impl Notifier {
    /// Invoke `callback` for every notification
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(Notification) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// A notifier that forwards into an unbounded channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let notifier = Self::new(move |n| {
            // Receiver gone means nobody is listening any more
            let _ = tx.send(n);
        });
        (notifier, rx)
    }

    /// A notifier that only logs
    pub fn silent() -> Self {
        Self::new(|_| {})
    }

    pub fn notify(&self, kind: NotificationKind, message: impl Into<String>) {
        let message = message.into();
        if kind.is_error() {
            warn!(?kind, "{}", message);
        } else {
            info!(?kind, "{}", message);
        }
        (self.callback)(Notification {
            kind,
            message,
            raised_at: Utc::now(),
        });
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}
