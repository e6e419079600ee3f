//! Sync command handlers

use anyhow::{bail, Result};
use tokio::sync::mpsc::UnboundedReceiver;

use quotesync_core::{Notification, QuoteBook, SyncOutcome};

use crate::output::Output;

const NOT_CONFIGURED_HINT: &str = "Sync is not configured. Enable it with:\n  \
     quotesync config set remote_url https://example.com/quotes\n  \
     quotesync config set sync_enabled true";

/// Run one sync cycle
pub async fn sync(book: &QuoteBook, output: &Output) -> Result<()> {
    if !book.sync_enabled() {
        bail!(NOT_CONFIGURED_HINT);
    }

    output.message("Syncing with server...");

    match book.trigger_manual_sync().await {
        SyncOutcome::Completed(summary) => {
            output.success(&format!(
                "Sync complete - {} quotes ({} from server, {} local only)",
                summary.total(),
                summary.remote,
                summary.local_only
            ));
            Ok(())
        }
        SyncOutcome::Skipped => {
            output.message("A sync is already running");
            Ok(())
        }
        SyncOutcome::Disabled => bail!(NOT_CONFIGURED_HINT),
        // The SyncFailed notification already carries the message
        SyncOutcome::Failed(failure) => Err(failure.into()),
    }
}

/// Sync periodically until Ctrl-C, printing notifications as they arrive
pub async fn watch(
    book: &QuoteBook,
    notifications: &mut UnboundedReceiver<Notification>,
    output: &Output,
) -> Result<()> {
    let Some(handle) = book.start_sync() else {
        bail!(NOT_CONFIGURED_HINT);
    };

    output.message(&format!(
        "Syncing every {}s with {}. Press Ctrl-C to stop.",
        book.config().sync_interval().as_secs(),
        book.config().remote_url.as_deref().unwrap_or("(unknown)")
    ));

    loop {
        tokio::select! {
            Some(notification) = notifications.recv() => output.notification(&notification),
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    output.message(&format!("Could not listen for Ctrl-C: {}", e));
                }
                break;
            }
        }
    }

    handle.stop().await;
    output.message("Stopped.");
    Ok(())
}
