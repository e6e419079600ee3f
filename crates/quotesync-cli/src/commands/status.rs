//! Status command handler

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use quotesync_core::QuoteBook;

use crate::output::{Output, OutputFormat};

#[derive(Serialize)]
struct StatusReport {
    data_dir: PathBuf,
    quotes: usize,
    categories: usize,
    filter: String,
    sync_enabled: bool,
    remote_url: Option<String>,
    sync_interval_secs: u64,
}

/// Show status information
pub async fn show(book: &QuoteBook, output: &Output) -> Result<()> {
    let config = book.config();
    let report = StatusReport {
        data_dir: config.slot_dir(),
        quotes: book.all_quotes().await.len(),
        categories: book.categories().await.len(),
        filter: book.filter().to_string(),
        sync_enabled: book.sync_enabled(),
        remote_url: config.remote_url.clone(),
        sync_interval_secs: config.sync_interval().as_secs(),
    };

    match output.format {
        OutputFormat::Json => output.json(&report),
        OutputFormat::Quiet => println!("{}", report.quotes),
        OutputFormat::Human => {
            println!("quotesync Status");
            println!("================");
            println!();
            println!("Sync:");
            println!(
                "  Status:   {}",
                if report.sync_enabled {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            if let Some(ref url) = report.remote_url {
                println!("  Server:   {}", url);
            }
            if report.sync_enabled {
                println!("  Interval: {}s", report.sync_interval_secs);
            }
            println!();
            println!("Storage:");
            println!("  Location: {}", report.data_dir.display());
            println!();
            println!("Contents:");
            println!("  Quotes:     {}", report.quotes);
            println!("  Categories: {}", report.categories);
            println!("  Filter:     {}", report.filter);
        }
    }

    Ok(())
}
