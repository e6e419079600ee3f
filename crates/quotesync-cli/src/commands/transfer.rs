//! Import, export and seed handlers

use std::path::PathBuf;

use anyhow::{Context, Result};

use quotesync_core::QuoteBook;

use crate::output::Output;

/// Write all quotes as JSON to a file or stdout
pub async fn export(book: &QuoteBook, path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let json = book.export_json().await?;

    match path {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write export file: {:?}", path))?;
            output.success(&format!("Exported quotes to {}", path.display()));
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Append quotes from a JSON file
pub async fn import(book: &QuoteBook, file: &PathBuf, output: &Output) -> Result<()> {
    let payload = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read import file: {:?}", file))?;

    let summary = book
        .import_json(&payload)
        .await
        .with_context(|| format!("Nothing imported from {:?}", file))?;

    if output.is_json() {
        output.json(&serde_json::json!({
            "added": summary.added,
            "skipped": summary.skipped,
        }));
    } else {
        output.success(&format!(
            "Imported {} quote(s), skipped {} already present",
            summary.added, summary.skipped
        ));
    }
    Ok(())
}

/// Add the starter quotes
pub async fn seed(book: &QuoteBook, output: &Output) -> Result<()> {
    let added = book
        .seed_defaults()
        .await
        .context("Failed to save starter quotes")?;

    if added == 0 {
        output.message("Starter quotes are already present.");
    } else {
        output.success(&format!("Added {} starter quote(s)", added));
    }
    Ok(())
}
