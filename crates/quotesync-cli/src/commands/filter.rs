//! Filter command handlers

use anyhow::{Context, Result};

use quotesync_core::{CategoryFilter, QuoteBook};

use crate::output::{Output, OutputFormat};

/// Show the saved filter
pub fn show(book: &QuoteBook, output: &Output) -> Result<()> {
    let filter = book.filter();
    match output.format {
        OutputFormat::Json => output.json(&serde_json::json!({ "filter": filter.as_str() })),
        OutputFormat::Quiet => println!("{}", filter),
        OutputFormat::Human => match filter {
            CategoryFilter::All => println!("Showing all categories"),
            CategoryFilter::Category(ref category) => println!("Showing category: {}", category),
        },
    }
    Ok(())
}

/// Save a filter
///
/// Unknown categories are accepted; the filtered view is simply empty.
pub async fn set(book: &QuoteBook, category: &str, output: &Output) -> Result<()> {
    let filter = CategoryFilter::parse(category.trim());
    book.set_filter(&filter)
        .context("Failed to save filter")?;

    if let CategoryFilter::Category(ref name) = filter {
        if !book.has_category(name).await {
            output.message(&format!("Note: no quotes in category '{}' yet", name));
        }
    }
    output.success(&format!("Filter set to {}", filter));
    Ok(())
}
