//! Quote command handlers

use anyhow::Result;

use quotesync_core::{CategoryFilter, QuoteBook};

use crate::output::Output;

/// Resolve an explicit `--category`, falling back to the saved filter
fn resolve_filter(book: &QuoteBook, category: Option<String>) -> CategoryFilter {
    match category {
        Some(category) => CategoryFilter::parse(category.trim()),
        None => book.filter(),
    }
}

/// List quotes
pub async fn list(book: &QuoteBook, category: Option<String>, output: &Output) -> Result<()> {
    let filter = resolve_filter(book, category);
    let quotes = book.quotes_in(&filter).await;
    output.print_quotes(&quotes);
    Ok(())
}

/// Show one random quote
pub async fn random(
    book: &mut QuoteBook,
    category: Option<String>,
    output: &Output,
) -> Result<()> {
    let filter = resolve_filter(book, category);
    match book.random_quote(&filter).await {
        Some(quote) => output.print_quote(&quote),
        None if filter == CategoryFilter::All => {
            output.message("No quotes yet. Add one with `quotesync add` or run `quotesync seed`.")
        }
        None => output.message(&format!("No quotes in category '{}'.", filter)),
    }
    Ok(())
}

/// Add a quote and push it to the remote (if configured)
pub async fn add(book: &mut QuoteBook, text: &str, category: &str, output: &Output) -> Result<()> {
    let quote = book.add_quote(text, category).await?;
    // Let the background push finish before the process exits
    book.flush_pushes().await;

    if output.is_quiet() {
        println!("{}", quote.text);
    } else if output.is_json() {
        output.json(&quote);
    } else {
        output.success(&format!("Added quote to '{}'", quote.category));
    }
    Ok(())
}

/// List categories
pub async fn categories(book: &QuoteBook, output: &Output) -> Result<()> {
    let categories = book.categories().await;
    output.print_categories(&categories);
    Ok(())
}
