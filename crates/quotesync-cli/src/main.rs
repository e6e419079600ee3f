//! quotesync CLI
//!
//! Command-line interface for quotesync - categorized quotes kept in sync
//! with a remote source.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quotesync_core::sync::SyncFailure;
use quotesync_core::{Config, Notification, Notifier, QuoteBook};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "quotesync")]
#[command(about = "quotesync - Categorized quotes with remote sync")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List quotes (defaults to the saved filter)
    #[command(alias = "ls")]
    List {
        /// Only this category ("all" for everything)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show a random quote
    Random {
        /// Only this category ("all" for everything)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Add a quote
    Add {
        /// Quote text
        text: String,
        /// Category
        category: String,
    },
    /// List categories
    Categories,
    /// Show or set the saved category filter
    Filter {
        #[command(subcommand)]
        command: Option<FilterCommands>,
    },
    /// Sync with the remote source once
    Sync,
    /// Keep syncing periodically until interrupted
    Watch,
    /// Write all quotes as JSON
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Add quotes from a JSON file
    Import {
        /// File containing a JSON array of {text, category}
        file: PathBuf,
    },
    /// Add the built-in starter quotes
    Seed,
    /// Show status (counts, filter, sync state)
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum FilterCommands {
    /// Show the saved filter
    Show,
    /// Save a filter ("all" clears it)
    Set {
        /// Category name or "all"
        category: String,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, remote_url, sync_enabled, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands don't need the quote book
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, &output)
            }
        };
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    let (notifier, mut notifications) = Notifier::channel();
    let mut book = QuoteBook::open(config, notifier).context("Failed to open quote book")?;

    let result = match cli.command {
        Commands::List { category } => commands::quote::list(&book, category, &output).await,
        Commands::Random { category } => {
            commands::quote::random(&mut book, category, &output).await
        }
        Commands::Add { text, category } => {
            commands::quote::add(&mut book, &text, &category, &output).await
        }
        Commands::Categories => commands::quote::categories(&book, &output).await,
        Commands::Filter { command } => match command {
            Some(FilterCommands::Show) | None => commands::filter::show(&book, &output),
            Some(FilterCommands::Set { category }) => {
                commands::filter::set(&book, &category, &output).await
            }
        },
        Commands::Sync => commands::sync::sync(&book, &output).await,
        Commands::Watch => commands::sync::watch(&book, &mut notifications, &output).await,
        Commands::Export { output: path } => {
            commands::transfer::export(&book, path.as_ref(), &output).await
        }
        Commands::Import { file } => commands::transfer::import(&book, &file, &output).await,
        Commands::Seed => commands::transfer::seed(&book, &output).await,
        Commands::Status => commands::status::show(&book, &output).await,
        Commands::Config { .. } => unreachable!(), // Handled above
    };

    drain_notifications(&mut notifications, &output);
    if let Err(ref e) = result {
        if already_reported(e) {
            std::process::exit(1);
        }
    }
    result
}

/// True for errors whose message was already printed as a notification
fn already_reported(error: &anyhow::Error) -> bool {
    error.downcast_ref::<SyncFailure>().is_some()
}

/// Print notifications that arrived while a command ran
fn drain_notifications(notifications: &mut UnboundedReceiver<Notification>, output: &Output) {
    while let Ok(notification) = notifications.try_recv() {
        output.notification(&notification);
    }
}

/// Initialize logging when QUOTESYNC_LOG is set
///
/// Logs go to the configured log file, or stderr when none is set.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("QUOTESYNC_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "quotesync_core={},quotesync_cli={}",
        log_level, log_level
    ));

    match config.log_file {
        Some(ref log_path) => {
            let log_file = match File::create(log_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
                    return;
                }
            };
            // Ignore error if already initialized
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(log_file)
                .try_init();
            info!("Logging initialized to {:?}", log_path);
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
