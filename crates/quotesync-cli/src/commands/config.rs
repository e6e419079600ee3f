//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use quotesync_core::config::{MAX_REQUEST_TIMEOUT_SECS, MAX_SYNC_INTERVAL_SECS};
use quotesync_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => output.json(&config),
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:               {}", config.data_dir.display());
            println!(
                "  remote_url:             {}",
                config.remote_url.as_deref().unwrap_or("(not set)")
            );
            println!("  sync_enabled:           {}", config.sync_enabled);
            println!("  sync_interval_secs:     {}", config.sync_interval_secs);
            println!("  request_timeout_secs:   {}", config.request_timeout_secs);
            println!(
                "  log_file:               {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!("  mapping.text_field:     {}", config.mapping.text_field);
            println!(
                "  mapping.category_field: {}",
                config.mapping.category_field.as_deref().unwrap_or("(not set)")
            );
            println!("  mapping.fixed_category: {}", config.mapping.fixed_category);
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.to_string())
    }
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "remote_url" => {
            config.remote_url = optional(value);
        }
        "sync_enabled" => {
            config.sync_enabled = value
                .parse()
                .context("Invalid value for sync_enabled. Use 'true' or 'false'.")?;
        }
        "sync_interval_secs" => {
            let secs: u64 = value
                .parse()
                .context("Invalid value for sync_interval_secs. Use a number of seconds.")?;
            if !(1..=MAX_SYNC_INTERVAL_SECS).contains(&secs) {
                bail!(
                    "sync_interval_secs must be between 1 and {}",
                    MAX_SYNC_INTERVAL_SECS
                );
            }
            config.sync_interval_secs = secs;
        }
        "request_timeout_secs" => {
            let secs: u64 = value
                .parse()
                .context("Invalid value for request_timeout_secs. Use a number of seconds.")?;
            if !(1..=MAX_REQUEST_TIMEOUT_SECS).contains(&secs) {
                bail!(
                    "request_timeout_secs must be between 1 and {}",
                    MAX_REQUEST_TIMEOUT_SECS
                );
            }
            config.request_timeout_secs = secs;
        }
        "log_file" => {
            config.log_file = optional(value).map(PathBuf::from);
        }
        "mapping.text_field" => {
            if value.is_empty() {
                bail!("mapping.text_field must not be empty");
            }
            config.mapping.text_field = value.to_string();
        }
        "mapping.category_field" => {
            config.mapping.category_field = optional(value);
        }
        "mapping.fixed_category" => {
            if value.is_empty() {
                bail!("mapping.fixed_category must not be empty");
            }
            config.mapping.fixed_category = value.to_string();
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, remote_url, sync_enabled, sync_interval_secs, \
                 request_timeout_secs, log_file, mapping.text_field, mapping.category_field, \
                 mapping.fixed_category",
                key
            );
        }
    }
    Ok(())
}
