//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/quotesync/config.toml)
//! 3. Environment variables (QUOTESYNC_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::sync::{CategorySource, FieldMapping};

/// Environment variable prefix
const ENV_PREFIX: &str = "QUOTESYNC";

/// Default seconds between periodic sync cycles
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 30;

/// Default network timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Longest accepted sync interval (one day)
pub const MAX_SYNC_INTERVAL_SECS: u64 = 86_400;

/// Longest accepted network timeout
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the persisted slots
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Remote quote endpoint (optional)
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Whether sync is enabled
    #[serde(default)]
    pub sync_enabled: bool,

    /// Seconds between periodic sync cycles
    #[serde(default = "default_sync_interval")]
    pub sync_interval_secs: u64,

    /// Network timeout applied to fetch and push
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Log file path (optional, defaults to stderr)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// How remote items map onto quotes
    #[serde(default)]
    pub mapping: MappingConfig,
}

/// Field mapping as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Remote field carrying the quote text
    #[serde(default = "default_text_field")]
    pub text_field: String,

    /// Remote field carrying the category; when unset every remote
    /// quote gets `fixed_category`
    #[serde(default)]
    pub category_field: Option<String>,

    /// Category assigned when no category field is mapped
    #[serde(default = "default_fixed_category")]
    pub fixed_category: String,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            text_field: default_text_field(),
            category_field: None,
            fixed_category: default_fixed_category(),
        }
    }
}

impl MappingConfig {
    /// Resolve into the mapping used by the remote client
    pub fn to_field_mapping(&self) -> FieldMapping {
        let category = match self.category_field {
            Some(ref field) if !field.is_empty() => CategorySource::Field(field.clone()),
            _ => CategorySource::Fixed(self.fixed_category.clone()),
        };
        FieldMapping {
            text_field: self.text_field.clone(),
            category,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            remote_url: None,
            sync_enabled: false,
            sync_interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            log_file: None,
            mapping: MappingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (QUOTESYNC_DATA_DIR, QUOTESYNC_REMOTE_URL, ...)
    /// 2. Config file (~/.config/quotesync/config.toml or QUOTESYNC_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // An empty value clears the remote
        if let Ok(val) = std::env::var(format!("{}_REMOTE_URL", ENV_PREFIX)) {
            self.remote_url = if val.is_empty() { None } else { Some(val) };
        }

        if let Ok(val) = std::env::var(format!("{}_SYNC_ENABLED", ENV_PREFIX)) {
            self.sync_enabled = val.eq_ignore_ascii_case("true") || val == "1";
        }

        if let Ok(val) = std::env::var(format!("{}_SYNC_INTERVAL", ENV_PREFIX)) {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => self.sync_interval_secs = secs,
                _ => tracing::warn!("Ignoring invalid {}_SYNC_INTERVAL={:?}", ENV_PREFIX, val),
            }
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with QUOTESYNC_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quotesync")
            .join("config.toml")
    }

    /// Directory where the key/value slots live
    pub fn slot_dir(&self) -> PathBuf {
        self.data_dir.join("slots")
    }

    /// True when a remote is configured and sync is switched on
    pub fn sync_active(&self) -> bool {
        self.sync_enabled && self.remote_url.is_some()
    }

    /// Interval between periodic cycles, clamped to 1s..=1 day
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs.clamp(1, MAX_SYNC_INTERVAL_SECS))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.clamp(1, MAX_REQUEST_TIMEOUT_SECS))
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quotesync")
}

fn default_sync_interval() -> u64 {
    DEFAULT_SYNC_INTERVAL_SECS
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_text_field() -> String {
    "title".to_string()
}

fn default_fixed_category() -> String {
    "Remote".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "QUOTESYNC_DATA_DIR",
        "QUOTESYNC_REMOTE_URL",
        "QUOTESYNC_SYNC_ENABLED",
        "QUOTESYNC_SYNC_INTERVAL",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.sync_enabled);
        assert!(config.remote_url.is_none());
        assert!(config.data_dir.ends_with("quotesync"));
        assert_eq!(config.sync_interval_secs, 30);
        assert_eq!(config.request_timeout_secs, 10);
        assert!(!config.sync_active());
    }

    #[test]
    fn test_slot_dir() {
        let config = Config::default();
        assert!(config.slot_dir().ends_with("slots"));
        assert!(config.slot_dir().starts_with(&config.data_dir));
    }

    #[test]
    fn test_default_mapping_is_title_with_fixed_category() {
        let mapping = MappingConfig::default().to_field_mapping();
        assert_eq!(mapping.text_field, "title");
        assert_eq!(mapping.category, CategorySource::Fixed("Remote".to_string()));
    }

    #[test]
    fn test_mapped_category_field() {
        let mapping = MappingConfig {
            text_field: "quote".to_string(),
            category_field: Some("tag".to_string()),
            fixed_category: "ignored".to_string(),
        }
        .to_field_mapping();
        assert_eq!(mapping.category, CategorySource::Field("tag".to_string()));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("QUOTESYNC_DATA_DIR", "/tmp/quotesync-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/quotesync-test"));
    }

    #[test]
    fn test_env_override_sync_enabled() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("QUOTESYNC_SYNC_ENABLED", "true");
        config.apply_env_overrides();
        assert!(config.sync_enabled);

        env::set_var("QUOTESYNC_SYNC_ENABLED", "1");
        config.sync_enabled = false;
        config.apply_env_overrides();
        assert!(config.sync_enabled);

        env::set_var("QUOTESYNC_SYNC_ENABLED", "false");
        config.apply_env_overrides();
        assert!(!config.sync_enabled);
    }

    #[test]
    fn test_env_override_remote_url() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("QUOTESYNC_REMOTE_URL", "http://localhost:3000/posts");
        config.apply_env_overrides();
        assert_eq!(
            config.remote_url,
            Some("http://localhost:3000/posts".to_string())
        );

        // Empty string clears it
        env::set_var("QUOTESYNC_REMOTE_URL", "");
        config.apply_env_overrides();
        assert!(config.remote_url.is_none());
    }

    #[test]
    fn test_env_override_sync_interval_rejects_garbage() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("QUOTESYNC_SYNC_INTERVAL", "5");
        config.apply_env_overrides();
        assert_eq!(config.sync_interval_secs, 5);

        env::set_var("QUOTESYNC_SYNC_INTERVAL", "soon");
        config.apply_env_overrides();
        assert_eq!(config.sync_interval_secs, 5);

        env::set_var("QUOTESYNC_SYNC_INTERVAL", "0");
        config.apply_env_overrides();
        assert_eq!(config.sync_interval_secs, 5);
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/quotesync"),
            remote_url: Some("https://example.com/posts".to_string()),
            sync_enabled: true,
            ..Config::default()
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("remote_url"));
        assert!(toml_str.contains("[mapping]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.remote_url, config.remote_url);
        assert_eq!(parsed.sync_enabled, config.sync_enabled);
        assert_eq!(parsed.mapping, config.mapping);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            remote_url = "https://example.com/posts"
            sync_enabled = true
            sync_interval_secs = 120

            [mapping]
            text_field = "body"
            category_field = "topic"
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert!(config.sync_active());
        assert_eq!(config.sync_interval(), Duration::from_secs(120));
        assert_eq!(config.mapping.text_field, "body");
        assert_eq!(config.mapping.category_field.as_deref(), Some("topic"));
        assert_eq!(config.mapping.fixed_category, "Remote");
    }

    #[test]
    fn test_huge_durations_are_clamped() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = format!(
            "sync_interval_secs = {}\nrequest_timeout_secs = {}\n",
            i64::MAX,
            i64::MAX
        );
        let config = Config::load_from_str(&toml).unwrap();

        assert_eq!(
            config.sync_interval(),
            Duration::from_secs(MAX_SYNC_INTERVAL_SECS)
        );
        assert_eq!(
            config.request_timeout(),
            Duration::from_secs(MAX_REQUEST_TIMEOUT_SECS)
        );
        // Must still be usable as a tokio deadline offset
        assert!(std::time::Instant::now()
            .checked_add(config.sync_interval())
            .is_some());
    }

    #[test]
    fn test_save_and_reload_roundtrip_through_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            data_dir: temp_dir.path().join("data"),
            remote_url: Some("https://example.com/posts".to_string()),
            ..Config::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_with_cli_override(Some(&path)).unwrap();
        assert_eq!(loaded.remote_url, config.remote_url);
        assert!(loaded.data_dir.exists());
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        env::set_var("QUOTESYNC_DATA_DIR", temp_dir.path().join("data"));

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert!(!config.sync_enabled);
        assert!(config.remote_url.is_none());
    }
}
