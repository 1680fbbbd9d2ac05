//! Configuration settings management
//!
//! This module handles loading configuration from multiple sources,
//! validation, and persistence.

use crate::config::connection::StorageAccount;
use crate::error::{AzstoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable pointing at an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "AZSTORE_CONFIG";

/// Setting names that carry the connection string, highest priority first
const CONNECTION_STRING_ENV: [&str; 2] = ["StorageAccountConnection", "AZURE_STORAGE_CONNECTION_STRING"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueueConfig {
    /// Lifetime of added messages, in days
    pub message_ttl_days: u32,
    /// Number of messages fetched by one receive call
    pub batch_size: u8,
    /// How long received messages stay invisible to other consumers
    pub visibility_timeout_secs: u64,
    /// Base64 encode message text on the wire
    pub base64_messages: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            message_ttl_days: 7,
            batch_size: 10,
            visibility_timeout_secs: 100,
            base64_messages: true,
        }
    }
}

impl QueueConfig {
    pub fn message_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.message_ttl_days) * 24 * 60 * 60)
    }

    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.visibility_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkSettings {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub debug: bool,
    pub output_json: bool,
    pub storage_account_connection: String,
    pub queue: QueueConfig,
    pub network: NetworkSettings,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage_account_connection.trim().is_empty() {
            return Err(AzstoreError::config(
                "StorageAccountConnection is required. Set it in the config file or the environment",
            ));
        }

        if self.queue.batch_size == 0 || self.queue.batch_size > 32 {
            return Err(AzstoreError::config(format!(
                "queue.batch_size must be between 1 and 32, got {}",
                self.queue.batch_size
            )));
        }

        if self.queue.message_ttl_days == 0 {
            return Err(AzstoreError::config("queue.message_ttl_days must be at least 1"));
        }

        // the service caps visibility at seven days
        if self.queue.visibility_timeout_secs > 7 * 24 * 60 * 60 {
            return Err(AzstoreError::config(
                "queue.visibility_timeout_secs must not exceed 7 days",
            ));
        }

        Ok(())
    }

    /// Parse the configured connection string.
    pub fn storage_account(&self) -> Result<StorageAccount> {
        StorageAccount::parse(&self.storage_account_connection)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(explicit));
        }

        // XDG Base Directory layout on Linux and macOS
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            use std::env;
            let config_dir = if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
                PathBuf::from(xdg_config_home)
            } else {
                let home_dir = env::var("HOME")
                    .map_err(|_| AzstoreError::config("HOME environment variable not set"))?;
                PathBuf::from(home_dir).join(".config")
            };
            Ok(config_dir.join("azstore").join("azstore.toml"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            let config_dir = dirs::config_dir()
                .ok_or_else(|| AzstoreError::config("Unable to determine config directory"))?;
            Ok(config_dir.join("azstore").join("azstore.toml"))
        }
    }

    pub fn load() -> Result<Self> {
        load_config()
    }

    pub async fn save(&self) -> Result<()> {
        save_config(self, &Self::get_config_path()?).await
    }
}

/// Load configuration from multiple sources with priority order:
/// 1. Command-line flags (handled by clap)
/// 2. Environment variables
/// 3. Configuration file
/// 4. Default values
pub fn load_config() -> Result<Config> {
    let config = load_config_no_validation()?;

    config.validate()?;

    Ok(config)
}

/// Load configuration without validation (for config commands)
pub fn load_config_no_validation() -> Result<Config> {
    load_from_path(&Config::get_config_path()?)
}

/// Layer the file at `path` (if present) and the environment over the defaults.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let settings = ::config::Config::builder()
        .add_source(
            ::config::File::from(path.to_path_buf())
                .format(::config::FileFormat::Toml)
                .required(false),
        )
        .add_source(
            ::config::Environment::with_prefix("AZSTORE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut config: Config = settings.try_deserialize()?;
    apply_connection_env(&mut config);

    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

fn apply_connection_env(config: &mut Config) {
    if let Some(value) = CONNECTION_STRING_ENV
        .iter()
        .find_map(|name| std::env::var(name).ok())
        .filter(|value| !value.trim().is_empty())
    {
        config.storage_account_connection = value;
    }
}

pub async fn save_config(config: &Config, path: &Path) -> Result<()> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let contents = toml::to_string_pretty(config)
        .map_err(|e| AzstoreError::serialization(e.to_string()))?;

    tokio::fs::write(path, contents).await?;

    Ok(())
}

/// Write a default configuration file unless one already exists.
pub async fn init_default_config() -> Result<PathBuf> {
    let config_path = Config::get_config_path()?;

    // Don't overwrite existing configuration
    if config_path.exists() {
        return Ok(config_path);
    }

    save_config(&Config::default(), &config_path).await?;

    Ok(config_path)
}
