use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use crate::panel::PollSettings;

/// Application configuration module
/// This module handles loading, validating and saving the client settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Panel account
    #[serde(default)]
    pub credentials: Credentials,

    /// Identifier of the managed server on the panel
    #[serde(default)]
    pub server_id: u64,

    /// Panel root URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds, 0 disables it
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Polling loop settings
    #[serde(default)]
    pub polling: PollingConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Panel login
#[derive(Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Credentials {
    #[serde(default = "String::new")]
    pub username: String,

    #[serde(default = "String::new")]
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Polling loop configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PollingConfig {
    /// Seconds to sleep before each status poll
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,

    /// Maximum status polls while queued
    #[serde(default = "default_queue_timeout")]
    pub queue_timeout: u32,

    /// Maximum status polls while waiting for the server to run after accept/restart
    #[serde(default = "default_start_timeout")]
    pub start_timeout: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval_secs(),
            queue_timeout: default_queue_timeout(),
            start_timeout: default_start_timeout(),
        }
    }
}

impl PollingConfig {
    pub fn settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_secs(self.interval_secs),
            queue_timeout: self.queue_timeout,
            start_timeout: self.start_timeout,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_base_url() -> String {
    crate::panel::client::DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_queue_timeout() -> u32 {
    1500 // 1500 polls at 2s is roughly 50 minutes
}

fn default_start_timeout() -> u32 {
    1500
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .context(format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load the configuration, writing a default one first if the file does not exist
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(path, config_json)
            .context(format!("Failed to write config to file: {}", path.display()))?;

        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.credentials.username.trim().is_empty() {
            return Err(anyhow!("PloudOS username is required"));
        }

        if self.credentials.password.is_empty() {
            return Err(anyhow!("PloudOS password is required"));
        }

        url::Url::parse(&self.base_url)
            .map_err(|e| anyhow!("Invalid base URL '{}': {}", self.base_url, e))?;

        if self.polling.queue_timeout == 0 {
            return Err(anyhow!("polling.queue_timeout must be at least 1"));
        }

        if self.polling.start_timeout == 0 {
            return Err(anyhow!("polling.start_timeout must be at least 1"));
        }

        Ok(())
    }

    /// Request timeout as a duration, `None` when disabled
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            credentials: Credentials::default(),
            server_id: 0,
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            polling: PollingConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
