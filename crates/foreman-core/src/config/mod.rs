//! Configuration loading and validation.
//!
//! Supports JSON5 format. Config location: `~/.foreman/foreman.json`.
//! Every tunable can also be overridden through `FOREMAN_*` environment
//! variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::validation::DEFAULT_DENYLIST;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON5 parsing error.
    #[error("Parse error: {0}")]
    Parse(#[from] json5::Error),

    /// Config validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An environment override could not be parsed.
    #[error("Invalid value for {var}: {value}")]
    InvalidEnv {
        /// Variable name.
        var: String,
        /// Offending value.
        value: String,
    },
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Sandboxed command runner settings.
    #[serde(default)]
    pub sandbox: SandboxSettings,

    /// Execution queue settings.
    #[serde(default)]
    pub queue: QueueSettings,

    /// Mail relay settings.
    #[serde(default)]
    pub mail: MailSettings,

    /// Web search settings.
    #[serde(default)]
    pub search: SearchSettings,

    /// Messaging gateway settings.
    #[serde(default)]
    pub messaging: MessagingSettings,
}

impl Config {
    /// Load configuration from the default location, applying environment
    /// overrides. Missing file falls back to defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the config cannot be read, parsed, or validated.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::load(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = json5::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a path.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the file write fails.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config file path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        Self::state_dir().join("foreman.json")
    }

    /// Get the Foreman state directory.
    ///
    /// Uses `FOREMAN_STATE_DIR` env var if set, otherwise `~/.foreman`.
    #[must_use]
    pub fn state_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("FOREMAN_STATE_DIR") {
            PathBuf::from(dir)
        } else if let Some(home) = dirs::home_dir() {
            home.join(".foreman")
        } else {
            PathBuf::from(".foreman")
        }
    }

    /// Apply environment-style overrides from a lookup function.
    ///
    /// The lookup indirection lets tests inject values without mutating
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnv` for unparseable values.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        fn parse<T: std::str::FromStr>(var: &str, value: String) -> Result<T, ConfigError> {
            value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: var.to_string(),
                value,
            })
        }

        if let Some(v) = lookup("FOREMAN_SANDBOX_MEMORY_MB") {
            self.sandbox.memory_limit_mb = parse("FOREMAN_SANDBOX_MEMORY_MB", v)?;
        }
        if let Some(v) = lookup("FOREMAN_SANDBOX_CPUS") {
            self.sandbox.cpu_quota = parse("FOREMAN_SANDBOX_CPUS", v)?;
        }
        if let Some(v) = lookup("FOREMAN_SANDBOX_TIMEOUT_MS") {
            self.sandbox.timeout_ms = parse("FOREMAN_SANDBOX_TIMEOUT_MS", v)?;
        }
        if let Some(v) = lookup("FOREMAN_SANDBOX_IMAGE") {
            self.sandbox.image = v;
        }
        if let Some(v) = lookup("FOREMAN_SANDBOX_DENYLIST") {
            self.sandbox.denylist = v
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(ToString::to_string)
                .collect();
        }
        if let Some(v) = lookup("FOREMAN_QUEUE_CONCURRENCY") {
            self.queue.concurrency = parse("FOREMAN_QUEUE_CONCURRENCY", v)?;
        }
        if let Some(v) = lookup("FOREMAN_MAIL_ENDPOINT") {
            self.mail.endpoint = v;
        }
        if let Some(v) = lookup("FOREMAN_MAIL_FROM") {
            self.mail.from = v;
        }
        if let Some(v) = lookup("FOREMAN_SEARCH_ENDPOINT") {
            self.search.endpoint = v;
        }
        if let Some(v) = lookup("FOREMAN_MESSAGING_ENDPOINT") {
            self.messaging.endpoint = v;
        }
        Ok(())
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` when a limit is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sandbox.memory_limit_mb == 0 {
            return Err(ConfigError::Validation(
                "Sandbox memory limit cannot be 0".to_string(),
            ));
        }
        if self.sandbox.cpu_quota <= 0.0 {
            return Err(ConfigError::Validation(
                "Sandbox CPU quota must be positive".to_string(),
            ));
        }
        if self.sandbox.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "Sandbox timeout cannot be 0".to_string(),
            ));
        }
        if self.queue.concurrency == 0 {
            return Err(ConfigError::Validation(
                "Queue concurrency cannot be 0".to_string(),
            ));
        }
        if self.sandbox.denylist.iter().any(String::is_empty) {
            return Err(ConfigError::Validation(
                "Denylist tokens cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for the sandboxed command runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxSettings {
    /// Memory ceiling for one sandboxed run, in MiB.
    #[serde(default = "default_memory_limit_mb")]
    pub memory_limit_mb: u64,

    /// CPU-share ceiling as a fraction of one core (0.5 = half a core).
    #[serde(default = "default_cpu_quota")]
    pub cpu_quota: f64,

    /// Wall-clock deadline for one sandboxed run, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Container image to run commands in.
    #[serde(default = "default_image")]
    pub image: String,

    /// Denylisted command tokens, matched as substrings.
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            memory_limit_mb: default_memory_limit_mb(),
            cpu_quota: default_cpu_quota(),
            timeout_ms: default_timeout_ms(),
            image: default_image(),
            denylist: default_denylist(),
        }
    }
}

const fn default_memory_limit_mb() -> u64 {
    128
}

const fn default_cpu_quota() -> f64 {
    0.5
}

const fn default_timeout_ms() -> u64 {
    10_000
}

fn default_image() -> String {
    "alpine:3.20".to_string()
}

fn default_denylist() -> Vec<String> {
    DEFAULT_DENYLIST.iter().map(ToString::to_string).collect()
}

/// Settings for the execution queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSettings {
    /// Maximum number of sandboxed runs in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

const fn default_concurrency() -> usize {
    1
}

/// Settings for the mail relay used by the `send_email` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailSettings {
    /// HTTP relay endpoint to POST outgoing mail to.
    #[serde(default = "default_mail_endpoint")]
    pub endpoint: String,

    /// Sender address.
    #[serde(default = "default_mail_from")]
    pub from: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            endpoint: default_mail_endpoint(),
            from: default_mail_from(),
        }
    }
}

fn default_mail_endpoint() -> String {
    "http://localhost:2525/send".to_string()
}

fn default_mail_from() -> String {
    "foreman@localhost".to_string()
}

/// Settings for the `web_search` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSettings {
    /// Search endpoint queried with `q`/`format` parameters.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://api.duckduckgo.com".to_string()
}

/// Settings for the messaging gateway used by the `send_whatsapp` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagingSettings {
    /// HTTP gateway endpoint to POST outgoing messages to.
    #[serde(default = "default_messaging_endpoint")]
    pub endpoint: String,
}

impl Default for MessagingSettings {
    fn default() -> Self {
        Self {
            endpoint: default_messaging_endpoint(),
        }
    }
}

fn default_messaging_endpoint() -> String {
    "http://localhost:3001/messages".to_string()
}
