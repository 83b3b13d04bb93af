/*!
 * Configuration of the bridge: poll and request timing plus the list of
 * configured LibreTranslate servers, stored as a JSON file.
 */

use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use url::Url;

/// Application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Seconds between capability polls
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Configured translation servers
    #[serde(default)]
    pub entries: Vec<ConnectionEntry>,
}

/// One configured connection to a translation server
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConnectionEntry {
    // @field: Stable identifier, generated on creation
    #[serde(default = "new_entry_id")]
    pub entry_id: String,

    // @field: Display name
    #[serde(default = "default_name")]
    pub name: String,

    // @field: Server host name or address
    #[serde(default = "default_host")]
    pub host: String,

    // @field: Server port
    #[serde(default = "default_port")]
    pub port: u16,

    // @field: API key, empty when the server does not require one
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Connect over https
    #[serde(default)]
    pub use_ssl: bool,
}

impl ConnectionEntry {
    // @returns: Entry with a fresh id
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        api_key: impl Into<String>,
        use_ssl: bool,
    ) -> Self {
        Self {
            entry_id: new_entry_id(),
            name: name.into(),
            host: host.into(),
            port,
            api_key: api_key.into(),
            use_ssl,
        }
    }

    /// Identity used to reject duplicate servers
    pub fn unique_id(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Human-readable title
    pub fn title(&self) -> String {
        format!("{} ({}:{})", self.name, self.host, self.port)
    }

    /// Base URL of the server
    pub fn base_url(&self) -> Result<Url> {
        let scheme = if self.use_ssl { "https" } else { "http" };
        let raw = format!("{}://{}:{}", scheme, self.host, self.port);
        Url::parse(&raw).with_context(|| format!("Invalid server address: {}", raw))
    }

    /// Validate host and port
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(anyhow!("Host must not be empty for entry '{}'", self.name));
        }
        if self.port == 0 {
            return Err(anyhow!("Port must not be 0 for entry '{}'", self.name));
        }
        self.base_url()?;
        Ok(())
    }
}

impl Default for ConnectionEntry {
    fn default() -> Self {
        Self::new(default_name(), default_host(), default_port(), String::new(), false)
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

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_scan_interval_secs() -> u64 {
    60
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_name() -> String {
    "LibreTranslate".to_string()
}

/// Default server host
pub fn default_host() -> String {
    "localhost".to_string()
}

/// Default LibreTranslate port
pub fn default_port() -> u16 {
    5000
}

fn new_entry_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Default location of the configuration file
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("libretranslate-bridge").join("conf.json"))
        .unwrap_or_else(|| PathBuf::from("conf.json"))
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.scan_interval_secs == 0 {
            return Err(anyhow!("scan_interval_secs must be at least 1"));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be at least 1"));
        }

        let mut ids = HashSet::new();
        let mut servers = HashSet::new();
        for entry in &self.entries {
            entry.validate()?;
            if !ids.insert(entry.entry_id.as_str()) {
                return Err(anyhow!("Duplicate entry id: {}", entry.entry_id));
            }
            if !servers.insert(entry.unique_id()) {
                return Err(anyhow!("Server {} is configured twice", entry.unique_id()));
            }
        }

        Ok(())
    }

    /// Find an entry by id
    pub fn entry(&self, entry_id: &str) -> Option<&ConnectionEntry> {
        self.entries.iter().find(|e| e.entry_id == entry_id)
    }

    /// Whether a server with this host:port is configured, ignoring `except_id`
    pub fn has_server(&self, unique_id: &str, except_id: Option<&str>) -> bool {
        self.entries
            .iter()
            .any(|e| e.unique_id() == unique_id && Some(e.entry_id.as_str()) != except_id)
    }

    /// Remove an entry, returning it if it existed
    pub fn remove_entry(&mut self, entry_id: &str) -> Option<ConnectionEntry> {
        let index = self.entries.iter().position(|e| e.entry_id == entry_id)?;
        Some(self.entries.remove(index))
    }

    /// Load the configuration, creating a default file when none exists
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
            }
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: LogLevel::default(),
            scan_interval_secs: default_scan_interval_secs(),
            timeout_secs: default_timeout_secs(),
            entries: Vec::new(),
        }
    }
}
