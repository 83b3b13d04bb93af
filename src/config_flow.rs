/*!
 * Connection setup and options flow.
 *
 * A connection is only stored after the server answered `/languages` with at
 * least one language. Failures map to the form error keys of
 * `ConfigFlowError::error_key`.
 */

use log::{debug, info, warn};

use crate::app_config::{Config, ConnectionEntry};
use crate::errors::{ConfigFlowError, FailureKind};
use crate::providers::Provider;

/// Editable connection settings of an existing entry
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionOptions {
    pub host: String,
    pub port: u16,
    pub use_ssl: bool,
    pub api_key: String,
}

impl ConnectionOptions {
    /// Current options of an entry
    pub fn from_entry(entry: &ConnectionEntry) -> Self {
        Self {
            host: entry.host.clone(),
            port: entry.port,
            use_ssl: entry.use_ssl,
            api_key: entry.api_key.clone(),
        }
    }

    fn apply_to(&self, entry: &ConnectionEntry) -> ConnectionEntry {
        ConnectionEntry {
            host: self.host.clone(),
            port: self.port,
            use_ssl: self.use_ssl,
            api_key: self.api_key.clone(),
            ..entry.clone()
        }
    }
}

/// Check the server and return its language count
pub async fn validate_connection(provider: &dyn Provider) -> Result<usize, ConfigFlowError> {
    let count = provider.test_connection().await.map_err(|err| match err.kind() {
        FailureKind::Auth => ConfigFlowError::InvalidAuth,
        FailureKind::Transport | FailureKind::Request => ConfigFlowError::CannotConnect(err.to_string()),
    })?;

    if count == 0 {
        return Err(ConfigFlowError::NoLanguages);
    }

    debug!("Connection validated, {} languages installed", count);
    Ok(count)
}

/// Validate and store a new entry
pub async fn add_entry(
    config: &mut Config,
    entry: ConnectionEntry,
    provider: &dyn Provider,
) -> Result<ConnectionEntry, ConfigFlowError> {
    let unique_id = entry.unique_id();
    if config.has_server(&unique_id, None) {
        return Err(ConfigFlowError::AlreadyConfigured(unique_id));
    }

    validate_connection(provider).await?;

    info!("Added translation server {}", entry.title());
    config.entries.push(entry.clone());
    Ok(entry)
}

/// Validate new options and apply them to an entry.
///
/// The name is preserved. On error the stored entry is left unchanged.
pub async fn update_entry_options(
    config: &mut Config,
    entry_id: &str,
    options: ConnectionOptions,
    provider: &dyn Provider,
) -> Result<ConnectionEntry, ConfigFlowError> {
    let current = config
        .entry(entry_id)
        .ok_or_else(|| ConfigFlowError::UnknownEntry(entry_id.to_string()))?;
    let updated = options.apply_to(current);

    let unique_id = updated.unique_id();
    if config.has_server(&unique_id, Some(entry_id)) {
        return Err(ConfigFlowError::AlreadyConfigured(unique_id));
    }

    if let Err(err) = validate_connection(provider).await {
        warn!("Options for '{}' rejected: {}", updated.name, err);
        return Err(err);
    }

    if let Some(slot) = config.entries.iter_mut().find(|e| e.entry_id == entry_id) {
        *slot = updated.clone();
    }
    info!("Updated translation server {}", updated.title());
    Ok(updated)
}

/// Remove an entry from the configuration
pub fn remove_entry(config: &mut Config, entry_id: &str) -> Result<ConnectionEntry, ConfigFlowError> {
    let removed = config
        .remove_entry(entry_id)
        .ok_or_else(|| ConfigFlowError::UnknownEntry(entry_id.to_string()))?;
    info!("Removed translation server {}", removed.title());
    Ok(removed)
}
