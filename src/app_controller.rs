use anyhow::Result;
use log::{debug, error, info, warn};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::app_config::{Config, ConnectionEntry};
use crate::coordinator::Coordinator;
use crate::errors::{AppError, ConfigFlowError, ServiceError};
use crate::health::{HealthProjection, LanguageCountSensor, StatusSensor};
use crate::providers::Provider;
use crate::providers::libretranslate::LibreTranslate;
use crate::services::{self, Service, ServiceResponse};
use crate::translation_service::TranslationService;

// @module: Host controller owning one coordinator per configured server

/// Runtime state of one loaded entry
struct EntryRuntime {
    entry: ConnectionEntry,
    coordinator: Coordinator,
    translator: TranslationService,
    poller: Option<JoinHandle<()>>,
}

impl EntryRuntime {
    fn stop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }
}

/// Sensors of one entry
#[derive(Debug, Clone)]
pub struct EntrySensors {
    pub status: StatusSensor,
    pub language_count: LanguageCountSensor,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Loaded entries, in setup order
    runtimes: Vec<EntryRuntime>,
    // @field: Start a poll loop for every loaded entry
    polling: bool,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            runtimes: Vec::new(),
            polling: true,
        })
    }

    /// Enable or disable scheduled polling for entries set up afterwards
    pub fn with_polling(mut self, polling: bool) -> Self {
        self.polling = polling;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable configuration; call `reload_entry` for changes to take effect
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    fn update_interval(&self) -> Duration {
        Duration::from_secs(self.config.scan_interval_secs)
    }

    /// Set up a configured entry against its LibreTranslate server
    pub async fn setup_entry(&mut self, entry_id: &str) -> Result<(), AppError> {
        let entry = self
            .config
            .entry(entry_id)
            .cloned()
            .ok_or_else(|| ConfigFlowError::UnknownEntry(entry_id.to_string()))?;
        let provider = LibreTranslate::from_entry(&entry, self.config.timeout_secs)?;
        self.setup_entry_with_provider(entry, Arc::new(provider)).await
    }

    /// Set up an entry with the given client.
    ///
    /// The entry is added to the configuration if it is not there yet. Fails
    /// with `NotReady` when the first refresh fails; nothing is kept then.
    pub async fn setup_entry_with_provider(
        &mut self,
        entry: ConnectionEntry,
        provider: Arc<dyn Provider>,
    ) -> Result<(), AppError> {
        let is_new = self.config.entry(&entry.entry_id).is_none();
        if is_new && self.config.has_server(&entry.unique_id(), None) {
            return Err(ConfigFlowError::AlreadyConfigured(entry.unique_id()).into());
        }
        self.unload_entry(&entry.entry_id);

        let coordinator = Coordinator::new(entry.name.clone(), provider, self.update_interval());
        let snapshot = coordinator.first_refresh().await?;
        if is_new {
            self.config.entries.push(entry.clone());
        }
        info!(
            "Set up {} with {} languages",
            entry.title(),
            snapshot.language_count()
        );

        let poller = if self.polling {
            debug!("Polling '{}' every {:?}", entry.name, coordinator.update_interval());
            Some(coordinator.spawn_polling())
        } else {
            None
        };

        self.runtimes.push(EntryRuntime {
            translator: TranslationService::new(coordinator.clone()),
            entry,
            coordinator,
            poller,
        });
        Ok(())
    }

    /// Set up every configured entry; returns how many are ready
    pub async fn setup_all(&mut self) -> usize {
        let ids: Vec<String> = self.config.entries.iter().map(|e| e.entry_id.clone()).collect();
        let mut ready = 0;
        for id in ids {
            match self.setup_entry(&id).await {
                Ok(()) => ready += 1,
                Err(e) => error!("Failed to set up entry {}: {}", id, e),
            }
        }
        ready
    }

    /// Set up configured entries that are not loaded yet; returns how many became ready
    pub async fn setup_pending(&mut self) -> usize {
        let pending: Vec<String> = self
            .config
            .entries
            .iter()
            .filter(|e| !self.runtimes.iter().any(|r| r.entry.entry_id == e.entry_id))
            .map(|e| e.entry_id.clone())
            .collect();

        let mut ready = 0;
        for id in pending {
            match self.setup_entry(&id).await {
                Ok(()) => ready += 1,
                Err(e) => debug!("Entry {} still not ready: {}", id, e),
            }
        }
        ready
    }

    /// Stop polling and drop the entry's state. Returns false if it was not loaded.
    pub fn unload_entry(&mut self, entry_id: &str) -> bool {
        let Some(index) = self.runtimes.iter().position(|r| r.entry.entry_id == entry_id) else {
            return false;
        };
        let mut runtime = self.runtimes.remove(index);
        runtime.stop();
        debug!("Unloaded '{}'", runtime.entry.name);
        true
    }

    /// Unload and set up again from the current configuration
    pub async fn reload_entry(&mut self, entry_id: &str) -> Result<(), AppError> {
        if !self.unload_entry(entry_id) {
            warn!("Reloading entry {} that was not loaded", entry_id);
        }
        self.setup_entry(entry_id).await
    }

    /// Entries that are currently loaded
    pub fn loaded_entries(&self) -> Vec<&ConnectionEntry> {
        self.runtimes.iter().map(|r| &r.entry).collect()
    }

    fn runtime(&self, entry_id: Option<&str>) -> Result<&EntryRuntime, ServiceError> {
        match entry_id {
            Some(id) => self
                .runtimes
                .iter()
                .find(|r| r.entry.entry_id == id)
                .ok_or_else(|| ServiceError::UnknownEntry(id.to_string())),
            None => self
                .config
                .entries
                .iter()
                .find_map(|e| self.runtimes.iter().find(|r| r.entry.entry_id == e.entry_id))
                .ok_or(ServiceError::NoConfigEntry),
        }
    }

    /// Call a service on the named entry, or on the first configured one
    pub async fn call_service(
        &self,
        name: &str,
        entry_id: Option<&str>,
        data: Value,
    ) -> Result<ServiceResponse, ServiceError> {
        let service: Service = name.parse()?;
        let runtime = self.runtime(entry_id)?;
        debug!("Calling {} on '{}'", service, runtime.entry.name);
        services::handle(service, &runtime.translator, data).await
    }

    /// Orchestrator of an entry
    pub fn translator(&self, entry_id: Option<&str>) -> Option<&TranslationService> {
        self.runtime(entry_id).ok().map(|r| &r.translator)
    }

    /// Coordinator of an entry
    pub fn coordinator(&self, entry_id: &str) -> Option<&Coordinator> {
        self.runtime(Some(entry_id)).ok().map(|r| &r.coordinator)
    }

    /// Health readings of an entry
    pub fn health(&self, entry_id: &str) -> Option<HealthProjection> {
        self.coordinator(entry_id).cloned().map(HealthProjection::new)
    }

    /// Sensors of an entry
    pub fn sensors(&self, entry_id: &str) -> Option<EntrySensors> {
        let coordinator = self.coordinator(entry_id)?;
        Some(EntrySensors {
            status: StatusSensor::new(coordinator.clone(), entry_id),
            language_count: LanguageCountSensor::new(coordinator.clone(), entry_id),
        })
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        for runtime in &mut self.runtimes {
            runtime.stop();
        }
    }
}
