/*!
 * Capability coordinator.
 *
 * Owns the cached view of one translation server: the installed languages
 * and whether the last poll reached the server. The snapshot is replaced
 * wholesale on every successful poll and kept (stale) when a poll fails.
 * Health is a separate atomic flag so that request paths can mark the
 * server down synchronously, without waiting for the next poll.
 */

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, WeakShared};
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::errors::{CoordinatorError, ProviderError};
use crate::providers::{DetectionCandidate, LanguageDescriptor, Provider, TranslateResponse};

/// Installed languages as seen by one successful poll
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilitySnapshot {
    languages: Vec<LanguageDescriptor>,
    language_count: usize,
    fetched_at: DateTime<Utc>,
}

impl CapabilitySnapshot {
    /// Snapshot fetched now
    pub fn new(languages: Vec<LanguageDescriptor>) -> Self {
        Self::fetched_at(languages, Utc::now())
    }

    /// Snapshot with an explicit fetch time
    pub fn fetched_at(languages: Vec<LanguageDescriptor>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            language_count: languages.len(),
            languages,
            fetched_at,
        }
    }

    /// Installed source languages, in server order
    pub fn languages(&self) -> &[LanguageDescriptor] {
        &self.languages
    }

    /// Always equal to `languages().len()`
    pub fn language_count(&self) -> usize {
        self.language_count
    }

    /// When the poll completed
    pub fn fetch_time(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Descriptor for a source code
    pub fn find(&self, code: &str) -> Option<&LanguageDescriptor> {
        self.languages.iter().find(|l| l.code == code)
    }

    /// Whether `code` is an installed source language
    pub fn is_installed(&self, code: &str) -> bool {
        self.find(code).is_some()
    }
}

/// Externally observable health of a coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    /// No poll has completed yet
    Unknown,
    /// Last poll succeeded and no transport failure was seen since
    Healthy,
    /// Last poll failed, or a request hit a transport failure
    Degraded,
}

const STATE_UNKNOWN: u8 = 0;
const STATE_HEALTHY: u8 = 1;
const STATE_DEGRADED: u8 = 2;

impl HealthState {
    /// Status string kept beside the snapshot
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Healthy => "ok",
            Self::Degraded => "error",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            STATE_HEALTHY => Self::Healthy,
            STATE_DEGRADED => Self::Degraded,
            _ => Self::Unknown,
        }
    }
}

type RefreshFuture = BoxFuture<'static, Result<Arc<CapabilitySnapshot>, CoordinatorError>>;

struct CoordinatorState {
    name: String,
    provider: Arc<dyn Provider>,
    update_interval: Duration,
    snapshot: RwLock<Option<Arc<CapabilitySnapshot>>>,
    health: AtomicU8,
    last_error: Mutex<Option<String>>,
    last_success_at: Mutex<Option<DateTime<Utc>>>,
    last_failure_at: Mutex<Option<DateTime<Utc>>>,
    // Weak so an abandoned poll is dropped with its last waiter
    in_flight: Mutex<Option<WeakShared<RefreshFuture>>>,
}

impl CoordinatorState {
    async fn poll(self: Arc<Self>) -> Result<Arc<CapabilitySnapshot>, CoordinatorError> {
        debug!("Fetching languages from '{}'", self.name);
        let result = self.provider.languages().await;

        match result {
            Ok(languages) => {
                let snapshot = Arc::new(CapabilitySnapshot::new(languages));
                *self.snapshot.write() = Some(Arc::clone(&snapshot));
                *self.last_success_at.lock() = Some(snapshot.fetch_time());
                *self.last_error.lock() = None;

                let previous = self.health.swap(STATE_HEALTHY, Ordering::AcqRel);
                if previous == STATE_DEGRADED {
                    info!("Translation server '{}' is reachable again", self.name);
                }
                debug!("'{}' reports {} installed languages", self.name, snapshot.language_count());
                Ok(snapshot)
            }
            Err(err) => {
                *self.last_error.lock() = Some(err.to_string());
                *self.last_failure_at.lock() = Some(Utc::now());
                let previous = self.health.swap(STATE_DEGRADED, Ordering::AcqRel);
                if previous == STATE_DEGRADED {
                    debug!("Poll of '{}' failed again: {}", self.name, err);
                } else {
                    warn!("Poll of '{}' failed: {}", self.name, err);
                }
                Err(CoordinatorError::UpdateFailed(err))
            }
        }
    }
}

/// Coordinator for one configured translation server
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct Coordinator {
    state: Arc<CoordinatorState>,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("name", &self.state.name)
            .field("health", &self.health())
            .finish()
    }
}

impl Coordinator {
    /// Create a coordinator with no data
    pub fn new(name: impl Into<String>, provider: Arc<dyn Provider>, update_interval: Duration) -> Self {
        Self {
            state: Arc::new(CoordinatorState {
                name: name.into(),
                provider,
                update_interval,
                snapshot: RwLock::new(None),
                health: AtomicU8::new(STATE_UNKNOWN),
                last_error: Mutex::new(None),
                last_success_at: Mutex::new(None),
                last_failure_at: Mutex::new(None),
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Name used in logs
    pub fn name(&self) -> &str {
        &self.state.name
    }

    /// Poll interval
    pub fn update_interval(&self) -> Duration {
        self.state.update_interval
    }

    /// Poll the server now.
    ///
    /// If a poll is already running, this waits for that poll instead of
    /// starting another one. A poll whose callers all went away is dropped.
    pub async fn refresh(&self) -> Result<Arc<CapabilitySnapshot>, CoordinatorError> {
        let future = {
            let mut slot = self.state.in_flight.lock();
            match slot.as_ref().and_then(WeakShared::upgrade) {
                Some(running) => {
                    debug!("Poll of '{}' already in flight, joining it", self.state.name);
                    running
                }
                None => {
                    let state = Arc::clone(&self.state);
                    let future = state.poll().boxed().shared();
                    *slot = future.downgrade();
                    future
                }
            }
        };

        future.await
    }

    /// Refresh at setup; failure means the entry is not ready
    pub async fn first_refresh(&self) -> Result<Arc<CapabilitySnapshot>, CoordinatorError> {
        self.refresh().await.map_err(|err| CoordinatorError::NotReady {
            name: self.state.name.clone(),
            reason: err.to_string(),
        })
    }

    /// Start the scheduled poll loop. Abort the handle to stop it.
    pub fn spawn_polling(&self) -> JoinHandle<()> {
        let coordinator = self.clone();
        let period = self.state.update_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                // Failures are logged and recorded by the poll itself
                let _ = coordinator.refresh().await;
            }
        })
    }

    /// Mark the server degraded right away. Never blocks on I/O.
    pub fn set_immediate_error(&self, reason: impl Into<String>) {
        let reason = reason.into();
        let mut current = self.state.health.load(Ordering::Acquire);
        while current != STATE_DEGRADED {
            match self.state.health.compare_exchange_weak(
                current,
                STATE_DEGRADED,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    warn!("Translation server '{}' marked unavailable: {}", self.state.name, reason);
                    break;
                }
                Err(actual) => current = actual,
            }
        }
        *self.state.last_error.lock() = Some(reason);
        *self.state.last_failure_at.lock() = Some(Utc::now());
    }

    /// Translate through the server; errors are passed through unchanged
    pub async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<TranslateResponse, ProviderError> {
        self.state.provider.translate(text, source, target).await
    }

    /// Detect through the server; errors are passed through unchanged
    pub async fn detect(&self, text: &str) -> Result<Vec<DetectionCandidate>, ProviderError> {
        self.state.provider.detect(text).await
    }

    /// Latest snapshot, possibly stale. `None` until a poll succeeds.
    pub fn data(&self) -> Option<Arc<CapabilitySnapshot>> {
        self.state.snapshot.read().clone()
    }

    /// Current health
    pub fn health(&self) -> HealthState {
        HealthState::from_u8(self.state.health.load(Ordering::Acquire))
    }

    /// "ok", "error", or "unknown" before the first poll
    pub fn status(&self) -> &'static str {
        self.health().as_str()
    }

    /// Whether the last poll succeeded and no transport failure was seen since
    pub fn last_update_success(&self) -> bool {
        self.health() == HealthState::Healthy
    }

    /// Time of the last successful poll
    pub fn last_update_success_time(&self) -> Option<DateTime<Utc>> {
        *self.state.last_success_at.lock()
    }

    /// Time of the last failed poll or transport failure
    pub fn last_failure_time(&self) -> Option<DateTime<Utc>> {
        *self.state.last_failure_at.lock()
    }

    /// Reason for the current degraded state
    pub fn last_error(&self) -> Option<String> {
        self.state.last_error.lock().clone()
    }
}
