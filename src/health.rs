/*!
 * Read-side projections of coordinator state for display widgets.
 *
 * Nothing here touches the network. Every reading is `None` (unknown)
 * until the coordinator has data, rather than a zero or empty default.
 */

use serde::Serialize;
use std::collections::BTreeMap;

use crate::coordinator::{CapabilitySnapshot, Coordinator, HealthState};

/// Derived health readings for one coordinator
#[derive(Debug, Clone)]
pub struct HealthProjection {
    coordinator: Coordinator,
}

impl HealthProjection {
    /// Project the given coordinator
    pub fn new(coordinator: Coordinator) -> Self {
        Self { coordinator }
    }

    /// Whether the server is reachable; unknown before the first poll
    pub fn is_online(&self) -> Option<bool> {
        match self.coordinator.health() {
            HealthState::Unknown => None,
            state => Some(state == HealthState::Healthy),
        }
    }

    /// Number of installed source languages
    pub fn language_count(&self) -> Option<usize> {
        self.coordinator.data().map(|s| s.language_count())
    }

    /// Display names of installed languages, in server order
    pub fn installed_language_names(&self) -> Option<Vec<String>> {
        self.coordinator
            .data()
            .map(|s| s.languages().iter().map(|l| l.name.clone()).collect())
    }

    /// Codes of installed languages, in server order
    pub fn installed_language_codes(&self) -> Option<Vec<String>> {
        self.coordinator
            .data()
            .map(|s| s.languages().iter().map(|l| l.code.clone()).collect())
    }

    /// Reachable targets per source code
    pub fn language_targets(&self) -> Option<BTreeMap<String, Vec<String>>> {
        self.coordinator.data().map(|s| {
            s.languages()
                .iter()
                .map(|l| (l.code.clone(), l.targets.clone()))
                .collect()
        })
    }

    /// Whether `code` is an installed source language
    pub fn is_language_installed(&self, code: &str) -> Option<bool> {
        self.coordinator.data().map(|s| s.is_installed(code))
    }

    /// Names, codes and pairs from a single snapshot read
    pub fn attributes(&self) -> Option<LanguageAttributes> {
        self.coordinator.data().map(|s| LanguageAttributes::from_snapshot(&s))
    }

    /// Everything a widget needs in one serializable value
    pub fn display_snapshot(&self) -> DisplaySnapshot {
        let status = match self.coordinator.health() {
            HealthState::Unknown => DisplayStatus::Unknown,
            HealthState::Healthy => DisplayStatus::Ok,
            HealthState::Degraded => DisplayStatus::Error,
        };

        match self.coordinator.data() {
            Some(snapshot) => {
                let attributes = LanguageAttributes::from_snapshot(&snapshot);
                DisplaySnapshot {
                    status,
                    language_count: Some(snapshot.language_count()),
                    languages: Some(attributes.languages),
                    language_codes: Some(attributes.language_codes),
                    language_targets: Some(attributes.language_targets),
                }
            }
            None => DisplaySnapshot {
                status,
                language_count: None,
                languages: None,
                language_codes: None,
                language_targets: None,
            },
        }
    }
}

/// Server status as shown to widgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStatus {
    Ok,
    Error,
    Unknown,
}

/// Polled key-value view of one server
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplaySnapshot {
    pub status: DisplayStatus,
    pub language_count: Option<usize>,
    pub languages: Option<Vec<String>>,
    pub language_codes: Option<Vec<String>>,
    pub language_targets: Option<BTreeMap<String, Vec<String>>>,
}

/// Connectivity sensor: on while the server is reachable
#[derive(Debug, Clone)]
pub struct StatusSensor {
    unique_id: String,
    coordinator: Coordinator,
}

impl StatusSensor {
    pub const NAME: &'static str = "Status";
    pub const DEVICE_CLASS: &'static str = "connectivity";
    pub const ICON: &'static str = "mdi:server";

    pub fn new(coordinator: Coordinator, entry_id: &str) -> Self {
        Self {
            unique_id: format!("{}_status", entry_id),
            coordinator,
        }
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn device_class(&self) -> &'static str {
        Self::DEVICE_CLASS
    }

    /// True when the last poll succeeded
    pub fn is_on(&self) -> bool {
        self.coordinator.last_update_success()
    }
}

/// Attributes of the language count sensor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageAttributes {
    pub languages: Vec<String>,
    pub language_codes: Vec<String>,
    pub language_targets: BTreeMap<String, Vec<String>>,
}

impl LanguageAttributes {
    fn from_snapshot(snapshot: &CapabilitySnapshot) -> Self {
        let languages = snapshot.languages();
        Self {
            languages: languages.iter().map(|l| l.name.clone()).collect(),
            language_codes: languages.iter().map(|l| l.code.clone()).collect(),
            language_targets: languages
                .iter()
                .map(|l| (l.code.clone(), l.targets.clone()))
                .collect(),
        }
    }
}

/// Number of installed languages, with names and pairs as attributes
#[derive(Debug, Clone)]
pub struct LanguageCountSensor {
    unique_id: String,
    projection: HealthProjection,
}

impl LanguageCountSensor {
    pub const NAME: &'static str = "Available Languages";
    pub const ICON: &'static str = "mdi:translate";

    pub fn new(coordinator: Coordinator, entry_id: &str) -> Self {
        Self {
            unique_id: format!("{}_language_count", entry_id),
            projection: HealthProjection::new(coordinator),
        }
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Hidden unless the user enables it
    pub fn enabled_by_default(&self) -> bool {
        false
    }

    pub fn native_value(&self) -> Option<usize> {
        self.projection.language_count()
    }

    pub fn extra_state_attributes(&self) -> Option<LanguageAttributes> {
        self.projection.attributes()
    }
}
