//! Domain events for the settings registry
//!
//! The registry emits an event for every observable value change so that
//! components reacting to reconfiguration (pollers, exporters) do not
//! have to diff snapshots themselves.

use chrono::{DateTime, Utc};

use crate::contract::SettingValue;

/// Domain event types for settings
#[derive(Debug, Clone, PartialEq)]
pub enum SettingEvent {
    /// A dynamic setting took a new value.
    SettingChanged(SettingChangedEvent),
    /// A removed override reverted a setting to its startup baseline.
    SettingReverted(SettingRevertedEvent),
}

/// Event data for a value change
#[derive(Debug, Clone, PartialEq)]
pub struct SettingChangedEvent {
    pub name: String,
    pub old: SettingValue,
    pub new: SettingValue,
    /// Cluster state version that carried the change, when applied as part
    /// of a batch; `None` for direct updates.
    pub version: Option<u64>,
    pub timestamp: DateTime<Utc>,
}

/// Event data for a baseline revert
#[derive(Debug, Clone, PartialEq)]
pub struct SettingRevertedEvent {
    pub name: String,
    pub old: SettingValue,
    pub restored: SettingValue,
    pub timestamp: DateTime<Utc>,
}

impl SettingEvent {
    /// Create a new SettingChanged event
    pub fn changed(
        name: &str,
        old: SettingValue,
        new: SettingValue,
        version: Option<u64>,
    ) -> Self {
        SettingEvent::SettingChanged(SettingChangedEvent {
            name: name.to_string(),
            old,
            new,
            version,
            timestamp: Utc::now(),
        })
    }

    /// Create a new SettingReverted event
    pub fn reverted(name: &str, old: SettingValue, restored: SettingValue) -> Self {
        SettingEvent::SettingReverted(SettingRevertedEvent {
            name: name.to_string(),
            old,
            restored,
            timestamp: Utc::now(),
        })
    }

    /// The setting key this event concerns.
    pub fn name(&self) -> &str {
        match self {
            SettingEvent::SettingChanged(e) => &e.name,
            SettingEvent::SettingReverted(e) => &e.name,
        }
    }
}
