//! Settings registry - per-node source of truth for current values
//!
//! The registry is constructed once per node from the definition catalog
//! and the node's static configuration, and is mutated only by applying
//! updates (directly or as a resolved cluster-state batch). Readers are
//! never blocked into observing a half-applied value: each key is
//! replaced atomically under the write lock.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::debug;

use crate::config::Config;
use crate::contract::{
    ClusterStateSnapshot, SettingValue, SettingsError, TimeValue,
};
use crate::domain::catalog::SettingCatalog;
use crate::domain::events::SettingEvent;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Current state of one concrete setting key.
#[derive(Debug, Clone)]
struct Entry {
    value: SettingValue,
    /// Startup value (static configuration or catalog default); removal of
    /// a dynamic override restores this.
    baseline: SettingValue,
    /// Whether the current value came from a cluster-state override.
    overridden: bool,
}

/// Result of applying one cluster-state snapshot.
#[derive(Debug, Clone, Default)]
pub struct ApplyOutcome {
    /// The snapshot was at or below the last applied version and was
    /// discarded without touching any key.
    pub superseded: bool,
    /// Keys whose value actually changed.
    pub changed: Vec<String>,
    /// Per-key failures; sibling keys in the same batch still applied.
    pub errors: Vec<(String, SettingsError)>,
}

impl ApplyOutcome {
    fn superseded() -> Self {
        Self {
            superseded: true,
            ..Self::default()
        }
    }

    pub fn is_noop(&self) -> bool {
        self.changed.is_empty() && self.errors.is_empty()
    }
}

/// Per-node settings registry.
///
/// One instance per node, explicitly owned and passed by reference to the
/// cluster state listener and to readers.
pub struct SettingsRegistry {
    node_id: String,
    catalog: Arc<SettingCatalog>,
    entries: RwLock<HashMap<String, Entry>>,
    /// Last applied cluster state version. The mutex also serializes batch
    /// application so interleaved batches cannot mix per-key writes.
    applied_version: Mutex<u64>,
    events: broadcast::Sender<SettingEvent>,
}

impl SettingsRegistry {
    /// Build a registry seeded from catalog defaults overridden by the
    /// node's static configuration.
    ///
    /// Static configuration may set any declared key, static or dynamic,
    /// including concrete sub-keys of a wildcard group. Unknown keys and
    /// values of the wrong shape are rejected.
    pub fn new(catalog: Arc<SettingCatalog>, config: &Config) -> Result<Self, SettingsError> {
        let mut entries = HashMap::new();
        for definition in catalog.concrete() {
            let baseline = match config.settings.get(&definition.name) {
                Some(raw) => definition.kind.parse(&definition.name, raw)?,
                None => definition.default.clone(),
            };
            entries.insert(
                definition.name.clone(),
                Entry {
                    value: baseline.clone(),
                    baseline,
                    overridden: false,
                },
            );
        }
        // Wildcard sub-keys present in the static configuration.
        for (name, raw) in &config.settings {
            if entries.contains_key(name) {
                continue;
            }
            let definition = catalog.lookup(name)?;
            let baseline = definition.kind.parse(name, raw)?;
            entries.insert(
                name.clone(),
                Entry {
                    value: baseline.clone(),
                    baseline,
                    overridden: false,
                },
            );
        }
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            node_id: config.node_id.clone(),
            catalog,
            entries: RwLock::new(entries),
            applied_version: Mutex::new(0),
            events,
        })
    }

    /// The id of the node owning this registry.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn catalog(&self) -> &Arc<SettingCatalog> {
        &self.catalog
    }

    /// Subscribe to value-change events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SettingEvent> {
        self.events.subscribe()
    }

    /// Current value of a setting.
    ///
    /// Unset members of a wildcard group read the group default.
    pub fn get(&self, name: &str) -> Result<SettingValue, SettingsError> {
        let definition = self.catalog.lookup(name)?;
        if let Some(entry) = self.entries.read().get(name) {
            return Ok(entry.value.clone());
        }
        Ok(definition.default.clone())
    }

    pub fn get_duration(&self, name: &str) -> Result<TimeValue, SettingsError> {
        let value = self.get(name)?;
        value.as_duration().ok_or_else(|| Self::kind_mismatch(name, &value))
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, SettingsError> {
        let value = self.get(name)?;
        value.as_bool().ok_or_else(|| Self::kind_mismatch(name, &value))
    }

    pub fn get_string(&self, name: &str) -> Result<String, SettingsError> {
        let value = self.get(name)?;
        match value {
            SettingValue::String(s) => Ok(s),
            other => Err(Self::kind_mismatch(name, &other)),
        }
    }

    pub fn get_string_array(&self, name: &str) -> Result<Vec<String>, SettingsError> {
        let value = self.get(name)?;
        match value {
            SettingValue::StringArray(items) => Ok(items),
            other => Err(Self::kind_mismatch(name, &other)),
        }
    }

    fn kind_mismatch(name: &str, value: &SettingValue) -> SettingsError {
        SettingsError::TypeMismatch {
            name: name.to_string(),
            expected: value.kind(),
            given: value.to_string(),
        }
    }

    /// Apply a single dynamic update.
    ///
    /// Returns whether the value actually changed; re-applying the current
    /// value is a no-op. This is the sole mutation point besides
    /// [`SettingsRegistry::revert`].
    pub fn apply_update(
        &self,
        name: &str,
        raw: &serde_json::Value,
    ) -> Result<bool, SettingsError> {
        self.apply_dynamic(name, raw, None)
    }

    fn apply_dynamic(
        &self,
        name: &str,
        raw: &serde_json::Value,
        version: Option<u64>,
    ) -> Result<bool, SettingsError> {
        let definition = self.catalog.lookup(name)?;
        if !definition.dynamic {
            return Err(SettingsError::StaticSettingImmutable {
                name: name.to_string(),
            });
        }
        let parsed = definition.kind.parse(name, raw)?;

        let mut entries = self.entries.write();
        let entry = entries.entry(name.to_string()).or_insert_with(|| Entry {
            value: definition.default.clone(),
            baseline: definition.default.clone(),
            overridden: false,
        });
        entry.overridden = true;
        if entry.value == parsed {
            return Ok(false);
        }
        let old = std::mem::replace(&mut entry.value, parsed.clone());
        drop(entries);

        debug!(node = %self.node_id, setting = name, old = %old, new = %parsed, "setting updated");
        let _ = self
            .events
            .send(SettingEvent::changed(name, old, parsed, version));
        Ok(true)
    }

    /// Restore a setting to its startup baseline.
    ///
    /// Returns whether the value actually changed.
    pub fn revert(&self, name: &str) -> Result<bool, SettingsError> {
        self.catalog.lookup(name)?;
        let mut entries = self.entries.write();
        let Some(entry) = entries.get_mut(name) else {
            // Unset wildcard sub-key; already at its default.
            return Ok(false);
        };
        entry.overridden = false;
        if entry.value == entry.baseline {
            return Ok(false);
        }
        let restored = entry.baseline.clone();
        let old = std::mem::replace(&mut entry.value, restored.clone());
        drop(entries);

        debug!(node = %self.node_id, setting = name, restored = %restored, "setting reverted to baseline");
        let _ = self.events.send(SettingEvent::reverted(name, old, restored));
        Ok(true)
    }

    /// Immutable copy of all current values; never aliases internal state.
    pub fn snapshot(&self) -> HashMap<String, SettingValue> {
        self.entries
            .read()
            .iter()
            .map(|(name, entry)| (name.clone(), entry.value.clone()))
            .collect()
    }

    /// Apply a resolved cluster-state settings snapshot.
    ///
    /// Snapshots at or below the last applied version are discarded, so a
    /// stale notification can never overwrite a newer value. Keys absent
    /// from the merged document that were previously overridden revert to
    /// their baseline. Per-key failures are isolated; sibling keys still
    /// apply.
    pub fn apply_state(&self, state: &ClusterStateSnapshot) -> ApplyOutcome {
        let mut applied_version = self.applied_version.lock();
        if state.version <= *applied_version {
            return ApplyOutcome::superseded();
        }

        let merged = state.merged();
        let mut outcome = ApplyOutcome::default();
        for (name, raw) in &merged {
            match self.apply_dynamic(name, raw, Some(state.version)) {
                Ok(true) => outcome.changed.push(name.to_string()),
                Ok(false) => {}
                // Keys in the shared cluster document that this catalog does
                // not declare belong to other subsystems.
                Err(SettingsError::UnknownSetting { .. }) => {}
                Err(err) => outcome.errors.push((name.to_string(), err)),
            }
        }

        // Overridden keys no longer present in the merged document revert
        // to their startup baseline.
        let removed: Vec<String> = self
            .entries
            .read()
            .iter()
            .filter(|(name, entry)| entry.overridden && !merged.contains_key(name.as_str()))
            .map(|(name, _)| name.clone())
            .collect();
        for name in removed {
            match self.revert(&name) {
                Ok(true) => outcome.changed.push(name),
                Ok(false) => {}
                Err(err) => outcome.errors.push((name, err)),
            }
        }

        *applied_version = state.version;
        debug!(
            node = %self.node_id,
            version = state.version,
            changed = outcome.changed.len(),
            errors = outcome.errors.len(),
            "applied cluster settings state"
        );
        outcome
    }
}
