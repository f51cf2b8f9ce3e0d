//! Setting definition catalog
//!
//! Declares, once per process, the fixed set of known settings and
//! resolves lookups, including wildcard groups (`prefix.*`).

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::bail;

use crate::contract::{SettingDefinition, SettingsError, TimeValue};

// Monitoring agent setting keys.
pub const STARTUP_DELAY: &str = "marvel.agent.startup.delay";
pub const INTERVAL: &str = "marvel.agent.interval";
pub const INDEX_STATS_TIMEOUT: &str = "marvel.agent.index.stats.timeout";
pub const INDICES_STATS_TIMEOUT: &str = "marvel.agent.indices.stats.timeout";
pub const INDICES: &str = "marvel.agent.indices";
pub const CLUSTER_STATE_TIMEOUT: &str = "marvel.agent.cluster.state.timeout";
pub const CLUSTER_STATS_TIMEOUT: &str = "marvel.agent.cluster.stats.timeout";
pub const INDEX_RECOVERY_TIMEOUT: &str = "marvel.agent.index.recovery.timeout";
pub const INDEX_RECOVERY_ACTIVE_ONLY: &str = "marvel.agent.index.recovery.active_only";
pub const COLLECTORS: &str = "marvel.agent.collectors";
pub const LICENSE_GRACE_PERIOD: &str = "marvel.agent.license.grace.period";
pub const EXPORTERS: &str = "marvel.agent.exporters.*";

/// The catalog of setting definitions known to a node.
///
/// Names are unique; construction fails on duplicates.
#[derive(Debug, Clone)]
pub struct SettingCatalog {
    definitions: HashMap<String, Arc<SettingDefinition>>,
    /// Wildcard definitions, kept separately for prefix resolution.
    wildcards: Vec<Arc<SettingDefinition>>,
}

impl SettingCatalog {
    pub fn new(definitions: Vec<SettingDefinition>) -> anyhow::Result<Self> {
        let mut by_name = HashMap::with_capacity(definitions.len());
        let mut wildcards = Vec::new();
        for definition in definitions {
            let definition = Arc::new(definition);
            if definition.is_wildcard() {
                wildcards.push(definition.clone());
            }
            if by_name
                .insert(definition.name.clone(), definition.clone())
                .is_some()
            {
                bail!("duplicate setting definition: {}", definition.name);
            }
        }
        Ok(Self {
            definitions: by_name,
            wildcards,
        })
    }

    /// The fixed monitoring agent catalog.
    pub fn agent() -> Self {
        let definitions = vec![
            SettingDefinition::duration(STARTUP_DELAY, TimeValue::from_secs(10), false),
            SettingDefinition::duration(INTERVAL, TimeValue::from_secs(10), true),
            SettingDefinition::duration(INDEX_STATS_TIMEOUT, TimeValue::from_minutes(10), true),
            SettingDefinition::duration(INDICES_STATS_TIMEOUT, TimeValue::from_minutes(10), true),
            SettingDefinition::string_array(INDICES, &[], true),
            SettingDefinition::duration(CLUSTER_STATE_TIMEOUT, TimeValue::from_minutes(10), true),
            SettingDefinition::duration(CLUSTER_STATS_TIMEOUT, TimeValue::from_minutes(10), true),
            SettingDefinition::duration(INDEX_RECOVERY_TIMEOUT, TimeValue::from_minutes(10), true),
            SettingDefinition::boolean(INDEX_RECOVERY_ACTIVE_ONLY, false, true),
            SettingDefinition::string_array(COLLECTORS, &[], false),
            SettingDefinition::duration(LICENSE_GRACE_PERIOD, TimeValue::from_hours(7 * 24), false),
            SettingDefinition::string(EXPORTERS, "", true),
        ];
        match Self::new(definitions) {
            Ok(catalog) => catalog,
            // The fixed catalog has unique names.
            Err(_) => unreachable!(),
        }
    }

    /// Resolve a key to its definition.
    ///
    /// Exact match first; otherwise the trailing path segment is stripped
    /// and the remainder re-queried with a `.*` suffix.
    pub fn lookup(&self, name: &str) -> Result<&Arc<SettingDefinition>, SettingsError> {
        if let Some(definition) = self.definitions.get(name) {
            return Ok(definition);
        }
        if let Some((prefix, _)) = name.rsplit_once('.') {
            if let Some(definition) = self.definitions.get(&format!("{}.*", prefix)) {
                return Ok(definition);
            }
        }
        // Deeply nested sub-keys (more than one segment below the group
        // prefix) still belong to the group.
        if let Some(definition) = self
            .wildcards
            .iter()
            .find(|definition| definition.matches_wildcard(name))
        {
            return Ok(definition);
        }
        Err(SettingsError::UnknownSetting {
            name: name.to_string(),
        })
    }

    /// All dynamic definitions, wildcard groups included.
    pub fn all_dynamic(&self) -> Vec<&Arc<SettingDefinition>> {
        let mut dynamic: Vec<_> = self
            .definitions
            .values()
            .filter(|definition| definition.dynamic)
            .collect();
        dynamic.sort_by(|a, b| a.name.cmp(&b.name));
        dynamic
    }

    /// All concrete (non-wildcard) definitions.
    pub fn concrete(&self) -> Vec<&Arc<SettingDefinition>> {
        let mut concrete: Vec<_> = self
            .definitions
            .values()
            .filter(|definition| !definition.is_wildcard())
            .collect();
        concrete.sort_by(|a, b| a.name.cmp(&b.name));
        concrete
    }
}
