//! Configuration for a settings node

use std::collections::BTreeMap;

use serde::Deserialize;

/// Static node configuration.
///
/// `settings` holds startup values in their raw boundary encoding, keyed
/// by setting name. They become the node's baseline: a dynamic override
/// that is later removed reverts to these values, not to the catalog
/// defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Unique node identifier, used in logs and convergence diagnostics.
    pub node_id: String,

    /// Startup setting values (raw boundary encoding).
    #[serde(default)]
    pub settings: BTreeMap<String, serde_json::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_id: String::new(),
            settings: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn new(node_id: &str) -> Self {
        Self {
            node_id: node_id.to_string(),
            settings: BTreeMap::new(),
        }
    }

    /// Add a startup setting value.
    pub fn with_setting(mut self, name: &str, raw: serde_json::Value) -> Self {
        self.settings.insert(name.to_string(), raw);
        self
    }
}
