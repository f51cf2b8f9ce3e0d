//! Node wiring for the settings service
//!
//! A [`SettingsNode`] owns one registry and the listener task that keeps
//! it in sync with cluster state. There is no ambient singleton: the
//! registry is constructed here and handed out by reference.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::info;

use crate::config::Config;
use crate::contract::ClusterStateSnapshot;
use crate::domain::{ClusterStateListener, SettingCatalog, SettingsRegistry};

/// One node's settings service: registry plus cluster state listener.
pub struct SettingsNode {
    registry: Arc<SettingsRegistry>,
    listener: ClusterStateListener,
}

impl SettingsNode {
    /// Build the registry from static configuration and start listening
    /// for cluster state changes.
    pub fn start(
        config: Config,
        catalog: Arc<SettingCatalog>,
        state_rx: watch::Receiver<ClusterStateSnapshot>,
    ) -> Result<Self> {
        let node_id = config.node_id.clone();
        let registry = Arc::new(
            SettingsRegistry::new(catalog, &config)
                .with_context(|| format!("invalid static settings for node {}", node_id))?,
        );
        let listener = ClusterStateListener::spawn(registry.clone(), state_rx);
        info!(node = %node_id, "settings node started");
        Ok(Self { registry, listener })
    }

    pub fn registry(&self) -> &Arc<SettingsRegistry> {
        &self.registry
    }

    pub fn node_id(&self) -> &str {
        self.registry.node_id()
    }

    /// Stop the listener. The registry stays readable with its last
    /// applied values.
    pub fn shutdown(&self) {
        self.listener.abort();
        info!(node = %self.registry.node_id(), "settings node stopped");
    }
}
