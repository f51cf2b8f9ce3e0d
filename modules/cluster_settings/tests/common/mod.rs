//! Shared test helpers for cluster settings integration tests.
//!
//! Spins up multi-node "clusters" sharing one in-process cluster state
//! service, so updates propagate to every node through the real listener
//! path.

// Each test binary compiles this module independently and only uses a subset
// of exports, so unused items are expected.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use cluster_settings::config::Config;
use cluster_settings::domain::{
    ConvergenceObserver, ConvergencePolicy, SettingCatalog, SettingsRegistry,
};
use cluster_settings::infra::LocalClusterState;
use cluster_settings::{ClusterSettingsApi, SettingValue, SettingsError, SettingsUpdate, SettingsNode};

/// A cluster of settings nodes wired to one in-process state service.
pub struct TestCluster {
    pub service: Arc<LocalClusterState>,
    pub nodes: Vec<SettingsNode>,
    observer: ConvergenceObserver,
}

impl TestCluster {
    pub fn registries(&self) -> Vec<Arc<SettingsRegistry>> {
        self.nodes.iter().map(|n| n.registry().clone()).collect()
    }

    /// Submit an update to the cluster state service.
    pub async fn submit(&self, update: SettingsUpdate) -> Result<(), SettingsError> {
        self.service.update_settings(update).await
    }

    /// Wait until every node reports `expected` for `name`.
    pub async fn await_value(
        &self,
        name: &str,
        expected: &SettingValue,
    ) -> Result<(), SettingsError> {
        self.observer
            .await_value(name, expected, &self.registries())
            .await
    }

    /// Add a node to the running cluster.
    pub fn join(&mut self, config: Config) {
        let node = SettingsNode::start(
            config,
            Arc::new(SettingCatalog::agent()),
            self.service.subscribe(),
        )
        .unwrap();
        self.nodes.push(node);
    }
}

impl Drop for TestCluster {
    fn drop(&mut self) {
        for node in &self.nodes {
            node.shutdown();
        }
    }
}

/// Convergence policy tight enough for tests but with real backoff.
pub fn test_policy() -> ConvergencePolicy {
    ConvergencePolicy {
        timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(10),
        max_interval: Duration::from_millis(100),
    }
}

/// Spawn a cluster of `size` nodes with the given per-node startup settings.
pub fn spawn_cluster_with(size: usize, base: &Config) -> TestCluster {
    let catalog = Arc::new(SettingCatalog::agent());
    let service = Arc::new(LocalClusterState::new(catalog.clone()));
    let nodes = (1..=size)
        .map(|i| {
            let mut config = base.clone();
            config.node_id = format!("node-{i}");
            SettingsNode::start(config, catalog.clone(), service.subscribe()).unwrap()
        })
        .collect();
    TestCluster {
        service,
        nodes,
        observer: ConvergenceObserver::new(test_policy()),
    }
}

/// Spawn a cluster of `size` nodes with default startup settings.
pub fn spawn_cluster(size: usize) -> TestCluster {
    spawn_cluster_with(size, &Config::default())
}
