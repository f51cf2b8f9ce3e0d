//! Cluster state listener
//!
//! Bridges cluster state change notifications into registry updates. The
//! listener applies the snapshot current at startup, then re-applies on
//! every change notification. Per-key failures are logged and do not
//! block sibling keys; the registry's version guard makes re-application
//! of an already-seen state a no-op.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::contract::ClusterStateSnapshot;
use crate::domain::registry::SettingsRegistry;

/// A running cluster state listener task for one node.
pub struct ClusterStateListener {
    handle: JoinHandle<()>,
}

impl ClusterStateListener {
    /// Spawn the listener loop.
    ///
    /// The task ends when the cluster state service side of the channel
    /// is dropped, or when [`ClusterStateListener::abort`] is called.
    pub fn spawn(
        registry: Arc<SettingsRegistry>,
        mut state_rx: watch::Receiver<ClusterStateSnapshot>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            loop {
                let state = state_rx.borrow_and_update().clone();
                apply(&registry, &state);
                if state_rx.changed().await.is_err() {
                    debug!(node = %registry.node_id(), "cluster state service closed, stopping listener");
                    break;
                }
            }
        });
        Self { handle }
    }

    /// Whether the listener task is still running.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the listener task.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

fn apply(registry: &SettingsRegistry, state: &ClusterStateSnapshot) {
    let outcome = registry.apply_state(state);
    for (name, error) in &outcome.errors {
        warn!(
            node = %registry.node_id(),
            version = state.version,
            setting = %name,
            %error,
            "failed to apply cluster setting, keeping previous value"
        );
    }
}
