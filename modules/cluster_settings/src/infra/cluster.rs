//! In-process cluster state service
//!
//! An in-memory implementation of the cluster state service and its
//! update submission API, used for integration tests and single-process
//! deployments. It records transient and persistent settings documents,
//! versions every change, and fans the resulting snapshot out to node
//! listeners over a watch channel.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::contract::{
    ClusterSettingsApi, ClusterStateSnapshot, SettingsError, SettingsUpdate, UpdateScope,
};
use crate::domain::catalog::SettingCatalog;

#[derive(Debug, Default)]
struct State {
    version: u64,
    transient: BTreeMap<String, serde_json::Value>,
    persistent: BTreeMap<String, serde_json::Value>,
}

/// In-memory cluster state service.
///
/// `update_settings` success means the change is recorded here; nodes
/// converge on it asynchronously through their listeners.
pub struct LocalClusterState {
    catalog: Arc<SettingCatalog>,
    state: Mutex<State>,
    state_tx: watch::Sender<ClusterStateSnapshot>,
}

impl LocalClusterState {
    pub fn new(catalog: Arc<SettingCatalog>) -> Self {
        let (state_tx, _) = watch::channel(ClusterStateSnapshot::default());
        Self {
            catalog,
            state: Mutex::new(State::default()),
            state_tx,
        }
    }

    /// Subscribe a node listener to cluster state changes.
    pub fn subscribe(&self) -> watch::Receiver<ClusterStateSnapshot> {
        self.state_tx.subscribe()
    }

    /// The current cluster state version.
    pub fn version(&self) -> u64 {
        self.state.lock().version
    }

    /// Simulate a full cluster restart: transient settings are cleared,
    /// persistent settings survive.
    pub fn restart(&self) {
        let mut state = self.state.lock();
        state.transient.clear();
        state.version += 1;
        info!(version = state.version, "cluster restarted, transient settings cleared");
        self.publish(&state);
    }

    fn publish(&self, state: &State) {
        self.state_tx.send_replace(ClusterStateSnapshot {
            version: state.version,
            transient: state.transient.clone(),
            persistent: state.persistent.clone(),
        });
    }

    /// Validate every key of an update against the catalog.
    ///
    /// The whole update is rejected on the first unknown or static key, so
    /// an invalid update never reaches cluster state.
    fn validate(&self, update: &SettingsUpdate) -> Result<(), SettingsError> {
        for name in update.settings.keys() {
            let definition = self.catalog.lookup(name)?;
            if !definition.dynamic {
                return Err(SettingsError::StaticSettingImmutable {
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterSettingsApi for LocalClusterState {
    async fn update_settings(&self, update: SettingsUpdate) -> Result<(), SettingsError> {
        self.validate(&update)?;

        let mut state = self.state.lock();
        let document = match update.scope {
            UpdateScope::Transient => &mut state.transient,
            UpdateScope::Persistent => &mut state.persistent,
        };
        for (name, raw) in update.settings {
            if raw.is_null() {
                document.remove(&name);
            } else {
                document.insert(name, raw);
            }
        }
        state.version += 1;
        debug!(
            version = state.version,
            scope = %update.scope,
            "recorded cluster settings update"
        );
        self.publish(&state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog;
    use serde_json::json;

    fn service() -> LocalClusterState {
        LocalClusterState::new(Arc::new(SettingCatalog::agent()))
    }

    #[tokio::test]
    async fn test_update_bumps_version_and_publishes() {
        let service = service();
        let mut rx = service.subscribe();

        service
            .update_settings(SettingsUpdate::transient().set(catalog::INTERVAL, json!("30m")))
            .await
            .unwrap();

        assert_eq!(service.version(), 1);
        rx.changed().await.unwrap();
        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.version, 1);
        assert_eq!(
            snapshot.transient.get(catalog::INTERVAL),
            Some(&json!("30m"))
        );
    }

    #[tokio::test]
    async fn test_rejects_unknown_and_static_keys_atomically() {
        let service = service();

        let err = service
            .update_settings(SettingsUpdate::transient().set("marvel.agent.bogus", json!(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, SettingsError::UnknownSetting { .. }));

        let err = service
            .update_settings(
                SettingsUpdate::persistent()
                    .set(catalog::INTERVAL, json!("30m"))
                    .set(catalog::COLLECTORS, json!(["x"])),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SettingsError::StaticSettingImmutable { .. }));

        // Nothing was recorded; the version never moved.
        assert_eq!(service.version(), 0);
    }

    #[tokio::test]
    async fn test_null_clears_override() {
        let service = service();
        service
            .update_settings(SettingsUpdate::transient().set(catalog::INDICES, json!(["a"])))
            .await
            .unwrap();
        service
            .update_settings(SettingsUpdate::transient().unset(catalog::INDICES))
            .await
            .unwrap();

        let snapshot = service.subscribe().borrow().clone();
        assert_eq!(snapshot.version, 2);
        assert!(snapshot.transient.is_empty());
    }

    #[tokio::test]
    async fn test_restart_clears_only_transient_settings() {
        let service = service();
        service
            .update_settings(SettingsUpdate::transient().set(catalog::INTERVAL, json!("30m")))
            .await
            .unwrap();
        service
            .update_settings(
                SettingsUpdate::persistent().set(catalog::INDEX_RECOVERY_ACTIVE_ONLY, json!(true)),
            )
            .await
            .unwrap();

        service.restart();

        let snapshot = service.subscribe().borrow().clone();
        assert!(snapshot.transient.is_empty());
        assert_eq!(
            snapshot.persistent.get(catalog::INDEX_RECOVERY_ACTIVE_ONLY),
            Some(&json!(true))
        );
    }

    #[tokio::test]
    async fn test_transient_takes_precedence_in_snapshot() {
        let service = service();
        service
            .update_settings(SettingsUpdate::persistent().set(catalog::INTERVAL, json!("1h")))
            .await
            .unwrap();
        service
            .update_settings(SettingsUpdate::transient().set(catalog::INTERVAL, json!("30m")))
            .await
            .unwrap();

        let snapshot = service.subscribe().borrow().clone();
        let merged = snapshot.merged();
        assert_eq!(merged.get(catalog::INTERVAL), Some(&&json!("30m")));
    }
}
