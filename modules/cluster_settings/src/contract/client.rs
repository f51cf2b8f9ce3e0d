//! Update submission trait for the cluster state service
//!
//! This is the boundary other components use to change cluster-wide
//! settings. Success means the change has been durably recorded in
//! cluster state, not that nodes have converged on it; convergence is
//! observed separately via [`crate::domain::ConvergenceObserver`].

use async_trait::async_trait;

use super::{error::SettingsError, model::SettingsUpdate};

/// Cluster settings update submission API
#[async_trait]
pub trait ClusterSettingsApi: Send + Sync {
    /// Record a transient or persistent settings update in cluster state.
    ///
    /// The whole update is validated up front: an unknown or static key
    /// rejects it without recording anything. A `null` value clears the
    /// override for that key in the update's scope.
    async fn update_settings(&self, update: SettingsUpdate) -> Result<(), SettingsError>;
}
