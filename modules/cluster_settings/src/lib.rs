//! Cluster Settings Module
//!
//! Typed, dynamically-updatable, cluster-wide settings registry. Each
//! node owns a [`SettingsRegistry`] seeded from static configuration; a
//! cluster state listener applies transient/persistent overrides pushed
//! through the cluster state service, and a convergence observer checks
//! that all nodes agree on a value within bounded time.

// Public exports
pub mod contract;
pub use contract::{
    client::ClusterSettingsApi, error::SettingsError, ClusterStateSnapshot, SettingDefinition,
    SettingKind, SettingValue, SettingsUpdate, TimeValue, UpdateScope,
};

pub mod node;
pub use node::SettingsNode;

// Internal modules (hidden from public API)
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
