//! Contract layer - public API shared across components
//!
//! Transport-agnostic models, the error taxonomy, and the update
//! submission trait. NO serde derives on models - these are pure domain
//! types; raw boundary values are `serde_json::Value`.

pub mod client;
pub mod error;
pub mod model;

pub use client::ClusterSettingsApi;
pub use error::SettingsError;
pub use model::{
    ClusterStateSnapshot, SettingDefinition, SettingKind, SettingValue, SettingsUpdate,
    TimeValue, UpdateScope,
};
