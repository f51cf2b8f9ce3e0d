//! Contract error types for the cluster settings registry
//!
//! No error in this subsystem is fatal to the node: at worst a setting
//! fails to update and retains its previous, valid value.

use crate::contract::model::SettingKind;

/// Settings registry domain errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// No definition matches the requested key, not even a wildcard group.
    #[error("unknown setting: {name}")]
    UnknownSetting { name: String },

    /// Update attempted on a setting that is fixed at node startup.
    #[error("setting is not dynamically updatable: {name}")]
    StaticSettingImmutable { name: String },

    /// The raw value's shape does not match the declared kind.
    #[error("invalid value for setting {name}: expected {expected}, got {given}")]
    TypeMismatch {
        name: String,
        expected: SettingKind,
        given: String,
    },

    /// Not every node agreed on the expected value before the deadline.
    #[error(
        "settings did not converge on {name} within {timeout_ms}ms; \
         disagreeing nodes: {}", .nodes.join(", ")
    )]
    ConvergenceTimeout {
        name: String,
        timeout_ms: u64,
        nodes: Vec<String>,
    },
}
