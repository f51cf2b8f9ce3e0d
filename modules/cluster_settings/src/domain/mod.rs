//! Domain layer - registry, catalog, and propagation logic

pub mod catalog;
pub mod convergence;
pub mod events;
pub mod listener;
pub mod registry;

pub use catalog::SettingCatalog;
pub use convergence::{ConvergenceObserver, ConvergencePolicy};
pub use events::SettingEvent;
pub use listener::ClusterStateListener;
pub use registry::{ApplyOutcome, SettingsRegistry};
