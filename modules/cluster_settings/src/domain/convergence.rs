//! Convergence observer
//!
//! Updates are not synchronously visible cluster-wide: submission only
//! records the change in cluster state, and each node applies it on its
//! own listener schedule. The observer formalizes the eventual-consistency
//! contract: poll every registry with bounded backoff until all agree on
//! the expected value, or fail naming the nodes that still disagree.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::contract::{SettingValue, SettingsError};
use crate::domain::registry::SettingsRegistry;

/// Bounded polling policy.
///
/// The poll interval doubles on every miss up to `max_interval`; setting
/// `max_interval == poll_interval` gives fixed-interval polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvergencePolicy {
    /// Total time budget before giving up.
    pub timeout: Duration,
    /// Initial delay between polls.
    pub poll_interval: Duration,
    /// Upper bound for the backed-off delay.
    pub max_interval: Duration,
}

impl Default for ConvergencePolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(50),
            max_interval: Duration::from_millis(500),
        }
    }
}

/// Polls a set of per-node registries until they agree on a value.
#[derive(Debug, Clone, Default)]
pub struct ConvergenceObserver {
    policy: ConvergencePolicy,
}

impl ConvergenceObserver {
    pub fn new(policy: ConvergencePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ConvergencePolicy {
        self.policy
    }

    /// Wait until every registry reports `expected` for `name`.
    ///
    /// Comparison is the type-specific equality of [`SettingValue`]
    /// (durations by millisecond count, string arrays element-wise in
    /// order). Fails with [`SettingsError::ConvergenceTimeout`] naming the
    /// nodes that still disagree when the budget runs out.
    pub async fn await_value(
        &self,
        name: &str,
        expected: &SettingValue,
        registries: &[Arc<SettingsRegistry>],
    ) -> Result<(), SettingsError> {
        let deadline = Instant::now() + self.policy.timeout;
        let mut interval = self.policy.poll_interval;

        loop {
            let disagreeing = self.disagreeing_nodes(name, expected, registries);
            if disagreeing.is_empty() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(SettingsError::ConvergenceTimeout {
                    name: name.to_string(),
                    timeout_ms: self.policy.timeout.as_millis() as u64,
                    nodes: disagreeing,
                });
            }
            debug!(
                setting = name,
                waiting_on = disagreeing.len(),
                "settings not yet converged"
            );
            tokio::time::sleep(interval.min(deadline - Instant::now())).await;
            interval = (interval * 2).min(self.policy.max_interval);
        }
    }

    fn disagreeing_nodes(
        &self,
        name: &str,
        expected: &SettingValue,
        registries: &[Arc<SettingsRegistry>],
    ) -> Vec<String> {
        registries
            .iter()
            .filter(|registry| registry.get(name).as_ref() != Ok(expected))
            .map(|registry| registry.node_id().to_string())
            .collect()
    }
}
