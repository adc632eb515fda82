//! Rename decisions.
//!
//! Whether a mismatching VLAN name may be overwritten is decided outside the
//! planner: either once up front ([`RenamePolicy`]) or by asking the operator
//! per device ([`InteractiveRename`]).

#![cfg_attr(test, allow(missing_docs))]

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::config::{DeviceTarget, RenameMode, VlanName};

/// Capability that confirms or refuses a rename on one device.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RenameDecision: Send + Sync {
    /// Returns true if `device`'s VLAN may be renamed from `current` to `desired`.
    async fn confirm(&self, device: &DeviceTarget, current: &str, desired: &VlanName) -> bool;

    /// Returns true if [`Self::confirm`] talks to a human.
    ///
    /// Interactive decisions force sequential processing.
    fn is_interactive(&self) -> bool;
}

/// A rename decision made once for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenamePolicy {
    /// Rename every mismatch.
    Always,
    /// Leave every mismatch in place.
    Never,
}

#[async_trait]
impl RenameDecision for RenamePolicy {
    async fn confirm(&self, _device: &DeviceTarget, _current: &str, _desired: &VlanName) -> bool {
        matches!(self, Self::Always)
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Asks the operator on the terminal, one device at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct InteractiveRename;

#[async_trait]
impl RenameDecision for InteractiveRename {
    async fn confirm(&self, device: &DeviceTarget, current: &str, desired: &VlanName) -> bool {
        let prompt = format!(
            "{device}: VLAN is named '{current}', rename it to '{desired}'?"
        );

        let answer = tokio::task::spawn_blocking(move || {
            dialoguer::Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact()
        })
        .await;

        match answer {
            Ok(Ok(confirmed)) => confirmed,
            Ok(Err(e)) => {
                warn!(device = %device.name, error = %e, "Rename prompt failed, leaving name unchanged");
                false
            }
            Err(e) => {
                warn!(device = %device.name, error = %e, "Rename prompt aborted, leaving name unchanged");
                false
            }
        }
    }

    fn is_interactive(&self) -> bool {
        true
    }
}

/// Builds the decision for a configured rename mode.
#[must_use]
pub fn decision_for(mode: RenameMode) -> Arc<dyn RenameDecision> {
    match mode {
        RenameMode::Prompt => Arc::new(InteractiveRename),
        RenameMode::Always => Arc::new(RenamePolicy::Always),
        RenameMode::Never => Arc::new(RenamePolicy::Never),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> DeviceTarget {
        DeviceTarget::new("sw1", "10.0.0.1")
    }

    #[tokio::test]
    async fn test_policies() {
        let desired = VlanName::new("SALES").unwrap();
        assert!(RenamePolicy::Always.confirm(&target(), "OLD", &desired).await);
        assert!(!RenamePolicy::Never.confirm(&target(), "OLD", &desired).await);
        assert!(!RenamePolicy::Always.is_interactive());
    }

    #[test]
    fn test_decision_for_mode() {
        assert!(decision_for(RenameMode::Prompt).is_interactive());
        assert!(!decision_for(RenameMode::Always).is_interactive());
        assert!(!decision_for(RenameMode::Never).is_interactive());
    }

    #[tokio::test]
    async fn test_mock_decision() {
        let mut mock = MockRenameDecision::new();
        mock.expect_confirm()
            .withf(|device, current, desired| {
                device.name == "sw1" && current == "OLD" && desired.as_str() == "SALES"
            })
            .times(1)
            .return_const(true);

        let desired = VlanName::new("SALES").unwrap();
        assert!(mock.confirm(&target(), "OLD", &desired).await);
    }
}
