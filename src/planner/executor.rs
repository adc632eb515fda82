//! Action executor.
//!
//! Sends a planned action to an open session. An action counts as applied
//! only when every line of it went through without an error.

use tracing::{debug, info};

use crate::device::DeviceSession;
use crate::error::SessionError;

use super::plan::ReconciliationAction;

/// Executor for reconciliation actions.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlanExecutor;

/// Result of executing one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Whether configuration was sent and accepted.
    pub applied: bool,
    /// Lines that were sent.
    pub commands: Vec<String>,
    /// Raw device output for the configuration session.
    pub output: String,
}

impl PlanExecutor {
    /// Creates a new executor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Executes `action` on `session`.
    ///
    /// `NoOp` returns immediately without touching the device.
    ///
    /// # Errors
    ///
    /// Returns the session error if any line is rejected or the session
    /// drops; the device may then hold a partial change.
    pub async fn execute(
        &self,
        session: &mut dyn DeviceSession,
        action: &ReconciliationAction,
    ) -> Result<ExecutionResult, SessionError> {
        let commands = action.commands();

        if commands.is_empty() {
            debug!("Nothing to apply");
            return Ok(ExecutionResult {
                applied: false,
                commands,
                output: String::new(),
            });
        }

        info!("Applying: {action}");
        let output = session.configure(&commands).await?;

        Ok(ExecutionResult {
            applied: true,
            commands,
            output,
        })
    }
}

impl std::fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.applied {
            write!(f, "Applied {} lines: {}", self.commands.len(), self.commands.join("; "))
        } else {
            write!(f, "Nothing applied")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{VlanId, VlanName};
    use async_trait::async_trait;

    #[derive(Default)]
    struct RecordingSession {
        configured: Vec<Vec<String>>,
        reject: bool,
    }

    #[async_trait]
    impl DeviceSession for RecordingSession {
        async fn elevate(&mut self, _secret: &str) -> Result<(), SessionError> {
            Ok(())
        }

        async fn run(&mut self, _command: &str) -> Result<String, SessionError> {
            Ok(String::new())
        }

        async fn configure(&mut self, commands: &[String]) -> Result<String, SessionError> {
            self.configured.push(commands.to_vec());
            if self.reject {
                return Err(SessionError::CommandRejected {
                    command: commands[0].clone(),
                    output: String::from("% Invalid input detected"),
                });
            }
            Ok(String::from("ok"))
        }

        async fn disconnect(&mut self) {}
    }

    fn create() -> ReconciliationAction {
        ReconciliationAction::Create {
            id: VlanId::new(10).unwrap(),
            name: VlanName::new("SALES").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_noop_sends_nothing() {
        let mut session = RecordingSession::default();
        let result = PlanExecutor::new()
            .execute(&mut session, &ReconciliationAction::NoOp)
            .await
            .unwrap();

        assert!(!result.applied);
        assert!(session.configured.is_empty());
    }

    #[tokio::test]
    async fn test_create_is_applied() {
        let mut session = RecordingSession::default();
        let result = PlanExecutor::new().execute(&mut session, &create()).await.unwrap();

        assert!(result.applied);
        assert_eq!(session.configured, vec![vec!["vlan 10", "name SALES"]]);
        assert_eq!(result.to_string(), "Applied 2 lines: vlan 10; name SALES");
    }

    #[tokio::test]
    async fn test_rejection_is_not_applied() {
        let mut session = RecordingSession {
            reject: true,
            ..RecordingSession::default()
        };
        let result = PlanExecutor::new().execute(&mut session, &create()).await;
        assert!(matches!(result, Err(SessionError::CommandRejected { .. })));
    }
}
