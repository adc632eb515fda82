//! Device session layer.
//!
//! This module provides:
//! - The [`DeviceSession`] / [`SessionConnector`] seam the reconciler drives
//! - A prompt-driven CLI transport with Telnet option filtering
//! - The Cisco IOS command dialect
//! - Deadlines around connect, elevate and every command

pub mod ios;
mod connector;
mod session;
mod telnet;
mod transport;

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::DeviceTarget;
use crate::error::SessionError;

pub use connector::TelnetConnector;
pub use session::{Credentials, DeviceSession, SessionConnector};
pub use transport::CliTransport;

/// A session whose every call is bounded by the session timeout.
///
/// Applies on top of whatever read deadline the connector has, so a device
/// that trickles output forever still fails.
pub struct TimedSession {
    inner: Box<dyn DeviceSession>,
    limit: Duration,
}

impl TimedSession {
    /// Wraps an open session.
    #[must_use]
    pub fn new(inner: Box<dyn DeviceSession>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

impl std::fmt::Debug for TimedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedSession")
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DeviceSession for TimedSession {
    async fn elevate(&mut self, secret: &str) -> Result<(), SessionError> {
        tokio::time::timeout(self.limit, self.inner.elevate(secret))
            .await
            .map_err(|_| SessionError::timeout("entering privileged mode", self.limit))?
    }

    async fn run(&mut self, command: &str) -> Result<String, SessionError> {
        tokio::time::timeout(self.limit, self.inner.run(command))
            .await
            .map_err(|_| SessionError::timeout(format!("running '{command}'"), self.limit))?
    }

    async fn configure(&mut self, commands: &[String]) -> Result<String, SessionError> {
        tokio::time::timeout(self.limit, self.inner.configure(commands))
            .await
            .map_err(|_| SessionError::timeout("applying configuration", self.limit))?
    }

    async fn disconnect(&mut self) {
        if tokio::time::timeout(self.limit, self.inner.disconnect())
            .await
            .is_err()
        {
            warn!("Disconnect did not complete within {:?}", self.limit);
        }
    }
}

/// Connects, logs in and elevates within `connect_timeout`.
///
/// If elevation fails the half-open session is disconnected before the error
/// is returned, so the caller only ever owns fully privileged sessions.
///
/// # Errors
///
/// Returns the connect, login or elevation failure.
pub async fn open_session(
    connector: &dyn SessionConnector,
    target: &DeviceTarget,
    credentials: &Credentials,
    connect_timeout: Duration,
    session_timeout: Duration,
) -> Result<TimedSession, SessionError> {
    let inner = tokio::time::timeout(connect_timeout, connector.connect(target, credentials))
        .await
        .map_err(|_| SessionError::timeout(format!("connecting to {target}"), connect_timeout))??;

    let mut session = TimedSession::new(inner, session_timeout);

    let elevated = tokio::time::timeout(connect_timeout, session.elevate(&credentials.secret))
        .await
        .map_err(|_| SessionError::timeout("entering privileged mode", connect_timeout))
        .and_then(|result| result);

    match elevated {
        Ok(()) => {
            debug!(device = %target.name, "Session ready");
            Ok(session)
        }
        Err(e) => {
            session.disconnect().await;
            Err(e)
        }
    }
}
