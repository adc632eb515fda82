//! Device session traits.
//!
//! A session is an authenticated connection to one device's CLI. The
//! reconciler only ever talks to devices through these traits, so any
//! transport (Telnet, SSH, a lab simulator) can be plugged in.

use std::fmt;

use async_trait::async_trait;

use crate::config::DeviceTarget;
use crate::error::SessionError;

/// Login material for a device.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login username.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Enable secret for privileged mode.
    pub secret: String,
}

impl Credentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// An open, authenticated CLI session to one device.
#[async_trait]
pub trait DeviceSession: Send {
    /// Enters privileged mode with the enable secret.
    async fn elevate(&mut self, secret: &str) -> Result<(), SessionError>;

    /// Runs a read-only command and returns its raw output.
    async fn run(&mut self, command: &str) -> Result<String, SessionError>;

    /// Runs configuration lines in order and returns the combined raw output.
    ///
    /// Returns an error if any line is rejected; nothing after the rejected
    /// line is sent.
    async fn configure(&mut self, commands: &[String]) -> Result<String, SessionError>;

    /// Closes the session. Never fails; problems are logged.
    async fn disconnect(&mut self);
}

/// Opens sessions to devices.
#[async_trait]
pub trait SessionConnector: Send + Sync {
    /// Connects and logs in to a device.
    async fn connect(
        &self,
        target: &DeviceTarget,
        credentials: &Credentials,
    ) -> Result<Box<dyn DeviceSession>, SessionError>;
}

#[async_trait]
impl DeviceSession for Box<dyn DeviceSession> {
    async fn elevate(&mut self, secret: &str) -> Result<(), SessionError> {
        (**self).elevate(secret).await
    }

    async fn run(&mut self, command: &str) -> Result<String, SessionError> {
        (**self).run(command).await
    }

    async fn configure(&mut self, commands: &[String]) -> Result<String, SessionError> {
        (**self).configure(commands).await
    }

    async fn disconnect(&mut self) {
        (**self).disconnect().await;
    }
}
