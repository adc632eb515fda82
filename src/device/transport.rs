//! Prompt-driven CLI transport.
//!
//! Talks to a switch the way an operator at a terminal would: send a line,
//! read until the next prompt, hand back everything in between. Works over
//! any byte stream; [`super::TelnetConnector`] uses a TCP socket.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace, warn};

use crate::error::SessionError;

use super::ios::{self, Privilege, Prompt};
use super::session::{Credentials, DeviceSession};
use super::telnet::TelnetFilter;

const READ_CHUNK: usize = 4096;

/// A logged-in CLI session over a byte stream.
#[derive(Debug)]
pub struct CliTransport<S> {
    stream: S,
    filter: TelnetFilter,
    buffer: String,
    idle_timeout: Duration,
    host: String,
    privilege: Privilege,
    closed: bool,
}

impl<S> CliTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wraps a connected stream. Call [`Self::login`] before anything else.
    pub fn new(stream: S, idle_timeout: Duration) -> Self {
        Self {
            stream,
            filter: TelnetFilter::new(),
            buffer: String::new(),
            idle_timeout,
            host: String::new(),
            privilege: Privilege::User,
            closed: false,
        }
    }

    /// Hostname learned from the exec prompt.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Current privilege level.
    #[must_use]
    pub const fn privilege(&self) -> Privilege {
        self.privilege
    }

    /// Answers the login dialogue until an exec prompt appears.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` if the device refuses the credentials,
    /// or a timeout/disconnect error if it stops talking.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<(), SessionError> {
        let mut username_sent = false;
        let mut password_sent = false;

        loop {
            let (text, prompt) = self.read_prompt().await?;

            if (username_sent || password_sent) && ios::login_failed(&text) {
                return Err(SessionError::AuthenticationFailed {
                    message: String::from("device rejected the credentials"),
                });
            }

            match prompt {
                Prompt::Username => {
                    if username_sent {
                        return Err(SessionError::AuthenticationFailed {
                            message: String::from("username prompt repeated"),
                        });
                    }
                    self.send_line(&credentials.username).await?;
                    username_sent = true;
                }
                Prompt::Password => {
                    if password_sent {
                        return Err(SessionError::AuthenticationFailed {
                            message: String::from("password prompt repeated"),
                        });
                    }
                    self.send_line(&credentials.password).await?;
                    password_sent = true;
                }
                Prompt::Exec { host, privilege } => {
                    debug!(host = %host, ?privilege, "Logged in");
                    self.host = host;
                    self.privilege = privilege;
                    return Ok(());
                }
            }
        }
    }

    /// Sends a line and returns the output up to the next exec prompt, with
    /// the command echo and the prompt removed.
    async fn command(&mut self, command: &str) -> Result<String, SessionError> {
        trace!(command, "Sending command");
        self.send_line(command).await?;

        let (text, prompt) = self.read_prompt().await?;
        match prompt {
            Prompt::Exec { privilege, .. } => {
                self.privilege = privilege;
                Ok(strip_echo(&text, command))
            }
            Prompt::Username | Prompt::Password => Err(SessionError::disconnected(format!(
                "unexpected credential prompt after '{command}'"
            ))),
        }
    }

    /// Reads until the device shows a prompt; answers pagers on the way.
    ///
    /// Returns the text before the prompt line and the prompt itself.
    async fn read_prompt(&mut self) -> Result<(String, Prompt), SessionError> {
        loop {
            let tail = last_line(&self.buffer);

            if ios::is_more_prompt(tail) {
                let cut = self.buffer.len() - tail.len();
                self.buffer.truncate(cut);
                self.stream.write_all(b" ").await?;
                self.stream.flush().await?;
            } else if let Some(prompt) = ios::classify_prompt(tail) {
                let cut = self.buffer.len() - tail.len();
                let mut text = std::mem::take(&mut self.buffer);
                text.truncate(cut);
                return Ok((text, prompt));
            }

            self.fill().await?;
        }
    }

    async fn fill(&mut self) -> Result<(), SessionError> {
        let mut chunk = [0u8; READ_CHUNK];
        let read = tokio::time::timeout(self.idle_timeout, self.stream.read(&mut chunk))
            .await
            .map_err(|_| SessionError::timeout("waiting for device output", self.idle_timeout))??;

        if read == 0 {
            self.closed = true;
            return Err(SessionError::disconnected("device closed the connection"));
        }

        let filtered = self.filter.feed(&chunk[..read]);
        if !filtered.replies.is_empty() {
            self.stream.write_all(&filtered.replies).await?;
            self.stream.flush().await?;
        }

        let text = String::from_utf8_lossy(&filtered.data);
        self.buffer.extend(text.chars().filter(|c| *c != '\r'));
        Ok(())
    }

    async fn send_line(&mut self, line: &str) -> Result<(), SessionError> {
        self.stream.write_all(line.as_bytes()).await?;
        self.stream.write_all(b"\r\n").await?;
        self.stream.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl<S> DeviceSession for CliTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn elevate(&mut self, secret: &str) -> Result<(), SessionError> {
        if self.privilege == Privilege::User {
            self.send_line(ios::ENABLE).await?;
            let (_, prompt) = self.read_prompt().await?;

            let prompt = if prompt == Prompt::Password {
                self.send_line(secret).await?;
                self.read_prompt().await?.1
            } else {
                prompt
            };

            match prompt {
                Prompt::Exec { privilege, .. } => self.privilege = privilege,
                Prompt::Password | Prompt::Username => {
                    return Err(SessionError::ElevationFailed {
                        message: String::from("enable secret rejected"),
                    });
                }
            }

            if self.privilege != Privilege::Privileged {
                return Err(SessionError::ElevationFailed {
                    message: String::from("still in user exec mode after enable"),
                });
            }
        }

        self.command(ios::TERMINAL_LENGTH_0).await?;
        debug!(host = %self.host, "Privileged mode, paging disabled");
        Ok(())
    }

    async fn run(&mut self, command: &str) -> Result<String, SessionError> {
        let output = self.command(command).await?;
        Ok(ios::strip_more(&output))
    }

    async fn configure(&mut self, commands: &[String]) -> Result<String, SessionError> {
        let mut transcript = String::new();
        let lines = std::iter::once(ios::CONFIGURE_TERMINAL)
            .chain(commands.iter().map(String::as_str));

        for line in lines {
            let output = self.command(line).await?;

            if let Some(marker) = ios::error_marker(&output) {
                warn!(command = line, marker, "Device rejected configuration line");
                let rejected = SessionError::CommandRejected {
                    command: line.to_string(),
                    output: output.trim().to_string(),
                };
                if let Err(e) = self.command(ios::END).await {
                    debug!(error = %e, "Could not leave configuration mode");
                }
                return Err(rejected);
            }

            transcript.push_str(&output);
        }

        transcript.push_str(&self.command(ios::END).await?);
        Ok(transcript)
    }

    async fn disconnect(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = self.send_line(ios::EXIT).await {
            debug!(error = %e, "Exit not delivered");
        }
        if let Err(e) = self.stream.shutdown().await {
            debug!(error = %e, "Stream shutdown failed");
        }
        debug!(host = %self.host, "Session closed");
    }
}

/// The unterminated last line of the buffer.
fn last_line(buffer: &str) -> &str {
    buffer.rsplit_once('\n').map_or(buffer, |(_, tail)| tail)
}

/// Drops the echoed command line from the front of the output.
fn strip_echo(text: &str, command: &str) -> String {
    let text = text.trim_start_matches('\n');
    match text.split_once('\n') {
        Some((first, rest)) if first.trim() == command => rest.to_string(),
        None if text.trim() == command => String::new(),
        _ => text.to_string(),
    }
}
