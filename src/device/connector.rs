//! TCP connector for the Telnet CLI transport.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::config::{DeviceTarget, SessionSettings};
use crate::error::SessionError;

use super::session::{Credentials, DeviceSession, SessionConnector};
use super::transport::CliTransport;

/// Opens Telnet CLI sessions over TCP.
#[derive(Debug, Clone)]
pub struct TelnetConnector {
    port: u16,
    connect_timeout: Duration,
    idle_timeout: Duration,
}

impl TelnetConnector {
    /// Creates a connector.
    #[must_use]
    pub const fn new(port: u16, connect_timeout: Duration, idle_timeout: Duration) -> Self {
        Self {
            port,
            connect_timeout,
            idle_timeout,
        }
    }

    /// Creates a connector from session settings.
    #[must_use]
    pub const fn from_settings(settings: &SessionSettings) -> Self {
        Self::new(
            settings.port,
            settings.connect_timeout(),
            settings.session_timeout(),
        )
    }

    /// Resolves an inventory address to `host:port`.
    ///
    /// Addresses that already carry a port keep it.
    #[must_use]
    pub fn socket_address(&self, address: &str) -> String {
        if let Ok(ip) = address.parse::<IpAddr>() {
            return SocketAddr::new(ip, self.port).to_string();
        }
        if address.parse::<SocketAddr>().is_ok() {
            return address.to_string();
        }
        if let Some((_, port)) = address.rsplit_once(':')
            && port.parse::<u16>().is_ok()
        {
            return address.to_string();
        }
        format!("{address}:{}", self.port)
    }
}

#[async_trait]
impl SessionConnector for TelnetConnector {
    async fn connect(
        &self,
        target: &DeviceTarget,
        credentials: &Credentials,
    ) -> Result<Box<dyn DeviceSession>, SessionError> {
        let address = self.socket_address(&target.address);
        debug!(device = %target.name, %address, "Connecting");

        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(address.as_str()))
            .await
            .map_err(|_| SessionError::timeout(format!("connecting to {address}"), self.connect_timeout))?
            .map_err(|e| SessionError::Unreachable {
                address: address.clone(),
                message: e.to_string(),
            })?;
        stream.set_nodelay(true)?;

        let mut transport = CliTransport::new(stream, self.idle_timeout);
        tokio::time::timeout(self.connect_timeout, transport.login(credentials))
            .await
            .map_err(|_| SessionError::timeout(format!("logging in to {address}"), self.connect_timeout))??;

        info!(device = %target.name, host = transport.host(), "Session established");
        Ok(Box::new(transport))
    }
}
