//! Interface audit and description updates.
//!
//! A separate, smaller workflow from VLAN reconciliation: list
//! `show ip interface brief` on every device and optionally set one
//! interface's description wherever that interface exists. It shares the
//! session layer and failure isolation, nothing else.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{DeviceTarget, Inventory, SessionSettings};
use crate::device::{ios, open_session, Credentials, DeviceSession, SessionConnector, TimedSession};
use crate::error::{ConfigError, ReconcileError, Result, SessionError, VlanSyncError};
use crate::report::{DeviceFailure, DeviceStage, RunStatus};

/// Longest description IOS accepts.
pub const DESCRIPTION_MAX_LEN: usize = 240;

/// One row of `show ip interface brief`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceRow {
    /// Interface name.
    pub interface: String,
    /// IP address or `unassigned`.
    pub ip_address: String,
    /// `OK?` column.
    pub ok: String,
    /// How the address was assigned.
    pub method: String,
    /// Line status; may be two words (`administratively down`).
    pub status: String,
    /// Protocol status.
    pub protocol: String,
}

/// Parses `show ip interface brief` output. Lines that are not rows are skipped.
#[must_use]
pub fn parse_interface_brief(raw: &str) -> Vec<InterfaceRow> {
    raw.lines()
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 6 || tokens[0] == "Interface" {
                return None;
            }
            let last = tokens.len() - 1;
            Some(InterfaceRow {
                interface: tokens[0].to_string(),
                ip_address: tokens[1].to_string(),
                ok: tokens[2].to_string(),
                method: tokens[3].to_string(),
                status: tokens[4..last].join(" "),
                protocol: tokens[last].to_string(),
            })
        })
        .collect()
}

/// A description to set on one interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptionChange {
    /// Interface name as the device lists it.
    pub interface: String,
    /// New description.
    pub description: String,
}

impl DescriptionChange {
    /// Validates an interface name and description.
    ///
    /// # Errors
    ///
    /// Returns an error if the interface is not a single token or the
    /// description is empty, multi-line or too long.
    pub fn new(interface: &str, description: &str) -> std::result::Result<Self, ConfigError> {
        let interface = interface.trim();
        if interface.is_empty() || interface.contains(char::is_whitespace) {
            return Err(ConfigError::validation(
                format!("'{interface}' is not an interface name"),
                "interface",
            ));
        }

        let description = description.trim();
        if description.is_empty() {
            return Err(ConfigError::validation("description cannot be empty", "description"));
        }
        if description.contains(['\n', '\r']) {
            return Err(ConfigError::validation(
                "description must be a single line",
                "description",
            ));
        }
        if description.chars().count() > DESCRIPTION_MAX_LEN {
            return Err(ConfigError::validation(
                format!("description cannot be longer than {DESCRIPTION_MAX_LEN} characters"),
                "description",
            ));
        }

        Ok(Self {
            interface: interface.to_string(),
            description: description.to_string(),
        })
    }

    /// Configuration lines for the change.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        vec![
            format!("interface {}", self.interface),
            format!("description {}", self.description),
        ]
    }

    fn applies_to(&self, rows: &[InterfaceRow]) -> bool {
        rows.iter()
            .any(|row| row.interface.eq_ignore_ascii_case(&self.interface))
    }
}

/// Result of auditing one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceOutcome {
    /// The device.
    pub device: DeviceTarget,
    /// Interfaces read from the device.
    pub interfaces: Vec<InterfaceRow>,
    /// True if the description was applied.
    pub applied: bool,
    /// True if a change was requested but the device lacks the interface.
    pub skipped: bool,
    /// Failure, if the device did not finish.
    pub failure: Option<DeviceFailure>,
    /// Wall time spent on this device.
    pub duration_ms: u64,
}

impl InterfaceOutcome {
    fn new(device: DeviceTarget) -> Self {
        Self {
            device,
            interfaces: Vec::new(),
            applied: false,
            skipped: false,
            failure: None,
            duration_ms: 0,
        }
    }

    /// Returns true if the device finished.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// Everything an interface audit produced.
#[derive(Debug, Clone, Serialize)]
pub struct InterfaceReport {
    /// Unique id of this run.
    pub run_id: Uuid,
    /// Start time.
    pub started_at: DateTime<Utc>,
    /// End time.
    pub finished_at: DateTime<Utc>,
    /// Requested description change, if any.
    pub change: Option<DescriptionChange>,
    /// One outcome per device, in inventory order.
    pub outcomes: Vec<InterfaceOutcome>,
}

impl InterfaceReport {
    /// Overall status.
    #[must_use]
    pub fn status(&self) -> RunStatus {
        if self.outcomes.iter().all(InterfaceOutcome::succeeded) {
            RunStatus::Success
        } else {
            RunStatus::PartialFailure
        }
    }

    /// Process exit code.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        self.status().exit_code()
    }
}

/// Sequential interface audit across the fleet.
pub struct InterfaceAudit {
    connector: Arc<dyn SessionConnector>,
    credentials: Credentials,
    connect_timeout: Duration,
    session_timeout: Duration,
    cancel: CancellationToken,
}

impl InterfaceAudit {
    /// Creates an audit.
    #[must_use]
    pub fn new(
        connector: Arc<dyn SessionConnector>,
        credentials: Credentials,
        session: &SessionSettings,
    ) -> Self {
        Self {
            connector,
            credentials,
            connect_timeout: session.connect_timeout(),
            session_timeout: session.session_timeout(),
            cancel: CancellationToken::new(),
        }
    }

    /// Uses an externally owned cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Audits every device and applies `change` where it fits.
    ///
    /// # Errors
    ///
    /// Returns an error if the inventory is empty or the run was cancelled
    /// before any device was attempted.
    pub async fn run(
        &self,
        inventory: &Inventory,
        change: Option<DescriptionChange>,
    ) -> Result<InterfaceReport> {
        if inventory.is_empty() {
            return Err(VlanSyncError::Config(ConfigError::validation_general(
                "inventory contains no devices",
            )));
        }
        if self.cancel.is_cancelled() {
            return Err(VlanSyncError::Reconcile(ReconcileError::Aborted {
                reason: String::from("cancelled before any device was attempted"),
            }));
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut outcomes = Vec::with_capacity(inventory.len());

        for device in inventory {
            if self.cancel.is_cancelled() {
                let mut outcome = InterfaceOutcome::new(device.clone());
                outcome.failure = Some(DeviceFailure::cancelled());
                outcomes.push(outcome);
                continue;
            }
            outcomes.push(self.audit_device(device, change.as_ref()).await);
        }

        Ok(InterfaceReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            change,
            outcomes,
        })
    }

    async fn audit_device(
        &self,
        device: &DeviceTarget,
        change: Option<&DescriptionChange>,
    ) -> InterfaceOutcome {
        let started = Instant::now();
        let span = info_span!("device", name = %device.name, address = %device.address);
        let mut outcome = InterfaceOutcome::new(device.clone());

        async {
            let mut session = match open_session(
                self.connector.as_ref(),
                device,
                &self.credentials,
                self.connect_timeout,
                self.session_timeout,
            )
            .await
            {
                Ok(session) => session,
                Err(e) => {
                    warn!("Connect failed: {e}");
                    outcome.failure = Some(DeviceFailure::from_session(DeviceStage::Connecting, &e));
                    return;
                }
            };

            if let Err((stage, e)) = Self::audit_session(&mut session, change, &mut outcome).await {
                warn!("Failed while {stage}: {e}");
                outcome.failure = Some(DeviceFailure::from_session(stage, &e));
            }

            session.disconnect().await;
        }
        .instrument(span)
        .await;

        outcome.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        outcome
    }

    async fn audit_session(
        session: &mut TimedSession,
        change: Option<&DescriptionChange>,
        outcome: &mut InterfaceOutcome,
    ) -> std::result::Result<(), (DeviceStage, SessionError)> {
        let raw = session
            .run(ios::SHOW_IP_INTERFACE_BRIEF)
            .await
            .map_err(|e| (DeviceStage::Reading, e))?;
        outcome.interfaces = parse_interface_brief(&raw);
        debug!("{} interfaces listed", outcome.interfaces.len());

        let Some(change) = change else {
            return Ok(());
        };

        if !change.applies_to(&outcome.interfaces) {
            info!("No interface {}, skipping", change.interface);
            outcome.skipped = true;
            return Ok(());
        }

        session
            .configure(&change.commands())
            .await
            .map_err(|e| (DeviceStage::Applying, e))?;
        info!("Description set on {}", change.interface);
        outcome.applied = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const BRIEF: &str = "\
Interface              IP-Address      OK? Method Status                Protocol
GigabitEthernet0/0     10.0.0.1        YES NVRAM  up                    up
GigabitEthernet0/1     unassigned      YES unset  administratively down down
Vlan10                 192.168.10.1    YES manual up                    up
";

    #[test]
    fn test_parse_brief() {
        let rows = parse_interface_brief(BRIEF);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].interface, "GigabitEthernet0/0");
        assert_eq!(rows[0].ip_address, "10.0.0.1");
        assert_eq!(rows[1].status, "administratively down");
        assert_eq!(rows[1].protocol, "down");
        assert_eq!(rows[2].method, "manual");
    }

    #[test]
    fn test_description_change_validation() {
        let change = DescriptionChange::new("Gi0/1", " uplink to core ").unwrap();
        assert_eq!(change.commands(), vec!["interface Gi0/1", "description uplink to core"]);

        assert!(DescriptionChange::new("", "x").is_err());
        assert!(DescriptionChange::new("Gi 0/1", "x").is_err());
        assert!(DescriptionChange::new("Gi0/1", "").is_err());
        assert!(DescriptionChange::new("Gi0/1", "a\nb").is_err());
        assert!(DescriptionChange::new("Gi0/1", &"x".repeat(241)).is_err());
    }

    struct BriefSession {
        configured: Arc<Mutex<Vec<Vec<String>>>>,
    }

    #[async_trait]
    impl DeviceSession for BriefSession {
        async fn elevate(&mut self, _secret: &str) -> std::result::Result<(), SessionError> {
            Ok(())
        }

        async fn run(&mut self, _command: &str) -> std::result::Result<String, SessionError> {
            Ok(BRIEF.to_string())
        }

        async fn configure(&mut self, commands: &[String]) -> std::result::Result<String, SessionError> {
            self.configured.lock().unwrap().push(commands.to_vec());
            Ok(String::new())
        }

        async fn disconnect(&mut self) {}
    }

    struct BriefConnector {
        configured: Arc<Mutex<Vec<Vec<String>>>>,
    }

    #[async_trait]
    impl SessionConnector for BriefConnector {
        async fn connect(
            &self,
            target: &DeviceTarget,
            _credentials: &Credentials,
        ) -> std::result::Result<Box<dyn DeviceSession>, SessionError> {
            if target.name == "down" {
                return Err(SessionError::Unreachable {
                    address: target.address.clone(),
                    message: String::from("no route to host"),
                });
            }
            Ok(Box::new(BriefSession {
                configured: Arc::clone(&self.configured),
            }))
        }
    }

    fn audit(configured: &Arc<Mutex<Vec<Vec<String>>>>) -> InterfaceAudit {
        InterfaceAudit::new(
            Arc::new(BriefConnector {
                configured: Arc::clone(configured),
            }),
            Credentials::new("admin", "cisco", "class"),
            &SessionSettings::default(),
        )
    }

    fn inventory() -> Inventory {
        Inventory::from_devices(vec![
            DeviceTarget::new("sw1", "10.0.0.1"),
            DeviceTarget::new("down", "10.0.0.2"),
            DeviceTarget::new("sw3", "10.0.0.3"),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_audit_lists_and_isolates_failures() {
        let configured = Arc::new(Mutex::new(Vec::new()));
        let report = audit(&configured).run(&inventory(), None).await.unwrap();

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.outcomes[0].interfaces.len(), 3);
        assert!(report.outcomes[1].failure.is_some());
        assert_eq!(report.outcomes[2].interfaces.len(), 3);
        assert_eq!(report.exit_code(), 2);
        assert!(configured.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_description_applied_or_skipped() {
        let configured = Arc::new(Mutex::new(Vec::new()));

        let change = DescriptionChange::new("vlan10", "users").unwrap();
        let report = audit(&configured)
            .run(&inventory(), Some(change))
            .await
            .unwrap();
        assert!(report.outcomes[0].applied);
        assert!(report.outcomes[2].applied);
        assert_eq!(configured.lock().unwrap().len(), 2);

        let missing = DescriptionChange::new("Gi9/9", "nothing").unwrap();
        let report = audit(&configured)
            .run(&inventory(), Some(missing))
            .await
            .unwrap();
        assert!(report.outcomes[0].skipped);
        assert!(!report.outcomes[0].applied);
        assert_eq!(configured.lock().unwrap().len(), 2);
    }
}
