//! Fleet reconciler.
//!
//! Drives every device in the inventory through
//! `Connecting → Reading → Planning → (Applying → Verifying)? → Done`.
//! Planning is pure and cannot fail, so a [`DeviceStage`] names only the
//! stages that talk to the device.
//! A device that fails at any stage is recorded and the fleet moves on; the
//! session is always released before the next device starts.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{ConfigHasher, DesiredVlan, DeviceTarget, Inventory, SessionSettings};
use crate::device::{ios, open_session, Credentials, DeviceSession, SessionConnector, TimedSession};
use crate::error::{ConfigError, ErrorKind, ReconcileError, Result, SessionError, VlanSyncError};
use crate::planner::{
    name_mismatch, parse_vlan_table, plan, verify_state, ObservedVlan, PlanExecutor,
    ReconciliationAction, RenameDecision,
};
use crate::report::{DeviceFailure, DeviceStage, Outcome, RunReport};

/// Whether a run changes devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Read, plan, apply and verify.
    #[default]
    Apply,
    /// Read and plan only.
    Plan,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Apply => write!(f, "apply"),
            Self::Plan => write!(f, "plan"),
        }
    }
}

/// Everything one device's processing needs; cloned into each worker task.
#[derive(Clone)]
struct DeviceWorker {
    connector: Arc<dyn SessionConnector>,
    decision: Arc<dyn RenameDecision>,
    credentials: Arc<Credentials>,
    connect_timeout: Duration,
    session_timeout: Duration,
    mode: RunMode,
    executor: PlanExecutor,
}

/// Fleet reconciler.
pub struct Reconciler {
    worker: DeviceWorker,
    workers: usize,
    cancel: CancellationToken,
    hasher: ConfigHasher,
}

impl Reconciler {
    /// Creates a sequential reconciler in apply mode.
    #[must_use]
    pub fn new(
        connector: Arc<dyn SessionConnector>,
        decision: Arc<dyn RenameDecision>,
        credentials: Credentials,
        session: &SessionSettings,
    ) -> Self {
        Self {
            worker: DeviceWorker {
                connector,
                decision,
                credentials: Arc::new(credentials),
                connect_timeout: session.connect_timeout(),
                session_timeout: session.session_timeout(),
                mode: RunMode::Apply,
                executor: PlanExecutor::new(),
            },
            workers: 1,
            cancel: CancellationToken::new(),
            hasher: ConfigHasher::new(),
        }
    }

    /// Sets the number of devices processed concurrently.
    ///
    /// Ignored when the rename decision is interactive.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Sets the run mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: RunMode) -> Self {
        self.worker.mode = mode;
        self
    }

    /// Uses an externally owned cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops the run from starting further devices.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Validates raw operator input, then reconciles the fleet.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid VLAN id or name; no
    /// device is contacted in that case.
    pub async fn run(&self, inventory: &Inventory, raw_id: &str, raw_name: &str) -> Result<RunReport> {
        let desired = DesiredVlan::parse(raw_id, raw_name)?;
        self.reconcile(inventory, &desired).await
    }

    /// Reconciles every device in `inventory` to `desired`.
    ///
    /// Device failures never surface here; they are part of the report.
    ///
    /// # Errors
    ///
    /// Returns an error if the inventory is empty or the run was cancelled
    /// before any device was attempted.
    pub async fn reconcile(&self, inventory: &Inventory, desired: &DesiredVlan) -> Result<RunReport> {
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
        let fingerprint = self.hasher.fingerprint(desired, inventory);
        let started_at = Utc::now();
        let span = info_span!("run", %run_id, mode = %self.worker.mode);

        let outcomes = async {
            info!(
                "Reconciling {desired} on {} devices (fingerprint {})",
                inventory.len(),
                ConfigHasher::short(&fingerprint)
            );

            if self.is_parallel(inventory) {
                self.run_parallel(inventory, desired).await
            } else {
                self.run_sequential(inventory, desired).await
            }
        }
        .instrument(span)
        .await;

        let report = RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            fingerprint,
            desired: desired.clone(),
            mode: self.worker.mode,
            outcomes,
        };

        info!("{report}");
        Ok(report)
    }

    fn is_parallel(&self, inventory: &Inventory) -> bool {
        if self.workers <= 1 || inventory.len() <= 1 {
            return false;
        }
        if self.worker.decision.is_interactive() {
            warn!(
                "{} workers requested but rename confirmation is interactive; running sequentially",
                self.workers
            );
            return false;
        }
        true
    }

    async fn run_sequential(&self, inventory: &Inventory, desired: &DesiredVlan) -> Vec<Outcome> {
        let mut outcomes = Vec::with_capacity(inventory.len());

        for device in inventory {
            if self.cancel.is_cancelled() {
                debug!(device = %device.name, "Skipping, run cancelled");
                outcomes.push(Outcome::cancelled(device.clone()));
                continue;
            }
            outcomes.push(self.worker.process_device(device, desired).await);
        }

        outcomes
    }

    async fn run_parallel(&self, inventory: &Inventory, desired: &DesiredVlan) -> Vec<Outcome> {
        info!("Processing with {} workers", self.workers);

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for (index, device) in inventory.iter().enumerate() {
            let worker = self.worker.clone();
            let cancel = self.cancel.clone();
            let semaphore = Arc::clone(&semaphore);
            let device = device.clone();
            let desired = desired.clone();

            tasks.spawn(
                async move {
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        return (index, Outcome::cancelled(device));
                    };
                    if cancel.is_cancelled() {
                        return (index, Outcome::cancelled(device));
                    }
                    (index, worker.process_device(&device, &desired).await)
                }
                .in_current_span(),
            );
        }

        let mut slots: Vec<Option<Outcome>> = vec![None; inventory.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(outcome);
                    }
                }
                Err(e) => error!(error = %e, "Device worker did not finish"),
            }
        }

        slots
            .into_iter()
            .zip(inventory.iter())
            .map(|(slot, device)| slot.unwrap_or_else(|| lost_worker(device)))
            .collect()
    }
}

/// Outcome for a device whose worker task panicked.
fn lost_worker(device: &DeviceTarget) -> Outcome {
    let error = ReconcileError::WorkerFailed {
        device: device.name.clone(),
        message: String::from("worker task ended without reporting"),
    };
    let mut outcome = Outcome::new(device.clone());
    outcome.failure = Some(DeviceFailure {
        stage: DeviceStage::Connecting,
        kind: ErrorKind::Command,
        message: error.to_string(),
    });
    outcome
}

impl DeviceWorker {
    async fn process_device(&self, device: &DeviceTarget, desired: &DesiredVlan) -> Outcome {
        let started = Instant::now();
        let span = info_span!("device", name = %device.name, address = %device.address);
        let mut outcome = Outcome::new(device.clone());

        async {
            debug!("Connecting");
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
                    outcome.failure = Some(DeviceFailure::from_session(DeviceStage::Connecting, &e));
                    return;
                }
            };

            if let Err((stage, e)) = self.reconcile_session(&mut session, device, desired, &mut outcome).await {
                outcome.failure = Some(DeviceFailure::from_session(stage, &e));
            }

            session.disconnect().await;
        }
        .instrument(span.clone())
        .await;

        outcome.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        span.in_scope(|| match &outcome.failure {
            Some(failure) => error!("Failed: {failure}"),
            None => info!(
                action = outcome.action.as_ref().map_or("-", ReconciliationAction::label),
                applied = outcome.applied,
                verified = outcome.verified,
                "Done"
            ),
        });

        outcome
    }

    /// Runs the read/plan/apply/verify stages on an open session.
    async fn reconcile_session(
        &self,
        session: &mut TimedSession,
        device: &DeviceTarget,
        desired: &DesiredVlan,
        outcome: &mut Outcome,
    ) -> std::result::Result<(), (DeviceStage, SessionError)> {
        let raw = session
            .run(ios::SHOW_VLAN_BRIEF)
            .await
            .map_err(|e| (DeviceStage::Reading, e))?;

        let observed = parse_vlan_table(&raw, desired.id);
        debug!("Observed {observed}");
        if matches!(observed, ObservedVlan::Unparseable { .. }) {
            warn!("VLAN table could not be parsed; treating VLAN {} as absent", desired.id);
            outcome
                .warnings
                .push(String::from("VLAN table output was not recognised; attempted create"));
        }

        let confirmed = self.rename_confirmed(device, desired, &observed).await;
        let action = plan(desired, &observed, confirmed);
        if name_mismatch(desired, &observed) && !confirmed {
            let current = observed.name().unwrap_or_default();
            warn!("VLAN {} is named '{current}', expected '{}'; left unchanged", desired.id, desired.name);
            outcome.warnings.push(format!(
                "name mismatch: device has '{current}', desired '{}'; not renamed",
                desired.name
            ));
        }

        outcome.observed = Some(observed.clone());
        outcome.action = Some(action.clone());

        if self.mode == RunMode::Plan {
            return Ok(());
        }

        let execution = self
            .executor
            .execute(session, &action)
            .await
            .map_err(|e| (DeviceStage::Applying, e))?;
        outcome.applied = execution.applied;
        if execution.applied {
            let output = execution.output.trim();
            outcome.config_output = (!output.is_empty()).then(|| output.to_string());
            outcome.applied_commands = execution.commands;
        }

        let status = session
            .run(&ios::show_vlan_id(desired.id))
            .await
            .map_err(|e| (DeviceStage::Verifying, e))?;

        // A no-op keeps whatever name the device already had
        let expected = match (&action, observed.name()) {
            (ReconciliationAction::NoOp, Some(current)) => current,
            _ => desired.name.as_str(),
        };
        outcome.verified = verify_state(&status, desired.id, expected);
        if !outcome.verified {
            warn!("Verification read does not show VLAN {} named '{expected}'", desired.id);
            outcome.warnings.push(format!(
                "verification failed: VLAN {} not shown as '{expected}'; check manually",
                desired.id
            ));
        }
        outcome.final_status = Some(status.trim_end().to_string());

        Ok(())
    }

    async fn rename_confirmed(
        &self,
        device: &DeviceTarget,
        desired: &DesiredVlan,
        observed: &ObservedVlan,
    ) -> bool {
        if !name_mismatch(desired, observed) {
            return false;
        }
        let Some(current) = observed.name() else {
            return false;
        };
        if self.mode == RunMode::Plan && self.decision.is_interactive() {
            return false;
        }
        self.decision.confirm(device, current, &desired.name).await
    }
}
