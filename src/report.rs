//! Per-device outcomes and the run report.
//!
//! Every device in the inventory gets exactly one [`Outcome`], in inventory
//! order, whether it converged, failed, or was never attempted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::{DesiredVlan, DeviceTarget};
use crate::error::{ErrorKind, SessionError};
use crate::planner::{ObservedVlan, ReconciliationAction};
use crate::reconciler::RunMode;

/// Exit code when the run was aborted before any device was attempted.
pub const EXIT_ABORTED: u8 = 1;

/// Where a device's processing was when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStage {
    /// Opening and elevating the session.
    Connecting,
    /// Reading the VLAN table.
    Reading,
    /// Sending configuration.
    Applying,
    /// Re-reading the VLAN.
    Verifying,
}

impl std::fmt::Display for DeviceStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Connecting => "connecting",
            Self::Reading => "reading",
            Self::Applying => "applying",
            Self::Verifying => "verifying",
        };
        write!(f, "{s}")
    }
}

/// Why a device did not finish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceFailure {
    /// Stage that failed.
    pub stage: DeviceStage,
    /// Failure class.
    pub kind: ErrorKind,
    /// Human-readable cause.
    pub message: String,
}

impl DeviceFailure {
    /// Records a session error raised during `stage`.
    #[must_use]
    pub fn from_session(stage: DeviceStage, error: &SessionError) -> Self {
        Self {
            stage,
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    /// Records a device skipped because the run was cancelled.
    #[must_use]
    pub fn cancelled() -> Self {
        Self {
            stage: DeviceStage::Connecting,
            kind: ErrorKind::Cancelled,
            message: String::from("run cancelled before this device was attempted"),
        }
    }
}

impl std::fmt::Display for DeviceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} while {}: {}", self.kind, self.stage, self.message)
    }
}

/// Result of processing one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// The device.
    pub device: DeviceTarget,
    /// State read before any change; absent if the read never happened.
    pub observed: Option<ObservedVlan>,
    /// Chosen action; absent if planning was never reached.
    pub action: Option<ReconciliationAction>,
    /// True only if the whole command sequence was accepted.
    pub applied: bool,
    /// True if the post-change read shows the expected state.
    pub verified: bool,
    /// Failure, if the device did not finish.
    pub failure: Option<DeviceFailure>,
    /// Non-fatal findings (name mismatch left alone, verification failed).
    pub warnings: Vec<String>,
    /// Configuration lines the device accepted.
    pub applied_commands: Vec<String>,
    /// Device output from the configuration session, if any was printed.
    pub config_output: Option<String>,
    /// Raw `show vlan id` output from the verification read.
    pub final_status: Option<String>,
    /// Wall time spent on this device.
    pub duration_ms: u64,
}

impl Outcome {
    /// Starts an outcome for `device`.
    #[must_use]
    pub const fn new(device: DeviceTarget) -> Self {
        Self {
            device,
            observed: None,
            action: None,
            applied: false,
            verified: false,
            failure: None,
            warnings: Vec::new(),
            applied_commands: Vec::new(),
            config_output: None,
            final_status: None,
            duration_ms: 0,
        }
    }

    /// Outcome for a device the run never reached.
    #[must_use]
    pub fn cancelled(device: DeviceTarget) -> Self {
        Self {
            failure: Some(DeviceFailure::cancelled()),
            ..Self::new(device)
        }
    }

    /// Error class, if the device failed.
    #[must_use]
    pub fn error(&self) -> Option<ErrorKind> {
        self.failure.as_ref().map(|f| f.kind)
    }

    /// Returns true if the device finished without a failure.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// Returns true if the device was skipped by cancellation.
    #[must_use]
    pub fn was_cancelled(&self) -> bool {
        self.error() == Some(ErrorKind::Cancelled)
    }

    /// One-word status for tables.
    #[must_use]
    pub fn status_label(&self) -> &'static str {
        match (&self.failure, self.warnings.is_empty()) {
            (Some(f), _) if f.kind == ErrorKind::Cancelled => "cancelled",
            (Some(_), _) => "failed",
            (None, false) => "warning",
            (None, true) => "ok",
        }
    }
}

/// Overall result of a run that started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every device finished without a failure.
    Success,
    /// At least one device failed or was cancelled.
    PartialFailure,
}

impl RunStatus {
    /// Process exit code for this status.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::PartialFailure => 2,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::PartialFailure => write!(f, "completed with failures"),
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Unique id of this run.
    pub run_id: Uuid,
    /// When the first device was started.
    pub started_at: DateTime<Utc>,
    /// When the last device finished.
    pub finished_at: DateTime<Utc>,
    /// SHA-256 over the desired VLAN and the inventory.
    pub fingerprint: String,
    /// Desired state for the run.
    pub desired: DesiredVlan,
    /// Apply or plan-only.
    pub mode: RunMode,
    /// One outcome per device, in inventory order.
    pub outcomes: Vec<Outcome>,
}

impl RunReport {
    /// Overall status.
    #[must_use]
    pub fn status(&self) -> RunStatus {
        if self.outcomes.iter().all(Outcome::succeeded) {
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

    /// Number of devices that finished without a failure.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    /// Number of devices that failed (cancellations excluded).
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !o.succeeded() && !o.was_cancelled())
            .count()
    }

    /// Number of devices skipped by cancellation.
    #[must_use]
    pub fn cancelled(&self) -> usize {
        self.outcomes.iter().filter(|o| o.was_cancelled()).count()
    }

    /// Number of devices where configuration was applied.
    #[must_use]
    pub fn applied(&self) -> usize {
        self.outcomes.iter().filter(|o| o.applied).count()
    }

    /// Devices that were changed but did not verify.
    #[must_use]
    pub fn unverified(&self) -> Vec<&Outcome> {
        self.outcomes
            .iter()
            .filter(|o| o.applied && !o.verified)
            .collect()
    }

    /// Wall time of the run in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} devices, {} ok, {} failed, {} cancelled, {} changed",
            self.desired,
            self.outcomes.len(),
            self.succeeded(),
            self.failed(),
            self.cancelled(),
            self.applied()
        )
    }
}
