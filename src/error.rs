//! Error types for the vlansync reconciliation system.
//!
//! Errors fall into two groups. Configuration errors are fatal and surface
//! before any device is contacted. Session errors belong to a single device:
//! the reconciler converts them into that device's outcome and carries on
//! with the rest of the fleet.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for vlansync.
#[derive(Debug, Error)]
pub enum VlanSyncError {
    /// Configuration or input validation errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Device session errors.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Reconciliation errors.
    #[error("Reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration and input validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration or inventory file was not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// A file could not be parsed.
    #[error("Failed to parse {what}: {message}")]
    ParseError {
        /// What was being parsed (inventory, settings, ...).
        what: String,
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// VLAN id is not a number or is outside 1..=4094.
    #[error("Invalid VLAN ID '{input}': {reason}")]
    InvalidVlanId {
        /// The raw input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// VLAN name is unusable.
    #[error("Invalid VLAN name '{name}': {reason}")]
    InvalidVlanName {
        /// The raw name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The same device name appears twice in the inventory.
    #[error("Duplicate device name in inventory: {name}")]
    DuplicateDevice {
        /// The duplicated name.
        name: String,
    },

    /// The inventory contains no devices.
    #[error("Inventory {path} contains no devices")]
    EmptyInventory {
        /// Inventory path.
        path: PathBuf,
    },

    /// An interactive prompt failed (no TTY, interrupted, ...).
    #[error("Prompt for {field} failed: {message}")]
    PromptFailed {
        /// What was being prompted for.
        field: String,
        /// Underlying failure.
        message: String,
    },
}

/// Errors raised while talking to a single device.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The device could not be reached.
    #[error("Cannot reach {address}: {message}")]
    Unreachable {
        /// Address that was dialled.
        address: String,
        /// Description of the failure.
        message: String,
    },

    /// Login was refused.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed {
        /// Description of the failure.
        message: String,
    },

    /// `enable` did not reach privileged mode.
    #[error("Privilege elevation refused: {message}")]
    ElevationFailed {
        /// Description of the failure.
        message: String,
    },

    /// An operation exceeded its deadline.
    #[error("Timed out after {after_secs}s while {operation}")]
    Timeout {
        /// What was in progress.
        operation: String,
        /// Deadline that expired.
        after_secs: u64,
    },

    /// The device rejected a command.
    #[error("Device rejected '{command}': {output}")]
    CommandRejected {
        /// The rejected command.
        command: String,
        /// Device output for the command.
        output: String,
    },

    /// The session closed underneath us.
    #[error("Session dropped: {message}")]
    Disconnected {
        /// Description of the drop.
        message: String,
    },

    /// Socket-level failure on an established session.
    #[error("Session IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the reconciler itself.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The run was cancelled before it started.
    #[error("Reconciliation aborted: {reason}")]
    Aborted {
        /// Reason for abort.
        reason: String,
    },

    /// A worker task failed to report back.
    #[error("Worker for device '{device}' failed: {message}")]
    WorkerFailed {
        /// Device the worker was processing.
        device: String,
        /// Join failure description.
        message: String,
    },
}

/// Classification of a per-device failure, as recorded in the run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unreachable, authentication or privilege failure.
    Connection,
    /// Connect or idle timeout.
    Timeout,
    /// Command rejected or session dropped mid-command.
    Command,
    /// Not attempted because the run was cancelled.
    Cancelled,
}

/// Result type alias for vlansync operations.
pub type Result<T> = std::result::Result<T, VlanSyncError>;

impl VlanSyncError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error was raised before any device was contacted.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a validation error without a specific field.
    #[must_use]
    pub fn validation_general(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse(what: impl Into<String>, message: impl Into<String>, location: Option<String>) -> Self {
        Self::ParseError {
            what: what.into(),
            message: message.into(),
            location,
        }
    }

    /// Creates a prompt failure.
    #[must_use]
    pub fn prompt(field: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::PromptFailed {
            field: field.into(),
            message: message.to_string(),
        }
    }
}

impl SessionError {
    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(operation: impl Into<String>, after: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            after_secs: after.as_secs(),
        }
    }

    /// Creates a disconnect error.
    #[must_use]
    pub fn disconnected(message: impl Into<String>) -> Self {
        Self::Disconnected {
            message: message.into(),
        }
    }

    /// Classifies this error for the run report.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unreachable { .. }
            | Self::AuthenticationFailed { .. }
            | Self::ElevationFailed { .. } => ErrorKind::Connection,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::CommandRejected { .. } | Self::Disconnected { .. } | Self::Io(_) => {
                ErrorKind::Command
            }
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Connection => "connection",
            Self::Timeout => "timeout",
            Self::Command => "command",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}
