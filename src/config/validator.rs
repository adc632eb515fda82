//! Settings validation.
//!
//! Everything here runs before any device is contacted; an error aborts the
//! run with a configuration failure.

use tracing::debug;

use crate::error::{ConfigError, Result, VlanSyncError};

use super::inventory::Inventory;
use super::spec::{RenameMode, Settings};

/// Port conventionally used by SSH.
const SSH_PORT: u16 = 22;

/// Worker counts above this are unusual for interactive CLIs.
const WORKER_WARN_THRESHOLD: usize = 32;

/// Validator for run settings.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates settings, optionally against the inventory they will run on.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate(
        &self,
        settings: &Settings,
        inventory: Option<&Inventory>,
    ) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_session(settings, &mut result);
        Self::validate_run(settings, inventory, &mut result);

        if let Some(first_error) = result.errors.first() {
            Err(VlanSyncError::Config(ConfigError::ValidationError {
                message: first_error.message.clone(),
                field: Some(first_error.field.clone()),
            }))
        } else {
            debug!("Settings validation passed");
            Ok(result)
        }
    }

    /// Validates session settings.
    fn validate_session(settings: &Settings, result: &mut ValidationResult) {
        let session = &settings.session;

        if session.port == 0 {
            result.errors.push(ValidationError {
                field: String::from("session.port"),
                message: String::from("Port cannot be 0"),
            });
        } else if session.port == SSH_PORT {
            result.warnings.push(String::from(
                "session.port: Port 22 is usually SSH; the built-in transport speaks Telnet",
            ));
        }

        if session.connect_timeout_secs == 0 {
            result.errors.push(ValidationError {
                field: String::from("session.connect_timeout_secs"),
                message: String::from("Connect timeout must be at least 1 second"),
            });
        }

        if session.session_timeout_secs == 0 {
            result.errors.push(ValidationError {
                field: String::from("session.session_timeout_secs"),
                message: String::from("Session timeout must be at least 1 second"),
            });
        }
    }

    /// Validates run settings.
    fn validate_run(
        settings: &Settings,
        inventory: Option<&Inventory>,
        result: &mut ValidationResult,
    ) {
        let run = &settings.run;

        if run.workers == 0 {
            result.errors.push(ValidationError {
                field: String::from("run.workers"),
                message: String::from("At least one worker is required"),
            });
            return;
        }

        // Interactive confirmation needs one device at a time on the console
        if run.workers > 1 && run.rename == RenameMode::Prompt {
            result.errors.push(ValidationError {
                field: String::from("run.workers"),
                message: format!(
                    "{} workers requested but rename mode is 'prompt'; \
                     choose --rename always|never for parallel runs",
                    run.workers
                ),
            });
        }

        if run.workers > WORKER_WARN_THRESHOLD {
            result.warnings.push(format!(
                "run.workers: {} concurrent sessions is unusual",
                run.workers
            ));
        }

        if let Some(inventory) = inventory
            && run.workers > inventory.len()
        {
            result.warnings.push(format!(
                "run.workers: {} workers for {} devices; extra workers stay idle",
                run.workers,
                inventory.len()
            ));
        }
    }
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceTarget;

    #[test]
    fn test_default_settings_valid() {
        let result = ConfigValidator::new()
            .validate(&Settings::default(), None)
            .unwrap();
        assert!(result.is_valid());
        assert_eq!(result.warning_count(), 0);
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let mut settings = Settings::default();
        settings.session.connect_timeout_secs = 0;
        let err = ConfigValidator::new().validate(&settings, None).unwrap_err();
        assert!(err.to_string().contains("Connect timeout"));
    }

    #[test]
    fn test_parallel_requires_decided_rename() {
        let mut settings = Settings::default();
        settings.run.workers = 4;
        assert!(ConfigValidator::new().validate(&settings, None).is_err());

        settings.run.rename = RenameMode::Never;
        assert!(ConfigValidator::new().validate(&settings, None).is_ok());
    }

    #[test]
    fn test_warnings() {
        let mut settings = Settings::default();
        settings.session.port = 22;
        settings.run.workers = 3;
        settings.run.rename = RenameMode::Always;

        let inventory =
            Inventory::from_devices(vec![DeviceTarget::new("sw1", "10.0.0.1")]).unwrap();
        let result = ConfigValidator::new()
            .validate(&settings, Some(&inventory))
            .unwrap();

        assert_eq!(result.warning_count(), 2);
    }
}
