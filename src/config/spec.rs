//! Configuration types for a reconciliation run.
//!
//! This module defines the validated VLAN identity supplied by the operator
//! and the settings that map to the optional `vlansync.yaml` file.

use std::fmt;
use std::num::IntErrorKind;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Lowest usable VLAN id.
pub const VLAN_ID_MIN: u16 = 1;

/// Highest usable VLAN id.
pub const VLAN_ID_MAX: u16 = 4094;

/// Longest VLAN name accepted by the IOS `name` command.
pub const VLAN_NAME_MAX_LEN: usize = 32;

/// Default inventory location, relative to the working directory.
pub const DEFAULT_INVENTORY: &str = "inventories/switches.json";

/// Default CLI port (Telnet).
pub const DEFAULT_PORT: u16 = 23;

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default session idle timeout in seconds.
pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 60;

/// A VLAN identifier in the range 1..=4094.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct VlanId(u16);

impl VlanId {
    /// Creates a VLAN id, rejecting values outside 1..=4094.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is out of range.
    pub fn new(id: u16) -> Result<Self, ConfigError> {
        if (VLAN_ID_MIN..=VLAN_ID_MAX).contains(&id) {
            Ok(Self(id))
        } else {
            Err(ConfigError::InvalidVlanId {
                input: id.to_string(),
                reason: format!("must be between {VLAN_ID_MIN} and {VLAN_ID_MAX}"),
            })
        }
    }

    /// Returns the numeric id.
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl FromStr for VlanId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let out_of_range = || ConfigError::InvalidVlanId {
            input: s.to_string(),
            reason: format!("must be between {VLAN_ID_MIN} and {VLAN_ID_MAX}"),
        };

        let value: i64 = match s.trim().parse() {
            Ok(value) => value,
            // Digits too long for any integer are still a number, just out of range
            Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
                return Err(out_of_range());
            }
            Err(_) => {
                return Err(ConfigError::InvalidVlanId {
                    input: s.to_string(),
                    reason: String::from("must be a number"),
                });
            }
        };

        u16::try_from(value)
            .ok()
            .and_then(|id| Self::new(id).ok())
            .ok_or_else(out_of_range)
    }
}

impl TryFrom<u16> for VlanId {
    type Error = ConfigError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VlanId> for u16 {
    fn from(id: VlanId) -> Self {
        id.0
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A VLAN name the device will store verbatim.
///
/// Names are a single token: the VLAN table shows the name as one
/// whitespace-delimited column, so a name containing spaces could never be
/// read back and verified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VlanName(String);

impl VlanName {
    /// Creates a VLAN name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, too long, or not a single
    /// printable token.
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        let reject = |reason: &str| ConfigError::InvalidVlanName {
            name: name.clone(),
            reason: reason.to_string(),
        };

        if name.is_empty() {
            return Err(reject("name cannot be empty"));
        }
        if name.chars().count() > VLAN_NAME_MAX_LEN {
            return Err(reject("name cannot be longer than 32 characters"));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(reject("name cannot contain whitespace"));
        }
        if !name.chars().all(|c| c.is_ascii_graphic()) {
            return Err(reject("name must be printable ASCII"));
        }

        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VlanName {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VlanName> for String {
    fn from(name: VlanName) -> Self {
        name.0
    }
}

impl fmt::Display for VlanName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The VLAN every device in the fleet should converge to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DesiredVlan {
    /// VLAN id.
    pub id: VlanId,
    /// VLAN name.
    pub name: VlanName,
}

impl DesiredVlan {
    /// Creates a desired VLAN from already-validated parts.
    #[must_use]
    pub const fn new(id: VlanId, name: VlanName) -> Self {
        Self { id, name }
    }

    /// Validates raw operator input.
    ///
    /// # Errors
    ///
    /// Returns an error if the id or name is invalid.
    pub fn parse(raw_id: &str, raw_name: &str) -> Result<Self, ConfigError> {
        let id = raw_id.parse()?;
        let name = VlanName::new(raw_name)?;
        Ok(Self { id, name })
    }
}

impl fmt::Display for DesiredVlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VLAN {} ({})", self.id, self.name)
    }
}

/// Settings loaded from `vlansync.yaml`, environment and flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Path to the device inventory.
    pub inventory: PathBuf,
    /// Device session settings.
    pub session: SessionSettings,
    /// Run behaviour settings.
    pub run: RunSettings,
}

/// Device session settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionSettings {
    /// TCP port of the device CLI.
    pub port: u16,
    /// Seconds allowed to connect, log in and elevate.
    pub connect_timeout_secs: u64,
    /// Seconds a session may sit idle waiting for device output.
    pub session_timeout_secs: u64,
}

/// Run behaviour settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunSettings {
    /// Number of devices processed concurrently.
    pub workers: usize,
    /// How name mismatches are resolved.
    pub rename: RenameMode,
}

/// How a name mismatch on an existing VLAN is resolved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RenameMode {
    /// Ask the operator for every mismatching device.
    #[default]
    Prompt,
    /// Always rename.
    Always,
    /// Never rename; mismatches are only reported.
    Never,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            inventory: PathBuf::from(DEFAULT_INVENTORY),
            session: SessionSettings::default(),
            run: RunSettings::default(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            session_timeout_secs: DEFAULT_SESSION_TIMEOUT_SECS,
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            workers: 1,
            rename: RenameMode::Prompt,
        }
    }
}

impl SessionSettings {
    /// Connect timeout as a duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Session idle timeout as a duration.
    #[must_use]
    pub const fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }
}

impl fmt::Display for RenameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Prompt => "prompt",
            Self::Always => "always",
            Self::Never => "never",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vlan_id_range() {
        assert!(VlanId::new(0).is_err());
        assert_eq!(VlanId::new(1).map(VlanId::get).ok(), Some(1));
        assert_eq!(VlanId::new(4094).map(VlanId::get).ok(), Some(4094));
        assert!(VlanId::new(4095).is_err());
    }

    #[test]
    fn test_vlan_id_from_str() {
        assert_eq!("10".parse::<VlanId>().map(VlanId::get).ok(), Some(10));
        assert_eq!(" 42 ".parse::<VlanId>().map(VlanId::get).ok(), Some(42));

        let err = "9999".parse::<VlanId>().unwrap_err();
        assert!(err.to_string().contains("between 1 and 4094"));

        let err = "-1".parse::<VlanId>().unwrap_err();
        assert!(err.to_string().contains("between 1 and 4094"));

        let err = "ten".parse::<VlanId>().unwrap_err();
        assert!(err.to_string().contains("must be a number"));
    }

    #[test]
    fn test_vlan_id_overflow_is_out_of_range() {
        let err = "99999999999999999999".parse::<VlanId>().unwrap_err();
        assert!(err.to_string().contains("between 1 and 4094"));

        let err = "-99999999999999999999".parse::<VlanId>().unwrap_err();
        assert!(err.to_string().contains("between 1 and 4094"));

        let err = "12ab".parse::<VlanId>().unwrap_err();
        assert!(err.to_string().contains("must be a number"));
    }

    #[test]
    fn test_vlan_name_rules() {
        assert!(VlanName::new("SALES").is_ok());
        assert!(VlanName::new("VOICE_2nd-floor").is_ok());
        assert!(VlanName::new("").is_err());
        assert!(VlanName::new("TWO WORDS").is_err());
        assert!(VlanName::new("A".repeat(33)).is_err());
        assert!(VlanName::new("A".repeat(32)).is_ok());
    }

    #[test]
    fn test_desired_vlan_parse() {
        let desired = DesiredVlan::parse("10", "SALES").unwrap();
        assert_eq!(desired.id.get(), 10);
        assert_eq!(desired.name.as_str(), "SALES");
        assert_eq!(desired.to_string(), "VLAN 10 (SALES)");

        assert!(DesiredVlan::parse("9999", "SALES").is_err());
        assert!(DesiredVlan::parse("10", "").is_err());
    }

    #[test]
    fn test_settings_defaults_from_partial_yaml() {
        let settings: Settings = serde_yaml::from_str("session:\n  port: 2323\n").unwrap();
        assert_eq!(settings.session.port, 2323);
        assert_eq!(settings.session.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
        assert_eq!(settings.run.workers, 1);
        assert_eq!(settings.run.rename, RenameMode::Prompt);
        assert_eq!(settings.inventory, PathBuf::from(DEFAULT_INVENTORY));
    }

    #[test]
    fn test_vlan_id_deserialize_rejects_out_of_range() {
        let ok: Result<VlanId, _> = serde_json::from_str("100");
        assert!(ok.is_ok());
        let bad: Result<VlanId, _> = serde_json::from_str("5000");
        assert!(bad.is_err());
    }
}
