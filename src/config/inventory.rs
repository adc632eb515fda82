//! Device inventory loading.
//!
//! An inventory maps device names to management addresses. The on-disk
//! format is a JSON object (`inventories/switches.json`) or an equivalent
//! YAML mapping. Entry order is preserved so reports list devices in the
//! order the operator wrote them.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::error::{ConfigError, Result, VlanSyncError};

/// A single device to reconcile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceTarget {
    /// Unique device name.
    pub name: String,
    /// Management address (`host` or `host:port`).
    pub address: String,
}

impl DeviceTarget {
    /// Creates a device target.
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

impl fmt::Display for DeviceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.address)
    }
}

/// An ordered set of devices, unique by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    devices: Vec<DeviceTarget>,
}

/// Raw name/address pairs in document order, duplicates included.
struct RawInventory(Vec<(String, String)>);

impl<'de> Deserialize<'de> for RawInventory {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RawVisitor;

        impl<'de> Visitor<'de> for RawVisitor {
            type Value = RawInventory;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of device name to address")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, address)) = map.next_entry::<String, String>()? {
                    entries.push((name, address));
                }
                Ok(RawInventory(entries))
            }
        }

        deserializer.deserialize_map(RawVisitor)
    }
}

impl Inventory {
    /// Builds an inventory from devices, enforcing unique non-empty names
    /// and non-empty addresses.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate names or empty fields.
    pub fn from_devices(devices: Vec<DeviceTarget>) -> std::result::Result<Self, ConfigError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for device in &devices {
            if device.name.trim().is_empty() {
                return Err(ConfigError::validation(
                    "Device name cannot be empty",
                    "inventory",
                ));
            }
            if device.address.trim().is_empty() {
                return Err(ConfigError::validation(
                    format!("Device '{}' has no address", device.name),
                    format!("inventory.{}", device.name),
                ));
            }
            if !seen.insert(device.name.as_str()) {
                return Err(ConfigError::DuplicateDevice {
                    name: device.name.clone(),
                });
            }
        }
        drop(seen);

        Ok(Self { devices })
    }

    /// Loads an inventory file. `.yaml`/`.yml` files are read as YAML,
    /// everything else as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, malformed, empty, or has
    /// duplicate or blank entries.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading inventory from: {}", path.display());

        if !path.exists() {
            return Err(VlanSyncError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::parse(
                "inventory",
                format!("Failed to read file: {e}"),
                Some(path.display().to_string()),
            )
        })?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        let inventory = if is_yaml {
            Self::from_yaml_str(&content, Some(path))?
        } else {
            Self::from_json_str(&content, Some(path))?
        };

        if inventory.is_empty() {
            return Err(VlanSyncError::Config(ConfigError::EmptyInventory {
                path: path.to_path_buf(),
            }));
        }

        debug!("Loaded {} devices", inventory.len());
        Ok(inventory)
    }

    /// Parses a JSON inventory.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not a name-to-address object.
    pub fn from_json_str(
        content: &str,
        source: Option<&Path>,
    ) -> std::result::Result<Self, ConfigError> {
        let raw: RawInventory = serde_json::from_str(content).map_err(|e| {
            ConfigError::parse(
                "inventory",
                format!("Invalid JSON format: {e}"),
                source.map(|p| p.display().to_string()),
            )
        })?;
        Self::from_raw(raw)
    }

    /// Parses a YAML inventory.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is not a name-to-address mapping.
    pub fn from_yaml_str(
        content: &str,
        source: Option<&Path>,
    ) -> std::result::Result<Self, ConfigError> {
        let raw: RawInventory = serde_yaml::from_str(content).map_err(|e| {
            ConfigError::parse(
                "inventory",
                format!("Invalid YAML format: {e}"),
                source.map(|p| p.display().to_string()),
            )
        })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawInventory) -> std::result::Result<Self, ConfigError> {
        Self::from_devices(
            raw.0
                .into_iter()
                .map(|(name, address)| DeviceTarget { name, address })
                .collect(),
        )
    }

    /// Returns the devices in inventory order.
    #[must_use]
    pub fn devices(&self) -> &[DeviceTarget] {
        &self.devices
    }

    /// Iterates over devices in inventory order.
    pub fn iter(&self) -> std::slice::Iter<'_, DeviceTarget> {
        self.devices.iter()
    }

    /// Returns the number of devices.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns true if the inventory has no devices.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl<'a> IntoIterator for &'a Inventory {
    type Item = &'a DeviceTarget;
    type IntoIter = std::slice::Iter<'a, DeviceTarget>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_json_preserves_order() {
        let json = r#"{"sw3": "10.0.0.3", "sw1": "10.0.0.1", "sw2": "10.0.0.2"}"#;
        let inventory = Inventory::from_json_str(json, None).unwrap();

        let names: Vec<&str> = inventory.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["sw3", "sw1", "sw2"]);
        assert_eq!(inventory.devices()[1].address, "10.0.0.1");
    }

    #[test]
    fn test_yaml_inventory() {
        let yaml = "core-sw1: 10.0.0.1\naccess-sw2: \"10.0.0.2:2323\"\n";
        let inventory = Inventory::from_yaml_str(yaml, None).unwrap();
        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory.devices()[1].address, "10.0.0.2:2323");
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let json = r#"{"sw1": "10.0.0.1", "sw1": "10.0.0.9"}"#;
        let err = Inventory::from_json_str(json, None).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateDevice { ref name } if name == "sw1"));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(Inventory::from_json_str("[\"10.0.0.1\"]", None).is_err());
        assert!(Inventory::from_json_str("{\"sw1\": 42}", None).is_err());
        assert!(Inventory::from_json_str("{\"sw1\": ", None).is_err());
        assert!(Inventory::from_json_str(r#"{"sw1": ""}"#, None).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Inventory::load("/nonexistent/switches.json").unwrap_err();
        assert!(matches!(
            err,
            VlanSyncError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_load_empty_inventory() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(b"{}").unwrap();

        let err = Inventory::load(file.path()).unwrap_err();
        assert!(matches!(
            err,
            VlanSyncError::Config(ConfigError::EmptyInventory { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(br#"{"sw1": "10.0.0.1"}"#).unwrap();

        let inventory = Inventory::load(file.path()).unwrap();
        assert_eq!(inventory.devices(), &[DeviceTarget::new("sw1", "10.0.0.1")]);
    }
}
