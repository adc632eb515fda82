//! Configuration module for vlansync.
//!
//! This module handles all configuration-related functionality:
//! - Validated VLAN id/name types and the desired VLAN
//! - Loading the device inventory
//! - Parsing and layering `vlansync.yaml` settings
//! - Validation of settings before any device is contacted
//! - Fingerprinting run inputs

mod spec;
mod parser;
mod validator;
mod hash;
mod inventory;

pub use spec::{
    DesiredVlan, RenameMode, RunSettings, SessionSettings, Settings, VlanId, VlanName,
    DEFAULT_INVENTORY, VLAN_ID_MAX, VLAN_ID_MIN, VLAN_NAME_MAX_LEN,
};
pub use parser::{
    find_config_file, ConfigParser, CONFIG_ENV, PASSWORD_ENV, SECRET_ENV, USERNAME_ENV,
};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
pub use hash::ConfigHasher;
pub use inventory::{DeviceTarget, Inventory};
