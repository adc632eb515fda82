//! Post-condition checks.
//!
//! A failed check is not an error. The change may have gone through while
//! the read lags or the device normalises the name; the outcome records
//! `verified = false` and the operator checks by hand.

use crate::config::{DesiredVlan, VlanId};

use super::parse::parse_vlan_table;

/// Returns true if `raw` shows the desired VLAN with the desired name.
#[must_use]
pub fn verify(raw: &str, desired: &DesiredVlan) -> bool {
    verify_state(raw, desired.id, desired.name.as_str())
}

/// Returns true if `raw` shows VLAN `id` named exactly `expected_name`.
#[must_use]
pub fn verify_state(raw: &str, id: VlanId, expected_name: &str) -> bool {
    parse_vlan_table(raw, id).name() == Some(expected_name)
}
