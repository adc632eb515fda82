//! Reconciliation actions and the pure planner.
//!
//! The planner decides what one device needs; it never touches the device.
//! Rendering an action to CLI lines is separate from executing it.

use serde::Serialize;

use crate::config::{DesiredVlan, VlanId, VlanName};

use super::parse::ObservedVlan;

/// The single change chosen for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReconciliationAction {
    /// Nothing to send.
    NoOp,
    /// The VLAN exists under another name.
    Rename {
        /// VLAN id.
        id: VlanId,
        /// Current name.
        from: String,
        /// Desired name.
        to: VlanName,
    },
    /// The VLAN is missing (or its state could not be read).
    Create {
        /// VLAN id.
        id: VlanId,
        /// Desired name.
        name: VlanName,
    },
}

/// Chooses the action for one device.
///
/// | observed          | names equal | confirmed | action   |
/// |-------------------|-------------|-----------|----------|
/// | absent/unparsable | -           | -         | `Create` |
/// | present           | yes         | -         | `NoOp`   |
/// | present           | no          | yes       | `Rename` |
/// | present           | no          | no        | `NoOp`   |
#[must_use]
pub fn plan(
    desired: &DesiredVlan,
    observed: &ObservedVlan,
    rename_confirmed: bool,
) -> ReconciliationAction {
    match observed.name() {
        None => ReconciliationAction::Create {
            id: desired.id,
            name: desired.name.clone(),
        },
        Some(current) if current == desired.name.as_str() => ReconciliationAction::NoOp,
        Some(current) if rename_confirmed => ReconciliationAction::Rename {
            id: desired.id,
            from: current.to_string(),
            to: desired.name.clone(),
        },
        Some(_) => ReconciliationAction::NoOp,
    }
}

/// Returns true if the VLAN exists under a different name.
///
/// This is the only case where the planner needs a rename decision.
#[must_use]
pub fn name_mismatch(desired: &DesiredVlan, observed: &ObservedVlan) -> bool {
    observed
        .name()
        .is_some_and(|current| current != desired.name.as_str())
}

impl ReconciliationAction {
    /// Configuration lines for this action, in order.
    ///
    /// `name` both creates and renames, so the two render identically.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        match self {
            Self::NoOp => Vec::new(),
            Self::Rename { id, to: name, .. } | Self::Create { id, name } => {
                vec![format!("vlan {id}"), format!("name {name}")]
            }
        }
    }

    /// Returns true if the action sends configuration.
    #[must_use]
    pub const fn is_change(&self) -> bool {
        !matches!(self, Self::NoOp)
    }

    /// Short label for tables.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::NoOp => "no-op",
            Self::Rename { .. } => "rename",
            Self::Create { .. } => "create",
        }
    }
}

impl std::fmt::Display for ReconciliationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoOp => write!(f, "no change"),
            Self::Rename { id, from, to } => write!(f, "rename VLAN {id} '{from}' -> '{to}'"),
            Self::Create { id, name } => write!(f, "create VLAN {id} '{name}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desired() -> DesiredVlan {
        DesiredVlan::parse("10", "SALES").unwrap()
    }

    fn id() -> VlanId {
        VlanId::new(10).unwrap()
    }

    fn present(name: &str) -> ObservedVlan {
        ObservedVlan::Present {
            id: id(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_absent_creates_regardless_of_confirmation() {
        for confirmed in [false, true] {
            for observed in [ObservedVlan::Absent { id: id() }, ObservedVlan::Unparseable { id: id() }] {
                let action = plan(&desired(), &observed, confirmed);
                assert_eq!(
                    action,
                    ReconciliationAction::Create {
                        id: id(),
                        name: VlanName::new("SALES").unwrap()
                    }
                );
            }
        }
    }

    #[test]
    fn test_matching_name_is_noop() {
        for confirmed in [false, true] {
            assert_eq!(plan(&desired(), &present("SALES"), confirmed), ReconciliationAction::NoOp);
        }
    }

    #[test]
    fn test_mismatch_needs_confirmation() {
        assert_eq!(plan(&desired(), &present("OLD"), false), ReconciliationAction::NoOp);
        assert_eq!(
            plan(&desired(), &present("OLD"), true),
            ReconciliationAction::Rename {
                id: id(),
                from: String::from("OLD"),
                to: VlanName::new("SALES").unwrap()
            }
        );
    }

    #[test]
    fn test_names_compare_case_sensitively() {
        assert!(name_mismatch(&desired(), &present("sales")));
        assert!(!name_mismatch(&desired(), &present("SALES")));
        assert!(!name_mismatch(&desired(), &ObservedVlan::Absent { id: id() }));
    }

    #[test]
    fn test_plan_is_deterministic() {
        let observed = present("OLD");
        let before = observed.clone();
        let first = plan(&desired(), &observed, true);
        let second = plan(&desired(), &observed, true);
        assert_eq!(first, second);
        assert_eq!(observed, before);
    }

    #[test]
    fn test_create_and_rename_render_the_same_lines() {
        let create = plan(&desired(), &ObservedVlan::Absent { id: id() }, false);
        let rename = plan(&desired(), &present("OLD"), true);
        assert_eq!(create.commands(), vec!["vlan 10", "name SALES"]);
        assert_eq!(rename.commands(), create.commands());
        assert!(ReconciliationAction::NoOp.commands().is_empty());
        assert!(!ReconciliationAction::NoOp.is_change());
    }
}
