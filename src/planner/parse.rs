//! VLAN table parsing.
//!
//! Device output is free text with whitespace-separated columns. Parsing
//! never fails: output we cannot make sense of becomes
//! [`ObservedVlan::Unparseable`], which the planner treats exactly like an
//! absent VLAN (creating an existing VLAN is harmless).

use serde::Serialize;

use crate::config::VlanId;

/// Name reported when a VLAN row carries no name column.
pub const UNKNOWN_NAME: &str = "Unknown";

/// One VLAN as read from a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ObservedVlan {
    /// The VLAN exists with this name.
    Present {
        /// VLAN id.
        id: VlanId,
        /// Name as shown by the device.
        name: String,
    },
    /// The output is a VLAN listing without this id.
    Absent {
        /// VLAN id.
        id: VlanId,
    },
    /// The output could not be recognised as a VLAN listing.
    Unparseable {
        /// VLAN id.
        id: VlanId,
    },
}

impl ObservedVlan {
    /// The VLAN id that was looked up.
    #[must_use]
    pub const fn id(&self) -> VlanId {
        match self {
            Self::Present { id, .. } | Self::Absent { id } | Self::Unparseable { id } => *id,
        }
    }

    /// Returns true if the VLAN exists on the device.
    #[must_use]
    pub const fn exists(&self) -> bool {
        matches!(self, Self::Present { .. })
    }

    /// Current name, if the VLAN exists.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Present { name, .. } => Some(name.as_str()),
            Self::Absent { .. } | Self::Unparseable { .. } => None,
        }
    }

    /// Short state label for reports.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Present { .. } => "present",
            Self::Absent { .. } => "absent",
            Self::Unparseable { .. } => "unparseable",
        }
    }
}

impl std::fmt::Display for ObservedVlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Present { id, name } => write!(f, "VLAN {id} ({name})"),
            Self::Absent { id } => write!(f, "VLAN {id} absent"),
            Self::Unparseable { id } => write!(f, "VLAN {id} unknown (unparseable output)"),
        }
    }
}

/// Looks up `wanted` in `show vlan brief` / `show vlan id` output.
///
/// A row matches when its first token is the decimal id; the second token is
/// the name. Only the first matching row counts.
#[must_use]
pub fn parse_vlan_table(raw: &str, wanted: VlanId) -> ObservedVlan {
    let wanted_token = wanted.to_string();

    for line in raw.lines() {
        let mut tokens = line.split_whitespace();
        if tokens.next() == Some(wanted_token.as_str()) {
            let name = tokens.next().unwrap_or(UNKNOWN_NAME);
            return ObservedVlan::Present {
                id: wanted,
                name: name.to_string(),
            };
        }
    }

    if looks_like_vlan_listing(raw) {
        ObservedVlan::Absent { id: wanted }
    } else {
        ObservedVlan::Unparseable { id: wanted }
    }
}

/// A VLAN listing has a `VLAN` header, a numeric row, or an explicit
/// "not found" message.
fn looks_like_vlan_listing(raw: &str) -> bool {
    raw.lines().any(|line| {
        let first = line.split_whitespace().next().unwrap_or_default();
        first == "VLAN"
            || (!first.is_empty() && first.bytes().all(|b| b.is_ascii_digit()))
            || line.contains("not found")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRIEF: &str = "\
VLAN Name                             Status    Ports
---- -------------------------------- --------- -------------------------------
1    default                          active    Gi0/1, Gi0/2
10   SALES                            active    Gi0/3
20   VOICE                            active
1002 fddi-default                     act/unsup
";

    fn id(n: u16) -> VlanId {
        VlanId::new(n).unwrap()
    }

    #[test]
    fn test_present() {
        let observed = parse_vlan_table(BRIEF, id(10));
        assert_eq!(
            observed,
            ObservedVlan::Present {
                id: id(10),
                name: String::from("SALES")
            }
        );
        assert!(observed.exists());
        assert_eq!(observed.name(), Some("SALES"));
    }

    #[test]
    fn test_token_match_is_exact() {
        assert_eq!(parse_vlan_table(BRIEF, id(1)).name(), Some("default"));
        assert_eq!(parse_vlan_table(BRIEF, id(100)), ObservedVlan::Absent { id: id(100) });
        assert_eq!(parse_vlan_table(BRIEF, id(2)), ObservedVlan::Absent { id: id(2) });
    }

    #[test]
    fn test_leading_whitespace_and_missing_name() {
        let observed = parse_vlan_table("   30\n", id(30));
        assert_eq!(observed.name(), Some(UNKNOWN_NAME));
    }

    #[test]
    fn test_first_match_wins() {
        let raw = "10   SALES   active\n10   DUPLICATE  active\n";
        assert_eq!(parse_vlan_table(raw, id(10)).name(), Some("SALES"));
    }

    #[test]
    fn test_show_vlan_id_output() {
        let raw = "\
VLAN Name                             Status    Ports
---- -------------------------------- --------- -------------------------------
10   SALES                            active

VLAN Type  SAID       MTU   Parent RingNo BridgeNo Stp  BrdgMode Trans1 Trans2
---- ----- ---------- ----- ------ ------ -------- ---- -------- ------ ------
10   enet  100010     1500  -      -      -        -    -        0      0
";
        assert_eq!(parse_vlan_table(raw, id(10)).name(), Some("SALES"));

        let missing = "VLAN id 10 not found in current VLAN database\n";
        assert_eq!(parse_vlan_table(missing, id(10)), ObservedVlan::Absent { id: id(10) });
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(parse_vlan_table("", id(10)), ObservedVlan::Unparseable { id: id(10) });
        let garbage = "% Invalid input detected at '^' marker.\n";
        let observed = parse_vlan_table(garbage, id(10));
        assert_eq!(observed, ObservedVlan::Unparseable { id: id(10) });
        assert!(!observed.exists());
        assert_eq!(observed.name(), None);
    }

    #[test]
    fn test_parse_is_idempotent() {
        for raw in [BRIEF, "", "garbage", "10"] {
            assert_eq!(parse_vlan_table(raw, id(10)), parse_vlan_table(raw, id(10)));
        }
    }
}
