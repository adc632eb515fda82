//! Planning module for VLAN reconciliation.
//!
//! This module turns raw device output into an observed state, chooses the
//! action that moves it to the desired state, applies it, and checks the
//! result.

mod decision;
mod executor;
mod parse;
mod plan;
mod verify;

pub use decision::{decision_for, InteractiveRename, RenameDecision, RenamePolicy};
#[cfg(test)]
pub use decision::MockRenameDecision;
pub use executor::{ExecutionResult, PlanExecutor};
pub use parse::{parse_vlan_table, ObservedVlan, UNKNOWN_NAME};
pub use plan::{name_mismatch, plan, ReconciliationAction};
pub use verify::{verify, verify_state};
