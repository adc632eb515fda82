// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![forbid(unsafe_code)]               // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # vlansync
//!
//! Idempotent VLAN provisioning and audit across a fleet of switches managed
//! through an interactive command-line session.
//!
//! ## Overview
//!
//! Given a VLAN id and name, vlansync visits every switch in an inventory and:
//!
//! - Reads the VLAN table (`show vlan brief`)
//! - Creates the VLAN when it is missing
//! - Renames it when the name differs and the rename was confirmed
//! - Verifies the post-condition with a second read
//!
//! Each device is processed in isolation: a switch that is unreachable or
//! rejects a command is recorded as failed and the run moves on.
//!
//! ## Architecture
//!
//! 1. **Desired State**: a [`config::DesiredVlan`] validated before any device is contacted
//! 2. **Observed State**: parsed from raw CLI text by [`planner::parse_vlan_table`]
//! 3. **Plan**: a pure [`planner::plan`] yielding one [`planner::ReconciliationAction`]
//! 4. **Reconciler**: drives session, parser, planner, executor and verifier per device
//!
//! ## Modules
//!
//! - [`config`]: VLAN types, settings, inventory, validation
//! - [`device`]: CLI session seam and the Telnet/IOS transport
//! - [`planner`]: parsing, planning, rename decisions, execution, verification
//! - [`reconciler`]: fleet orchestration
//! - [`report`]: per-device outcomes and the run report
//! - [`interfaces`]: interface audit and description updates
//! - [`cli`]: command-line interface
//!
//! ## Example
//!
//! ```json
//! {
//!   "core-sw1": "10.0.0.1",
//!   "access-sw2": "10.0.0.2"
//! }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod interfaces;
pub mod planner;
pub mod reconciler;
pub mod report;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{
    ConfigHasher, ConfigParser, ConfigValidator, DesiredVlan, DeviceTarget, Inventory, Settings,
    VlanId, VlanName,
};
pub use device::{Credentials, DeviceSession, SessionConnector, TelnetConnector};
pub use error::{ErrorKind, Result, VlanSyncError};
pub use interfaces::{InterfaceAudit, InterfaceReport};
pub use planner::{ObservedVlan, ReconciliationAction, RenameDecision, RenamePolicy};
pub use reconciler::{Reconciler, RunMode};
pub use report::{Outcome, RunReport, RunStatus};
