//! CLI module for vlansync.
//!
//! This module provides the command-line interface for reconciling a VLAN
//! across a switch fleet.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat, VlanArgs};
pub use output::OutputFormatter;
