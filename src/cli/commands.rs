//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::error::ErrorKind as ClapErrorKind;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{RenameMode, CONFIG_ENV};
use crate::report::EXIT_ABORTED;

/// vlansync - idempotent VLAN provisioning across a switch fleet.
#[derive(Parser, Debug)]
#[command(name = "vlansync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the settings file.
    #[arg(short, long, global = true, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Path to the device inventory (overrides settings).
    #[arg(short, long, global = true)]
    pub inventory: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate settings, inventory and (optionally) the VLAN without
    /// contacting any device.
    Validate {
        /// VLAN to validate.
        #[command(flatten)]
        vlan: VlanArgs,

        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },

    /// Read every device and show what `apply` would change.
    Plan {
        /// Desired VLAN.
        #[command(flatten)]
        vlan: VlanArgs,

        /// How name mismatches are resolved (`prompt` never asks in plan mode).
        #[arg(long, value_enum)]
        rename: Option<RenameMode>,

        /// Show the commands each device would receive.
        #[arg(short, long)]
        detailed: bool,
    },

    /// Create or rename the VLAN on every device and verify it.
    Apply {
        /// Desired VLAN.
        #[command(flatten)]
        vlan: VlanArgs,

        /// How name mismatches are resolved.
        #[arg(long, value_enum)]
        rename: Option<RenameMode>,

        /// Rename without asking (same as `--rename always`).
        #[arg(short, long, conflicts_with = "rename")]
        yes: bool,

        /// Devices processed concurrently (requires a non-interactive rename mode).
        #[arg(short, long)]
        workers: Option<usize>,

        /// Print the applied configuration and each device's final VLAN status.
        #[arg(short, long)]
        detailed: bool,
    },

    /// List interfaces on every device, optionally setting a description.
    Interfaces {
        /// Interface to describe.
        #[arg(long, requires = "description")]
        interface: Option<String>,

        /// Description to set on `--interface`.
        #[arg(long, requires = "interface")]
        description: Option<String>,
    },
}

/// VLAN identity arguments; missing values are prompted for.
#[derive(Args, Debug, Clone, Default)]
pub struct VlanArgs {
    /// VLAN id (1-4094).
    #[arg(long)]
    pub vlan_id: Option<String>,

    /// VLAN name.
    #[arg(long)]
    pub vlan_name: Option<String>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Exit code for a command line that could not be parsed.
    ///
    /// Returns `None` for `--help` and `--version`, which are not failures.
    /// Anything else aborts the run before a device is contacted.
    #[must_use]
    pub fn parse_failure_code(error: &clap::Error) -> Option<u8> {
        match error.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => None,
            _ => Some(EXIT_ABORTED),
        }
    }
}
