//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::{ConfigHasher, DesiredVlan, Inventory, Settings, ValidationResult};
use crate::interfaces::{InterfaceOutcome, InterfaceReport};
use crate::reconciler::RunMode;
use crate::report::{Outcome, RunReport, RunStatus};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Device outcome row for table display.
#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Observed")]
    observed: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Applied")]
    applied: String,
    #[tabled(rename = "Verified")]
    verified: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Interface row for table display.
#[derive(Tabled)]
struct InterfaceRowDisplay {
    #[tabled(rename = "Interface")]
    interface: String,
    #[tabled(rename = "IP-Address")]
    ip_address: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Protocol")]
    protocol: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a run report for display.
    #[must_use]
    pub fn format_report(&self, report: &RunReport, detailed: bool) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => Self::format_report_text(report, detailed),
        }
    }

    /// Formats a report as text.
    fn format_report_text(report: &RunReport, detailed: bool) -> String {
        let mut output = String::new();

        let title = match report.mode {
            RunMode::Apply => "VLAN reconciliation",
            RunMode::Plan => "VLAN plan (no changes made)",
        };
        let _ = write!(output, "\n{title}: {}\n", report.desired);
        let _ = write!(
            output,
            "   Run: {}  Inputs: {}\n\n",
            report.run_id,
            ConfigHasher::short(&report.fingerprint)
        );

        let rows: Vec<DeviceRow> = report
            .outcomes
            .iter()
            .map(|o| DeviceRow {
                device: o.device.name.clone(),
                address: o.device.address.clone(),
                observed: o.observed.as_ref().map_or_else(
                    || String::from("-"),
                    |observed| match observed.name() {
                        Some(name) => name.to_string(),
                        None => observed.label().to_string(),
                    },
                ),
                action: Self::format_action(o),
                applied: Self::format_flag(o.applied, report.mode == RunMode::Apply && o.succeeded()),
                verified: Self::format_flag(o.verified, report.mode == RunMode::Apply && o.succeeded()),
                status: Self::format_status(o),
            })
            .collect();

        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        // Failures and warnings, in inventory order
        for outcome in &report.outcomes {
            if let Some(failure) = &outcome.failure {
                let _ = writeln!(output, "{} {}: {failure}", "✗".red(), outcome.device.name);
            }
            for warning in &outcome.warnings {
                let _ = writeln!(output, "{} {}: {warning}", "⚠".yellow(), outcome.device.name);
            }
        }

        if detailed && report.mode == RunMode::Plan {
            let _ = write!(output, "\nPlanned commands:\n");
            for outcome in &report.outcomes {
                let Some(action) = outcome.action.as_ref().filter(|a| a.is_change()) else {
                    continue;
                };
                let _ = writeln!(
                    output,
                    "   {}: {}",
                    outcome.device.name.bold(),
                    action.commands().join("; ")
                );
            }
        }

        if detailed && report.mode == RunMode::Apply {
            for outcome in report.outcomes.iter().filter(|o| o.applied) {
                let _ = write!(
                    output,
                    "\nApplied on {}: {}\n",
                    outcome.device.name.bold(),
                    outcome.applied_commands.join("; ")
                );
                if let Some(config) = &outcome.config_output {
                    for line in config.lines() {
                        let _ = writeln!(output, "   {line}");
                    }
                }
            }
        }

        if detailed {
            for outcome in &report.outcomes {
                let Some(status) = &outcome.final_status else {
                    continue;
                };
                let _ = write!(output, "\nFinal VLAN status on {}:\n", outcome.device.name.bold());
                for line in status.lines() {
                    let _ = writeln!(output, "   {line}");
                }
            }
        }

        let summary = match report.status() {
            RunStatus::Success => format!("{} {}", "✓".green(), report.status()),
            RunStatus::PartialFailure => format!("{} {}", "✗".red(), report.status()),
        };
        let _ = write!(
            output,
            "\n{summary}: {} ok, {} failed, {} cancelled, {} changed ({} ms)\n",
            report.succeeded(),
            report.failed(),
            report.cancelled(),
            report.applied(),
            report.duration_ms()
        );

        let unverified = report.unverified();
        if !unverified.is_empty() {
            let _ = write!(
                output,
                "{} {} changed device(s) did not verify; check them manually.\n",
                "⚠".yellow(),
                unverified.len()
            );
        }

        output
    }

    /// Formats an interface audit for display.
    #[must_use]
    pub fn format_interfaces(&self, report: &InterfaceReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => Self::format_interfaces_text(report),
        }
    }

    /// Formats an interface audit as text.
    fn format_interfaces_text(report: &InterfaceReport) -> String {
        let mut output = String::new();

        for outcome in &report.outcomes {
            let _ = write!(
                output,
                "\n{} ({})\n",
                outcome.device.name.bold(),
                outcome.device.address
            );

            if let Some(failure) = &outcome.failure {
                let _ = writeln!(output, "   {} {failure}", "✗".red());
                continue;
            }

            let rows: Vec<InterfaceRowDisplay> = outcome
                .interfaces
                .iter()
                .map(|row| InterfaceRowDisplay {
                    interface: row.interface.clone(),
                    ip_address: row.ip_address.clone(),
                    status: row.status.clone(),
                    protocol: row.protocol.clone(),
                })
                .collect();
            output.push_str(&Table::new(rows).to_string());
            output.push('\n');

            if let Some(change) = &report.change {
                let _ = writeln!(output, "   {}", Self::format_change(outcome, &change.interface));
            }
        }

        let failed = report.outcomes.iter().filter(|o| !o.succeeded()).count();
        let _ = write!(
            output,
            "\n{} devices, {} failed\n",
            report.outcomes.len(),
            failed
        );

        output
    }

    /// Formats a validation result.
    #[must_use]
    pub fn format_validation(
        &self,
        result: &ValidationResult,
        settings: &Settings,
        inventory: &Inventory,
        desired: Option<&DesiredVlan>,
        show_warnings: bool,
    ) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "valid": result.is_valid(),
                    "warnings": result.warnings,
                    "settings": settings,
                    "devices": inventory.len(),
                    "desired": desired,
                });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = format!("{} Configuration is valid\n", "✓".green());

                if show_warnings && !result.warnings.is_empty() {
                    let _ = write!(output, "\n{} Warnings:\n", "⚠".yellow());
                    for warning in &result.warnings {
                        let _ = writeln!(output, "   - {warning}");
                    }
                }

                let _ = write!(output, "\nSummary:\n");
                let _ = writeln!(output, "   Inventory: {} ({} devices)", settings.inventory.display(), inventory.len());
                let _ = writeln!(output, "   Port: {}", settings.session.port);
                let _ = writeln!(
                    output,
                    "   Timeouts: connect {}s, session {}s",
                    settings.session.connect_timeout_secs, settings.session.session_timeout_secs
                );
                let _ = writeln!(output, "   Workers: {}  Rename: {}", settings.run.workers, settings.run.rename);
                if let Some(desired) = desired {
                    let _ = writeln!(output, "   Desired: {desired}");
                }

                output
            }
        }
    }

    /// Formats a fatal error.
    #[must_use]
    pub fn format_error(&self, message: &str) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "status": "error", "message": message });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => format!("{} {message}", "✗".red()),
        }
    }

    /// Formats a device's action with color.
    fn format_action(outcome: &Outcome) -> String {
        let Some(action) = &outcome.action else {
            return "-".dimmed().to_string();
        };
        match action.label() {
            "create" => "+create".green().to_string(),
            "rename" => "~rename".yellow().to_string(),
            other => other.dimmed().to_string(),
        }
    }

    /// Formats a device's status with color.
    fn format_status(outcome: &Outcome) -> String {
        match outcome.status_label() {
            "ok" => "ok".green().to_string(),
            "warning" => "warning".yellow().to_string(),
            "cancelled" => "cancelled".dimmed().to_string(),
            other => other.red().to_string(),
        }
    }

    /// Formats a yes/no flag, or `-` when it does not apply.
    fn format_flag(value: bool, meaningful: bool) -> String {
        match (meaningful, value) {
            (false, _) => String::from("-"),
            (true, true) => "yes".green().to_string(),
            (true, false) => "no".yellow().to_string(),
        }
    }

    /// Describes what happened to a description change on one device.
    fn format_change(outcome: &InterfaceOutcome, interface: &str) -> String {
        if outcome.applied {
            format!("{} description set on {interface}", "✓".green())
        } else if outcome.skipped {
            format!("{} {interface} not present, skipped", "-".dimmed())
        } else {
            format!("{} description not applied", "✗".red())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeviceTarget, VlanId, VlanName};
    use crate::planner::ReconciliationAction;
    use chrono::Utc;
    use uuid::Uuid;

    fn report() -> RunReport {
        let mut changed = Outcome::new(DeviceTarget::new("sw1", "10.0.0.1"));
        changed.action = Some(ReconciliationAction::Create {
            id: VlanId::new(10).unwrap(),
            name: VlanName::new("SALES").unwrap(),
        });
        changed.applied = true;
        changed.applied_commands = vec![String::from("vlan 10"), String::from("name SALES")];
        changed.config_output = Some(String::from("Enter configuration commands, one per line."));
        changed.verified = true;
        changed.final_status = Some(String::from("10   SALES   active"));

        let now = Utc::now();
        RunReport {
            run_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            fingerprint: String::from("0123456789abcdef"),
            desired: DesiredVlan::parse("10", "SALES").unwrap(),
            mode: RunMode::Apply,
            outcomes: vec![
                changed,
                Outcome::cancelled(DeviceTarget::new("sw2", "10.0.0.2")),
            ],
        }
    }

    #[test]
    fn test_text_report_lists_every_device() {
        colored::control::set_override(false);
        let text = OutputFormatter::new(OutputFormat::Text).format_report(&report(), true);

        assert!(text.contains("sw1"));
        assert!(text.contains("sw2"));
        assert!(text.contains("cancelled"));
        assert!(text.contains("Final VLAN status on sw1"));
        assert!(text.contains("Applied on sw1: vlan 10; name SALES"));
        assert!(text.contains("Enter configuration commands"));
        assert!(text.contains("0123456789ab"));
    }

    #[test]
    fn test_json_report() {
        let json = OutputFormatter::new(OutputFormat::Json).format_report(&report(), false);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["outcomes"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["outcomes"][0]["action"]["type"], "create");
        assert_eq!(value["outcomes"][0]["applied_commands"][1], "name SALES");
        assert_eq!(value["outcomes"][1]["failure"]["kind"], "cancelled");
        assert_eq!(value["mode"], "apply");
    }

    #[test]
    fn test_json_error() {
        let json = OutputFormatter::new(OutputFormat::Json).format_error("bad inventory");
        assert!(json.contains("bad inventory"));
    }
}
