//! vlansync CLI entrypoint.
//!
//! This is the main entrypoint for the vlansync command-line tool.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use vlansync::cli::{Cli, Commands, OutputFormatter, VlanArgs};
use vlansync::config::{
    ConfigParser, ConfigValidator, DesiredVlan, Inventory, RenameMode, Settings, VlanId, VlanName,
    PASSWORD_ENV, SECRET_ENV, USERNAME_ENV,
};
use vlansync::device::{Credentials, TelnetConnector};
use vlansync::error::{ConfigError, Result};
use vlansync::interfaces::{DescriptionChange, InterfaceAudit};
use vlansync::planner::decision_for;
use vlansync::reconciler::{Reconciler, RunMode};
use vlansync::report::EXIT_ABORTED;

use clap::Parser;
use dialoguer::Input;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let Some(code) = Cli::parse_failure_code(&e) else {
                e.exit()
            };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::from(EXIT_ABORTED);
        }
    };

    let formatter = OutputFormatter::new(cli.output);
    match runtime.block_on(run(cli, &formatter)) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{e}");
            emit(&formatter.format_error(&e.to_string()));
            ExitCode::from(EXIT_ABORTED)
        }
    }
}

/// Initializes the logging system.
///
/// `RUST_LOG` takes precedence over `--verbose`. Logs go to stderr so that
/// stdout carries only the report.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point; returns the process exit code.
async fn run(cli: Cli, formatter: &OutputFormatter) -> Result<u8> {
    let settings = load_settings(cli.config.as_deref(), cli.inventory.as_deref())?;

    match cli.command {
        Commands::Validate { vlan, warnings } => cmd_validate(settings, &vlan, warnings, formatter),
        Commands::Plan {
            vlan,
            rename,
            detailed,
        } => {
            let overrides = RunOverrides {
                rename,
                workers: None,
            };
            cmd_reconcile(settings, &vlan, overrides, RunMode::Plan, detailed, formatter).await
        }
        Commands::Apply {
            vlan,
            rename,
            yes,
            workers,
            detailed,
        } => {
            let overrides = RunOverrides {
                rename: if yes { Some(RenameMode::Always) } else { rename },
                workers,
            };
            cmd_reconcile(settings, &vlan, overrides, RunMode::Apply, detailed, formatter).await
        }
        Commands::Interfaces {
            interface,
            description,
        } => cmd_interfaces(settings, interface, description, formatter).await,
    }
}

/// Command-line overrides applied on top of file and environment settings.
struct RunOverrides {
    rename: Option<RenameMode>,
    workers: Option<usize>,
}

impl RunOverrides {
    fn apply(self, settings: &mut Settings) {
        if let Some(rename) = self.rename {
            settings.run.rename = rename;
        }
        if let Some(workers) = self.workers {
            settings.run.workers = workers;
        }
    }
}

/// Validate settings, inventory and the VLAN without contacting devices.
fn cmd_validate(
    settings: Settings,
    vlan: &VlanArgs,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<u8> {
    let inventory = Inventory::load(&settings.inventory)?;
    let result = ConfigValidator::new().validate(&settings, Some(&inventory))?;

    let desired = match (&vlan.vlan_id, &vlan.vlan_name) {
        (Some(id), Some(name)) => Some(DesiredVlan::parse(id, name)?),
        (Some(id), None) => {
            id.parse::<VlanId>()?;
            None
        }
        (None, Some(name)) => {
            VlanName::new(name.as_str())?;
            None
        }
        (None, None) => None,
    };

    emit(&formatter.format_validation(
        &result,
        &settings,
        &inventory,
        desired.as_ref(),
        show_warnings,
    ));
    Ok(0)
}

/// Plan or apply the VLAN across the fleet.
async fn cmd_reconcile(
    mut settings: Settings,
    vlan: &VlanArgs,
    overrides: RunOverrides,
    mode: RunMode,
    detailed: bool,
    formatter: &OutputFormatter,
) -> Result<u8> {
    overrides.apply(&mut settings);
    if mode == RunMode::Plan && settings.run.rename == RenameMode::Prompt {
        // Prompt mode runs one device at a time
        settings.run.workers = 1;
    }

    let inventory = Inventory::load(&settings.inventory)?;
    let validation = ConfigValidator::new().validate(&settings, Some(&inventory))?;
    for warning in &validation.warnings {
        warn!("{warning}");
    }

    // Validate the VLAN before asking for credentials or touching a device
    let desired = prompt_desired(vlan)?;
    let credentials = load_credentials()?;

    info!(
        "{} {desired} on {} devices ({} workers, rename {})",
        mode,
        inventory.len(),
        settings.run.workers,
        settings.run.rename
    );

    let cancel = cancel_on_ctrl_c();
    let reconciler = Reconciler::new(
        Arc::new(TelnetConnector::from_settings(&settings.session)),
        decision_for(settings.run.rename),
        credentials,
        &settings.session,
    )
    .with_workers(settings.run.workers)
    .with_mode(mode)
    .with_cancellation(cancel);

    let report = reconciler.reconcile(&inventory, &desired).await?;
    emit(&formatter.format_report(&report, detailed));

    Ok(report.exit_code())
}

/// Audit interfaces and optionally set a description.
async fn cmd_interfaces(
    settings: Settings,
    interface: Option<String>,
    description: Option<String>,
    formatter: &OutputFormatter,
) -> Result<u8> {
    let change = match (interface, description) {
        (Some(interface), Some(description)) => {
            Some(DescriptionChange::new(&interface, &description)?)
        }
        _ => None,
    };

    let inventory = Inventory::load(&settings.inventory)?;
    ConfigValidator::new().validate(&settings, Some(&inventory))?;
    let credentials = load_credentials()?;

    let audit = InterfaceAudit::new(
        Arc::new(TelnetConnector::from_settings(&settings.session)),
        credentials,
        &settings.session,
    )
    .with_cancellation(cancel_on_ctrl_c());

    let report = audit.run(&inventory, change).await?;
    emit(&formatter.format_interfaces(&report));

    Ok(report.exit_code())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Resolves settings from file, environment and the `--inventory` flag.
fn load_settings(config: Option<&Path>, inventory: Option<&Path>) -> Result<Settings> {
    let base = config
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let parser = ConfigParser::new().with_base_path(base);
    parser.load_dotenv()?;

    let mut settings = parser.resolve(config)?;
    ConfigParser::apply_env_overrides(&mut settings, ConfigParser::env_var)?;

    if let Some(path) = inventory {
        debug!("Overriding inventory from command line");
        settings.inventory = path.to_path_buf();
    }

    Ok(settings)
}

/// Builds the desired VLAN, prompting for whatever was not given.
fn prompt_desired(vlan: &VlanArgs) -> Result<DesiredVlan> {
    let id = match &vlan.vlan_id {
        Some(id) => id.clone(),
        None => prompt_text("VLAN ID")?,
    };
    let name = match &vlan.vlan_name {
        Some(name) => name.clone(),
        None => prompt_text("VLAN name")?,
    };

    Ok(DesiredVlan::parse(&id, &name)?)
}

/// Reads credentials from the environment, prompting for any that are missing.
fn load_credentials() -> Result<Credentials> {
    let username = match ConfigParser::env_var(USERNAME_ENV) {
        Some(username) => username,
        None => prompt_text("Username")?,
    };
    let password = match ConfigParser::env_var(PASSWORD_ENV) {
        Some(password) => password,
        None => prompt_secret("Password")?,
    };
    let secret = match ConfigParser::env_var(SECRET_ENV) {
        Some(secret) => secret,
        None => prompt_secret("Enable secret")?,
    };

    Ok(Credentials::new(username, password, secret))
}

fn prompt_text(label: &str) -> Result<String> {
    let value: String = Input::new()
        .with_prompt(label)
        .interact_text()
        .map_err(|e| ConfigError::prompt(label, e))?;
    Ok(value.trim().to_string())
}

fn prompt_secret(label: &str) -> Result<String> {
    rpassword::prompt_password(format!("{label}: "))
        .map_err(|e| ConfigError::prompt(label, e).into())
}

/// Returns a token cancelled on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; finishing the current device and skipping the rest");
            child.cancel();
        }
    });
    token
}

/// Writes command output to stdout.
fn emit(output: &str) {
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{output}").and_then(|()| stdout.flush()) {
        error!("Failed to write output: {e}");
    }
}
