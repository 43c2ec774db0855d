// shipcheck CLI - manifest compliance checks from the command line

mod carriers;
mod check;
mod dashboard;
mod exit_codes;
mod policy;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use shipcheck_compliance::ComplianceError;
use shipcheck_config::{Settings, SettingsError};
use shipcheck_io::IoError;
use tracing_subscriber::EnvFilter;

use exit_codes::{
    compliance_exit_code, io_exit_code, settings_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE,
};

/// Environment variable holding the `tracing` filter.
const ENV_LOG: &str = "SHIPCHECK_LOG";

#[derive(Parser)]
#[command(name = "shipcheck")]
#[command(about = "Check shipment manifests against carrier and tracking rules")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a manifest and report one finding per shipment
    #[command(after_help = "\
Examples:
  shipcheck check manifest.csv
  shipcheck check manifest.xlsx --sheet Outbound --json
  shipcheck check manifest.csv --policy weekly.policy.toml --output report.json
  shipcheck check manifest.csv --carriers approved.txt --xlsx report.xlsx

Exit codes: 0 all compliant, 3 shipments flagged, 4 missing column,
5 invalid policy, 6 unreadable input.")]
    Check(check::CheckArgs),

    /// Show shipment status and carrier tallies for a manifest
    #[command(after_help = "\
Examples:
  shipcheck dashboard manifest.csv
  shipcheck dashboard manifest.xlsx --json")]
    Dashboard(dashboard::DashboardArgs),

    /// Manage the approved carrier list
    #[command(subcommand)]
    Carriers(carriers::CarrierCommands),

    /// Validate or scaffold check policies
    #[command(subcommand)]
    Policy(policy::PolicyCommands),
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  shipcheck-compliance ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

/// Install the stderr subscriber. `SHIPCHECK_LOG` wins over the settings
/// filter; both fall back to `warn`. An unparseable `SHIPCHECK_LOG` is a usage
/// error, an unparseable settings filter only a warning.
fn init_logging(settings_filter: Option<&str>) -> Result<(), CliError> {
    let mut bad_setting = None;
    let filter = match std::env::var(ENV_LOG) {
        Ok(value) if !value.trim().is_empty() => EnvFilter::try_new(&value).map_err(|e| {
            CliError::usage(format!("{ENV_LOG}={value:?} is not valid: {e}"))
                .with_hint("use a tracing filter such as `info` or `shipcheck_io=debug`")
        })?,
        _ => match settings_filter.map(EnvFilter::try_new) {
            Some(Ok(filter)) => filter,
            Some(Err(e)) => {
                bad_setting = Some(e.to_string());
                EnvFilter::new("warn")
            }
            None => EnvFilter::new("warn"),
        },
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Some(error) = bad_setting {
        tracing::warn!(%error, "ignoring invalid log.filter setting");
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = Settings::load();
    if let Err(err) = init_logging(settings.as_ref().ok().and_then(|s| s.log_filter.as_deref())) {
        return report(err);
    }

    let result = match cli.command {
        // Policy commands work without user settings
        Commands::Policy(cmd) => policy::cmd_policy(cmd),
        command => settings
            .map_err(CliError::from)
            .and_then(|settings| run(command, &settings)),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(err) => report(err),
    }
}

fn report(CliError { code, message, hint }: CliError) -> ExitCode {
    if !message.is_empty() {
        eprintln!("error: {}", message);
    }
    if let Some(hint) = hint {
        eprintln!("hint:  {}", hint);
    }
    ExitCode::from(code)
}

fn run(command: Commands, settings: &Settings) -> Result<(), CliError> {
    match command {
        Commands::Check(args) => check::cmd_check(args, settings),
        Commands::Dashboard(args) => dashboard::cmd_dashboard(args, settings),
        Commands::Carriers(cmd) => carriers::cmd_carriers(cmd, settings),
        Commands::Policy(cmd) => policy::cmd_policy(cmd),
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ComplianceError> for CliError {
    fn from(err: ComplianceError) -> Self {
        let code = compliance_exit_code(&err);
        let hint = match &err {
            ComplianceError::SchemaMismatch { field, .. } => Some(format!(
                "map the column in the policy, e.g. [columns] {field} = \"<header>\""
            )),
            ComplianceError::UnknownColumn { .. } => {
                Some("column overrides must match a manifest header exactly".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::Manifest(inner) => inner.into(),
            other => {
                let code = io_exit_code(&other);
                let hint = match &other {
                    IoError::TooLarge { .. } => {
                        Some(format!("raise the limit with {}", shipcheck_config::settings::ENV_MAX_FILE_SIZE_MB))
                    }
                    IoError::UnsupportedFormat { .. } => {
                        Some("export the manifest as CSV or XLSX".to_string())
                    }
                    _ => None,
                };
                Self { code, message: other.to_string(), hint }
            }
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        let code = settings_exit_code(&err);
        let hint = match &err {
            SettingsError::Parse { .. } => Some(format!(
                "fix or remove the settings file ({} overrides its directory)",
                shipcheck_config::settings::ENV_CONFIG_DIR
            )),
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }
}
