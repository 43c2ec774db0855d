//! `shipcheck policy` - validate and scaffold check policies.

use std::path::PathBuf;

use clap::Subcommand;
use shipcheck_compliance::config::CheckPolicy;
use shipcheck_compliance::rules::RuleSet;

use crate::exit_codes::{EXIT_INPUT, EXIT_INVALID_POLICY};
use crate::CliError;

/// Comment block written above the standard policy by `shipcheck policy init`.
const POLICY_HEADER: &str = "\
# shipcheck policy. Every section is optional.
#
# [carriers] file = \"approved_carriers.json\" merges a list file, relative to this file.
# [columns]  maps fields to headers the aliases miss, e.g. tracking_id = \"AWB Number\".
# [rules]    delayed_status and overdue_delivery (needs as_of) are opt-in.
# [alert]    tone is plain, formal or urgent.

";

/// The standard policy as TOML, ready to edit.
pub fn starter_policy() -> Result<String, CliError> {
    let body = CheckPolicy::default()
        .to_toml()
        .map_err(|e| CliError::general(format!("cannot render policy: {e}")))?;
    Ok(format!("{POLICY_HEADER}{body}"))
}

#[derive(Subcommand)]
pub enum PolicyCommands {
    /// Validate a policy file without running a check
    #[command(after_help = "\
Examples:
  shipcheck policy validate weekly.policy.toml")]
    Validate {
        /// Path to the .policy.toml file
        policy: PathBuf,
    },

    /// Write a starter policy file
    #[command(after_help = "\
Examples:
  shipcheck policy init
  shipcheck policy init audit.policy.toml --force")]
    Init {
        /// Destination path
        #[arg(default_value = "shipcheck.policy.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn cmd_policy(cmd: PolicyCommands) -> Result<(), CliError> {
    match cmd {
        PolicyCommands::Validate { policy } => cmd_policy_validate(policy),
        PolicyCommands::Init { path, force } => cmd_policy_init(path, force),
    }
}

fn cmd_policy_validate(path: PathBuf) -> Result<(), CliError> {
    let text = std::fs::read_to_string(&path).map_err(|e| {
        CliError::new(EXIT_INPUT, format!("cannot read policy {}: {e}", path.display()))
    })?;
    let policy = CheckPolicy::from_toml(&text)
        .map_err(|e| CliError::new(EXIT_INVALID_POLICY, format!("{}: {e}", path.display())))?;

    let rules = RuleSet::from_config(&policy.rules);
    let tags: Vec<&str> = rules.rules().iter().map(|r| r.violation.tag()).collect();
    eprintln!("ok: policy '{}'", policy.name);
    eprintln!("  rules: {}", tags.join(", "));
    if !policy.carriers.approved.is_empty() {
        eprintln!("  inline carriers: {}", policy.carriers.approved.len());
    }
    if let Some(ref file) = policy.carriers.file {
        eprintln!("  carrier file: {file}");
    }
    Ok(())
}

fn cmd_policy_init(path: PathBuf, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::usage(format!("{} already exists", path.display()))
            .with_hint("pass --force to overwrite"));
    }
    let text = starter_policy()?;
    std::fs::write(&path, text)
        .map_err(|e| CliError::general(format!("cannot write {}: {e}", path.display())))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}
