//! `shipcheck check` - run the compliance rules over a manifest.

use std::path::{Path, PathBuf};

use clap::Args;
use shipcheck_compliance::alert::{compose_alert, should_alert, AlertMessage};
use shipcheck_compliance::config::CheckPolicy;
use shipcheck_compliance::CheckReport;
use shipcheck_config::Settings;
use shipcheck_io::LoadOptions;

use crate::carriers::resolve_carriers;
use crate::exit_codes::{EXIT_INPUT, EXIT_INVALID_POLICY, EXIT_VIOLATIONS};
use crate::CliError;

#[derive(Args)]
pub struct CheckArgs {
    /// Manifest file (.csv, .tsv, .txt, .xlsx, .xls, .xlsb, .ods)
    pub manifest: PathBuf,

    /// Check policy (.policy.toml); defaults to the settings policy, then the standard rules
    #[arg(long)]
    pub policy: Option<PathBuf>,

    /// Approved carrier list, overriding the policy and settings lists
    #[arg(long)]
    pub carriers: Option<PathBuf>,

    /// Worksheet to read from a workbook (default: first sheet)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Output the JSON report to stdout instead of the human summary
    #[arg(long)]
    pub json: bool,

    /// Write the JSON report to a file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Write the report as an Excel workbook
    #[arg(long)]
    pub xlsx: Option<PathBuf>,

    /// Write findings as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Write the alert message to a file when the alert threshold is reached
    #[arg(long)]
    pub alert_out: Option<PathBuf>,

    /// Exit 0 even when shipments are flagged
    #[arg(long)]
    pub no_fail: bool,
}

pub fn cmd_check(args: CheckArgs, settings: &Settings) -> Result<(), CliError> {
    let (policy, policy_dir) = load_policy(args.policy.as_deref(), settings)?;

    let (carriers, origin) =
        resolve_carriers(args.carriers.as_deref(), &policy, &policy_dir, settings)?;
    tracing::info!(count = carriers.len(), source = %origin, "approved carriers");
    if carriers.is_empty() {
        tracing::warn!(source = %origin, "approved carrier list is empty; every carrier will be flagged");
    }

    let options = LoadOptions {
        sheet: args.sheet.clone(),
        max_file_size_mb: Some(settings.max_file_size_mb),
    };
    let manifest = shipcheck_io::load_manifest(&args.manifest, &options)?;

    let report = shipcheck_compliance::run(&policy, &manifest, &carriers)?;

    // Outputs
    if let Some(ref path) = args.output {
        shipcheck_io::json::export(&report, path)?;
        eprintln!("wrote {}", path.display());
    }
    if let Some(ref path) = args.xlsx {
        shipcheck_io::xlsx::export_report(&report, &manifest, path)?;
        eprintln!("wrote {}", path.display());
    }
    if let Some(ref path) = args.csv {
        shipcheck_io::csv::export_findings(&report.findings, path)?;
        eprintln!("wrote {}", path.display());
    }

    if args.json {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    print_summary(&report);

    let threshold = policy.alert.threshold;
    if should_alert(&report.summary, threshold) {
        let alert = compose_alert(&report.findings, policy.alert.tone);
        match args.alert_out {
            Some(ref path) => {
                write_alert(&alert, path)?;
                eprintln!("alert: {} (wrote {})", alert.subject, path.display());
            }
            None => eprintln!("alert: {}", alert.subject),
        }
    }

    let flagged = report.summary.flagged;
    if flagged > 0 && !args.no_fail {
        let noun = if flagged == 1 { "shipment" } else { "shipments" };
        return Err(CliError::new(
            EXIT_VIOLATIONS,
            format!("{flagged} {noun} flagged"),
        ));
    }

    Ok(())
}

/// Read the policy named on the command line or in the settings. Returns the
/// directory relative paths in the policy resolve against.
fn load_policy(
    flag: Option<&Path>,
    settings: &Settings,
) -> Result<(CheckPolicy, PathBuf), CliError> {
    let Some(path) = flag.map(Path::to_path_buf).or_else(|| settings.policy_file.clone()) else {
        let mut policy = CheckPolicy::default();
        if let Some(threshold) = settings.alert_threshold {
            policy.alert.threshold = threshold.max(1);
        }
        return Ok((policy, PathBuf::from(".")));
    };

    let text = std::fs::read_to_string(&path).map_err(|e| {
        CliError::new(EXIT_INPUT, format!("cannot read policy {}: {e}", path.display()))
    })?;
    let policy = CheckPolicy::from_toml(&text).map_err(|e| {
        CliError::new(EXIT_INVALID_POLICY, format!("{}: {e}", path.display()))
            .with_hint(format!("run `shipcheck policy validate {}` for details", path.display()))
    })?;
    tracing::info!(path = %path.display(), name = %policy.name, "loaded policy");

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    Ok((policy, dir))
}

fn print_summary(report: &CheckReport) {
    let s = &report.summary;
    eprintln!(
        "{}: {} records - {} compliant, {} flagged ({} unparseable)",
        report.meta.policy_name, s.total_records, s.compliant, s.flagged, s.unparseable,
    );
    for (tag, count) in &s.violation_counts {
        eprintln!("  {tag}: {count}");
    }
}

fn write_alert(alert: &AlertMessage, path: &Path) -> Result<(), CliError> {
    let text = format!("Subject: {}\n\n{}", alert.subject, alert.body);
    std::fs::write(path, text)
        .map_err(|e| CliError::general(format!("cannot write {}: {e}", path.display())))
}
