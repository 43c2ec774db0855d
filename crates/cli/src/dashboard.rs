//! `shipcheck dashboard` - manifest-level tallies.

use std::path::PathBuf;

use clap::Args;
use shipcheck_compliance::config::CheckPolicy;
use shipcheck_compliance::dashboard::{compute_metrics, ManifestMetrics, Tally, TimelineEntry};
use shipcheck_compliance::schema::ColumnMap;
use shipcheck_config::Settings;
use shipcheck_io::LoadOptions;

use crate::exit_codes::{EXIT_INPUT, EXIT_INVALID_POLICY};
use crate::CliError;

#[derive(Args)]
pub struct DashboardArgs {
    /// Manifest file (.csv, .tsv, .txt, .xlsx, .xls, .xlsb, .ods)
    pub manifest: PathBuf,

    /// Policy whose [columns] overrides should be applied
    #[arg(long)]
    pub policy: Option<PathBuf>,

    /// Worksheet to read from a workbook (default: first sheet)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Output JSON to stdout instead of tables
    #[arg(long)]
    pub json: bool,
}

pub fn cmd_dashboard(args: DashboardArgs, settings: &Settings) -> Result<(), CliError> {
    let policy = match args.policy {
        Some(ref path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                CliError::new(EXIT_INPUT, format!("cannot read policy {}: {e}", path.display()))
            })?;
            CheckPolicy::from_toml(&text)
                .map_err(|e| CliError::new(EXIT_INVALID_POLICY, format!("{}: {e}", path.display())))?
        }
        None => CheckPolicy::default(),
    };

    let options = LoadOptions {
        sheet: args.sheet.clone(),
        max_file_size_mb: Some(settings.max_file_size_mb),
    };
    let manifest = shipcheck_io::load_manifest(&args.manifest, &options)?;
    let columns = ColumnMap::detect(&manifest.columns, &policy.columns)?;
    let metrics = compute_metrics(&manifest, &columns);

    if args.json {
        let json_str = serde_json::to_string_pretty(&metrics)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        print!("{}", render(&metrics));
    }
    Ok(())
}

fn render(m: &ManifestMetrics) -> String {
    let mut out = String::new();
    out.push_str(&format!("Total shipments  {}\n", m.total_shipments));
    out.push_str(&format!("Delayed          {} ({:.1}%)\n", m.delayed, m.delayed_percent));
    out.push_str(&format!("In transit       {}\n", m.in_transit));
    out.push_str(&format!("Completed        {}\n", m.completed));
    if let Some(ref t) = m.transit {
        out.push_str(&format!(
            "Transit days     avg {:.1}, shortest {}, longest {}\n",
            t.average_days, t.shortest_days, t.longest_days
        ));
    }
    render_table(&mut out, "Status", &m.status_counts);
    render_table(&mut out, "Top carriers", &m.top_carriers);
    if m.delayed > 0 {
        render_table(&mut out, "Delays by carrier", &m.delays_by_carrier);
    }
    if !m.timeline.is_empty() || m.unparsed_dates > 0 {
        render_timeline(&mut out, &m.timeline, m.unparsed_dates);
    }
    out
}

fn render_timeline(out: &mut String, entries: &[TimelineEntry], unparsed: usize) {
    out.push_str("\nTimeline\n");
    let labels: Vec<String> = entries
        .iter()
        .map(|e| e.shipment_id.clone().unwrap_or_else(|| format!("row {}", e.row)))
        .collect();
    let width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    for (label, e) in labels.iter().zip(entries) {
        out.push_str(&format!(
            "  {:<width$}  {} -> {}  {:>3}d",
            label, e.departure, e.arrival, e.transit_days, width = width
        ));
        if let (Some(from), Some(to)) = (&e.origin, &e.destination) {
            out.push_str(&format!("  {from} -> {to}"));
        }
        out.push('\n');
    }
    if unparsed > 0 {
        out.push_str(&format!("  ({unparsed} rows with unreadable dates)\n"));
    }
}

fn render_table(out: &mut String, title: &str, rows: &[Tally]) {
    out.push('\n');
    out.push_str(title);
    out.push('\n');
    if rows.is_empty() {
        out.push_str("  (none)\n");
        return;
    }
    let width = rows.iter().map(|t| t.label.chars().count()).max().unwrap_or(0);
    for t in rows {
        out.push_str(&format!("  {:<width$}  {}\n", t.label, t.count, width = width));
    }
}
