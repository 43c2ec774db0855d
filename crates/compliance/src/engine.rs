use tracing::{debug, warn};

use crate::config::CheckPolicy;
use crate::error::ComplianceError;
use crate::model::{
    ApprovedCarrierSet, CellValue, CheckMeta, CheckReport, ComplianceFinding, Manifest,
    ShipmentRecord, Violation,
};
use crate::rules::{RecordView, RuleContext, RuleSet};
use crate::schema::ColumnMap;
use crate::summary::compute_summary;

/// Check every record against the standard policy.
pub fn check(
    manifest: &Manifest,
    carriers: &ApprovedCarrierSet,
) -> Result<Vec<ComplianceFinding>, ComplianceError> {
    check_with(manifest, carriers, &CheckPolicy::default())
}

/// Check every record against `policy`. Produces exactly one finding per
/// record, in input order.
pub fn check_with(
    manifest: &Manifest,
    carriers: &ApprovedCarrierSet,
    policy: &CheckPolicy,
) -> Result<Vec<ComplianceFinding>, ComplianceError> {
    if manifest.records.is_empty() {
        return Ok(Vec::new());
    }

    let columns = ColumnMap::resolve(&manifest.columns, &policy.columns)?;
    let rules = RuleSet::from_config(&policy.rules);
    let ctx = RuleContext {
        carriers,
        delayed_keywords: &policy.rules.delayed_keywords,
        completed_keywords: &policy.rules.completed_keywords,
        as_of: policy.rules.as_of,
    };

    debug!(
        records = manifest.records.len(),
        rules = rules.rules().len(),
        carriers = carriers.len(),
        "checking manifest"
    );

    let findings: Vec<ComplianceFinding> = manifest
        .records
        .iter()
        .map(|record| evaluate_record(record, &columns, &rules, &ctx))
        .collect();

    Ok(findings)
}

fn evaluate_record(
    record: &ShipmentRecord,
    columns: &ColumnMap,
    rules: &RuleSet,
    ctx: &RuleContext<'_>,
) -> ComplianceFinding {
    let view = match &record.defect {
        Some(defect) => Err(defect.clone()),
        None => RecordView::extract(record, columns, rules),
    };

    match view {
        Ok(view) => ComplianceFinding {
            row: record.row,
            violations: rules.evaluate(&view, ctx),
            shipment_id: view.shipment_id,
            detail: None,
        },
        Err(detail) => {
            warn!(row = record.row, %detail, "unparseable record");
            ComplianceFinding {
                row: record.row,
                shipment_id: RecordView::shipment_id_of(record, columns),
                violations: vec![Violation::UnparseableRecord],
                detail: Some(detail),
            }
        }
    }
}

/// Check per policy and wrap the findings with metadata and a summary.
pub fn run(
    policy: &CheckPolicy,
    manifest: &Manifest,
    carriers: &ApprovedCarrierSet,
) -> Result<CheckReport, ComplianceError> {
    let findings = check_with(manifest, carriers, policy)?;
    let summary = compute_summary(&findings);

    Ok(CheckReport {
        meta: CheckMeta {
            policy_name: policy.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            checked_at: chrono::Utc::now().to_rfc3339(),
            approved_carriers: carriers.len(),
        },
        summary,
        findings,
    })
}

/// Parse CSV text into a manifest. The first row is the header.
///
/// Rows whose field count differs from the header are kept (padded or
/// truncated) and marked with a defect so the check reports them instead of
/// dropping them. Blank lines are skipped; rows of empty fields are kept.
pub fn parse_csv_manifest(csv_data: &str, delimiter: u8) -> Result<Manifest, ComplianceError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| ComplianceError::Csv(e.to_string()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let width = columns.len();
    let mut records = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let row = i + 1;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                // Invalid UTF-8 and similar: keep the row so it is reported
                records.push(
                    ShipmentRecord::new(row, vec![CellValue::Empty; width])
                        .with_defect(format!("row {row}: {e}")),
                );
                continue;
            }
        };

        // A whitespace-only line is not a record. A line of empty delimited
        // fields (`,,,`) is, and gets checked like any other row.
        if record.len() <= 1 && record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let mut cells: Vec<CellValue> = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(field.to_string())
                }
            })
            .collect();

        let found = cells.len();
        cells.resize(width, CellValue::Empty);
        let mut rec = ShipmentRecord::new(row, cells);
        if found != width {
            rec = rec.with_defect(format!("expected {width} fields, found {found}"));
        }
        records.push(rec);
    }

    Ok(Manifest::new(columns, records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_csv_basic() {
        let csv = "\
shipment_id,carrier,tracking_id,status
1,FastShip,,in-transit
2,UnknownCo,TRK123,delivered
";
        let manifest = parse_csv_manifest(csv, b',').unwrap();
        assert_eq!(manifest.columns, vec!["shipment_id", "carrier", "tracking_id", "status"]);
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.records[0].row, 1);
        assert_eq!(manifest.records[0].cells[2], CellValue::Empty);
        assert_eq!(manifest.records[1].cells[2], CellValue::Text("TRK123".into()));
        assert!(manifest.records.iter().all(|r| r.defect.is_none()));
    }

    #[test]
    fn parse_csv_marks_ragged_rows() {
        let csv = "id,carrier,tracking,status\nA,UPS,T1\nB,UPS,T2,ok,extra\n";
        let manifest = parse_csv_manifest(csv, b',').unwrap();
        assert_eq!(manifest.records[0].defect.as_deref(), Some("expected 4 fields, found 3"));
        assert_eq!(manifest.records[1].defect.as_deref(), Some("expected 4 fields, found 5"));
        assert_eq!(manifest.records[1].cells.len(), 4);
    }

    #[test]
    fn parse_csv_skips_blank_lines_and_bom() {
        let csv = "\u{feff}id,carrier,tracking,status\n\nA,UPS,T1,ok\n   \n";
        let manifest = parse_csv_manifest(csv, b',').unwrap();
        assert_eq!(manifest.columns[0], "id");
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.records[0].cells[0], CellValue::Text("A".into()));
    }

    #[test]
    fn empty_field_rows_are_checked() {
        let csv = "id,carrier,tracking,status\nA,UPS,T1,ok\n,,,\nC,UPS,T3,ok\n";
        let manifest = parse_csv_manifest(csv, b',').unwrap();
        assert_eq!(manifest.len(), 3);
        assert_eq!(manifest.records[1].row, 2);
        assert!(manifest.records[1].defect.is_none());

        let carriers = ApprovedCarrierSet::from_names(["UPS"]);
        let findings = check(&manifest, &carriers).unwrap();
        assert_eq!(findings[1].shipment_id, None);
        assert_eq!(
            findings[1].violations,
            vec![Violation::MissingTrackingId, Violation::MissingCarrier]
        );
        assert_eq!(findings[2].row, 3);
    }

    #[test]
    fn worked_example() {
        let csv = "\
id,carrier,tracking,status
1,FastShip,,in-transit
2,UnknownCo,TRK123,delivered
";
        let manifest = parse_csv_manifest(csv, b',').unwrap();
        let carriers = ApprovedCarrierSet::from_names(["FastShip"]);
        let findings = check(&manifest, &carriers).unwrap();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].shipment_id.as_deref(), Some("1"));
        assert_eq!(findings[0].violations, vec![Violation::MissingTrackingId]);
        assert_eq!(findings[1].shipment_id.as_deref(), Some("2"));
        assert_eq!(findings[1].violations, vec![Violation::UnapprovedCarrier]);
    }

    #[test]
    fn empty_manifest_is_not_an_error() {
        let carriers = ApprovedCarrierSet::from_names(["UPS"]);
        assert!(check(&Manifest::default(), &carriers).unwrap().is_empty());

        let headers_only = parse_csv_manifest("a,b\n", b',').unwrap();
        assert!(check(&headers_only, &carriers).unwrap().is_empty());
    }

    #[test]
    fn ragged_row_becomes_unparseable_finding() {
        let csv = "id,carrier,tracking,status\nA,UPS,T1,ok\nB,UPS\nC,UPS,T3,ok\n";
        let manifest = parse_csv_manifest(csv, b',').unwrap();
        let carriers = ApprovedCarrierSet::from_names(["UPS"]);
        let findings = check(&manifest, &carriers).unwrap();
        assert_eq!(findings.len(), 3);
        assert!(findings[0].is_compliant());
        assert_eq!(findings[1].violations, vec![Violation::UnparseableRecord]);
        assert_eq!(findings[1].shipment_id.as_deref(), Some("B"));
        assert!(findings[1].detail.as_deref().unwrap().contains("found 2"));
        assert!(findings[2].is_compliant());
    }

    #[test]
    fn standard_policy_ignores_delayed_status() {
        let csv = "id,carrier,tracking,status\n1,FastShip,TRK1,Delayed\n";
        let manifest = parse_csv_manifest(csv, b',').unwrap();
        let carriers = ApprovedCarrierSet::from_names(["FastShip"]);
        let findings = check(&manifest, &carriers).unwrap();
        assert!(findings[0].violations.is_empty());

        let mut policy = CheckPolicy::default();
        policy.rules.delayed_status = true;
        let findings = check_with(&manifest, &carriers, &policy).unwrap();
        assert_eq!(findings[0].violations, vec![Violation::DelayedStatus]);
    }

    #[test]
    fn unread_date_column_does_not_hide_violations() {
        let csv = "id,carrier,tracking,status,eta\n1,FastShip,,In Transit,TBD\n";
        let manifest = parse_csv_manifest(csv, b',').unwrap();
        let carriers = ApprovedCarrierSet::from_names(["FastShip"]);
        let findings = check(&manifest, &carriers).unwrap();
        assert_eq!(findings[0].violations, vec![Violation::MissingTrackingId]);
        assert_eq!(findings[0].detail, None);

        // Only a policy that reads the date treats it as unparseable
        let mut policy = CheckPolicy::default();
        policy.rules.overdue_delivery = true;
        policy.rules.as_of = chrono::NaiveDate::from_ymd_opt(2026, 1, 31);
        let findings = check_with(&manifest, &carriers, &policy).unwrap();
        assert_eq!(findings[0].violations, vec![Violation::UnparseableRecord]);
        assert_eq!(findings[0].detail.as_deref(), Some("delivery_date: cannot parse date 'TBD'"));
    }

    #[test]
    fn run_fills_meta_and_summary() {
        let csv = "id,carrier,tracking,status\n1,UPS,T1,ok\n2,,T2,Delayed\n";
        let manifest = parse_csv_manifest(csv, b',').unwrap();
        let carriers = ApprovedCarrierSet::from_names(["UPS", "DHL"]);
        let report = run(&CheckPolicy::default(), &manifest, &carriers).unwrap();
        assert_eq!(report.meta.policy_name, "standard");
        assert_eq!(report.meta.approved_carriers, 2);
        assert_eq!(report.summary.total_records, 2);
        assert_eq!(report.summary.flagged, 1);
        assert_eq!(report.findings[1].violations, vec![Violation::MissingCarrier]);
    }
}
