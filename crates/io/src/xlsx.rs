// Spreadsheet manifest import (xlsx, xls, xlsb, ods) and report export (xlsx only)
//
// Import reads one sheet; the first row is the header.
// Export writes a presentation snapshot of a check: findings, summary, and
// the manifest as it was read.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{Days, NaiveDate};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use shipcheck_compliance::{CellValue, CheckReport, Manifest, ShipmentRecord};

use crate::error::IoError;

/// Import one sheet of a workbook as a manifest. `sheet` defaults to the first.
pub fn import(path: &Path, sheet: Option<&str>) -> Result<Manifest, IoError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| IoError::Workbook(format!("{}: {}", path.display(), e)))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|name| name.as_str() == wanted)
            .cloned()
            .ok_or_else(|| IoError::SheetNotFound {
                sheet: wanted.to_string(),
                available: sheet_names.clone(),
            })?,
        None => sheet_names.first().cloned().ok_or(IoError::NoSheets)?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IoError::Workbook(format!("failed to read sheet '{}': {}", sheet_name, e)))?;

    tracing::debug!(
        path = %path.display(),
        sheet = %sheet_name,
        rows = range.height(),
        cols = range.width(),
        "importing workbook manifest"
    );

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Manifest::default());
    };
    let columns: Vec<String> = header.iter().map(|c| header_text(c)).collect();

    let mut records = Vec::new();
    for (i, row) in rows.enumerate() {
        let cells: Vec<CellValue> = row.iter().map(convert_cell).collect();
        // Skip rows that are entirely empty
        if cells.iter().all(CellValue::is_blank) {
            continue;
        }
        records.push(ShipmentRecord::new(i + 1, cells));
    }

    Ok(Manifest::new(columns, records))
}

fn header_text(cell: &Data) -> String {
    convert_cell(cell).display().trim().to_string()
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(e) => CellValue::Error(e.to_string()),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            serial_to_date(serial).map_or(CellValue::Number(serial), CellValue::Date)
        }
        // ISO strings keep their text; the date rules parse the date part
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

/// Excel 1900-system serial to calendar date. The time of day is dropped.
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(Days::new(serial.floor() as u64))
}

// ============================================================================
// Export
// ============================================================================

const FINDINGS_HEADER: [&str; 5] = ["Row", "Shipment ID", "Compliant", "Violations", "Detail"];

/// Write `report` (and the manifest it was computed from) to an xlsx file
/// with sheets `Findings`, `Summary` and `Manifest`.
pub fn export_report(report: &CheckReport, manifest: &Manifest, path: &Path) -> Result<(), IoError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    write_findings_sheet(&mut workbook, report, &bold).map_err(|e| IoError::write(path, e))?;
    write_summary_sheet(&mut workbook, report, &bold).map_err(|e| IoError::write(path, e))?;
    write_manifest_sheet(&mut workbook, manifest, &bold).map_err(|e| IoError::write(path, e))?;

    workbook
        .save(path)
        .map_err(|e| IoError::write(path, format!("failed to save XLSX file: {e}")))?;
    Ok(())
}

fn write_findings_sheet(
    workbook: &mut Workbook,
    report: &CheckReport,
    bold: &Format,
) -> Result<(), XlsxError> {
    let worksheet = workbook.add_worksheet().set_name("Findings")?;
    write_header(worksheet, &FINDINGS_HEADER, bold)?;
    worksheet.set_freeze_panes(1, 0)?;
    worksheet.set_column_width(1, 16)?;
    worksheet.set_column_width(3, 40)?;

    for (i, f) in report.findings.iter().enumerate() {
        let row = (i + 1) as u32;
        let tags: Vec<&str> = f.violations.iter().map(|v| v.tag()).collect();
        worksheet.write_number(row, 0, f.row as f64)?;
        worksheet.write_string(row, 1, f.label())?;
        worksheet.write_string(row, 2, if f.is_compliant() { "yes" } else { "no" })?;
        worksheet.write_string(row, 3, tags.join(", "))?;
        if let Some(ref detail) = f.detail {
            worksheet.write_string(row, 4, detail)?;
        }
    }
    Ok(())
}

fn write_summary_sheet(
    workbook: &mut Workbook,
    report: &CheckReport,
    bold: &Format,
) -> Result<(), XlsxError> {
    let worksheet = workbook.add_worksheet().set_name("Summary")?;
    worksheet.set_column_width(0, 24)?;

    let summary = &report.summary;
    let counts: [(&str, usize); 4] = [
        ("Total records", summary.total_records),
        ("Compliant", summary.compliant),
        ("Flagged", summary.flagged),
        ("Unparseable", summary.unparseable),
    ];

    worksheet.write_string_with_format(0, 0, "Policy", bold)?;
    worksheet.write_string(0, 1, &report.meta.policy_name)?;
    worksheet.write_string_with_format(1, 0, "Checked at", bold)?;
    worksheet.write_string(1, 1, &report.meta.checked_at)?;

    let mut row = 3u32;
    for (label, value) in counts {
        worksheet.write_string_with_format(row, 0, label, bold)?;
        worksheet.write_number(row, 1, value as f64)?;
        row += 1;
    }

    row += 1;
    write_header_at(worksheet, row, &["Violation", "Count"], bold)?;
    for (tag, count) in &summary.violation_counts {
        row += 1;
        worksheet.write_string(row, 0, tag)?;
        worksheet.write_number(row, 1, *count as f64)?;
    }
    Ok(())
}

fn write_manifest_sheet(
    workbook: &mut Workbook,
    manifest: &Manifest,
    bold: &Format,
) -> Result<(), XlsxError> {
    let worksheet = workbook.add_worksheet().set_name("Manifest")?;
    let header: Vec<&str> = manifest.columns.iter().map(String::as_str).collect();
    write_header(worksheet, &header, bold)?;

    for (i, record) in manifest.records.iter().enumerate() {
        let row = (i + 1) as u32;
        for (col, cell) in record.cells.iter().enumerate() {
            let col = col as u16;
            match cell {
                CellValue::Empty => {}
                CellValue::Number(n) => {
                    worksheet.write_number(row, col, *n)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(row, col, *b)?;
                }
                other => {
                    worksheet.write_string(row, col, other.display())?;
                }
            }
        }
    }
    Ok(())
}

fn write_header(worksheet: &mut Worksheet, labels: &[&str], bold: &Format) -> Result<(), XlsxError> {
    write_header_at(worksheet, 0, labels, bold)
}

fn write_header_at(
    worksheet: &mut Worksheet,
    row: u32,
    labels: &[&str],
    bold: &Format,
) -> Result<(), XlsxError> {
    for (col, label) in labels.iter().enumerate() {
        worksheet.write_string_with_format(row, col as u16, *label, bold)?;
    }
    Ok(())
}
