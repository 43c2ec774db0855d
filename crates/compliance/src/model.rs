use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single manifest cell. Spreadsheet sources keep their cell type; CSV
/// sources only ever produce `Text` or `Empty`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    /// Spreadsheet error cell (`#N/A`, `#REF!`, ...).
    Error(String),
}

impl CellValue {
    /// True for empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Human-readable rendering used by exports and tallies.
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => format_number(*n),
            Self::Bool(b) => b.to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Error(e) => e.clone(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Text(_) => "text",
            Self::Number(_) => "number",
            Self::Bool(_) => "boolean",
            Self::Date(_) => "date",
            Self::Error(_) => "error",
        }
    }
}

/// Integral floats render without a fractional part (spreadsheets store
/// numeric identifiers as floats).
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

static EMPTY_CELL: CellValue = CellValue::Empty;

/// One manifest row.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentRecord {
    /// 1-based data row number (header excluded).
    pub row: usize,
    pub cells: Vec<CellValue>,
    /// Structural problem detected while parsing (e.g. wrong field count).
    pub defect: Option<String>,
}

impl ShipmentRecord {
    pub fn new(row: usize, cells: Vec<CellValue>) -> Self {
        Self { row, cells, defect: None }
    }

    pub fn with_defect(mut self, defect: impl Into<String>) -> Self {
        self.defect = Some(defect.into());
        self
    }

    /// Cell at `index`, or `Empty` past the end of a short row.
    pub fn cell(&self, index: usize) -> &CellValue {
        self.cells.get(index).unwrap_or(&EMPTY_CELL)
    }
}

/// A parsed manifest: ordered headers plus ordered records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    pub columns: Vec<String>,
    pub records: Vec<ShipmentRecord>,
}

impl Manifest {
    pub fn new(columns: Vec<String>, records: Vec<ShipmentRecord>) -> Self {
        Self { columns, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

/// Approved carrier names. Membership is case-insensitive and ignores
/// surrounding whitespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovedCarrierSet {
    normalized: BTreeSet<String>,
    names: Vec<String>,
}

impl ApprovedCarrierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for name in names {
            set.insert(name.as_ref());
        }
        set
    }

    /// Add a carrier. Returns false for blank names and duplicates.
    pub fn insert(&mut self, name: &str) -> bool {
        let key = normalize_carrier(name);
        if key.is_empty() || !self.normalized.insert(key) {
            return false;
        }
        self.names.push(name.trim().to_string());
        true
    }

    pub fn contains(&self, carrier: &str) -> bool {
        self.normalized.contains(&normalize_carrier(carrier))
    }

    pub fn len(&self) -> usize {
        self.normalized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    /// Names as first supplied (trimmed), in insertion order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl<S: AsRef<str>> FromIterator<S> for ApprovedCarrierSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_names(iter)
    }
}

pub fn normalize_carrier(name: &str) -> String {
    name.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Violation {
    #[serde(rename = "missing tracking ID")]
    MissingTrackingId,
    #[serde(rename = "missing carrier")]
    MissingCarrier,
    #[serde(rename = "unapproved carrier")]
    UnapprovedCarrier,
    #[serde(rename = "delayed status")]
    DelayedStatus,
    #[serde(rename = "overdue delivery")]
    OverdueDelivery,
    #[serde(rename = "unparseable record")]
    UnparseableRecord,
}

impl Violation {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::MissingTrackingId => "missing tracking ID",
            Self::MissingCarrier => "missing carrier",
            Self::UnapprovedCarrier => "unapproved carrier",
            Self::DelayedStatus => "delayed status",
            Self::OverdueDelivery => "overdue delivery",
            Self::UnparseableRecord => "unparseable record",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Compliance result for one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceFinding {
    pub row: usize,
    pub shipment_id: Option<String>,
    pub violations: Vec<Violation>,
    /// Why the record could not be evaluated (only with `unparseable record`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ComplianceFinding {
    pub fn is_compliant(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn has(&self, violation: Violation) -> bool {
        self.violations.contains(&violation)
    }

    /// Shipment identifier, or `UNKNOWN` when the row has none.
    pub fn label(&self) -> &str {
        self.shipment_id.as_deref().unwrap_or("UNKNOWN")
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckSummary {
    pub total_records: usize,
    pub compliant: usize,
    pub flagged: usize,
    pub unparseable: usize,
    pub violation_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckMeta {
    pub policy_name: String,
    pub engine_version: String,
    pub checked_at: String,
    pub approved_carriers: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub meta: CheckMeta,
    pub summary: CheckSummary,
    pub findings: Vec<ComplianceFinding>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carrier_set_ignores_case_and_whitespace() {
        let set = ApprovedCarrierSet::from_names(["Acme Logistics", "  FastShip "]);
        assert!(set.contains("ACME LOGISTICS"));
        assert!(set.contains("fastship"));
        assert!(set.contains("  Acme Logistics\t"));
        assert!(!set.contains("Acme"));
        assert_eq!(set.names(), &["Acme Logistics", "FastShip"]);
    }

    #[test]
    fn carrier_set_skips_blank_and_duplicate_names() {
        let mut set = ApprovedCarrierSet::new();
        assert!(set.insert("UPS"));
        assert!(!set.insert("ups "));
        assert!(!set.insert("   "));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn violation_serializes_as_tag() {
        let json = serde_json::to_string(&vec![
            Violation::MissingTrackingId,
            Violation::UnapprovedCarrier,
        ])
        .unwrap();
        assert_eq!(json, r#"["missing tracking ID","unapproved carrier"]"#);
    }

    #[test]
    fn cell_display_and_blankness() {
        assert!(CellValue::Text(" \t".into()).is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
        assert_eq!(CellValue::Number(12345.0).display(), "12345");
        assert_eq!(CellValue::Number(1.5).display(), "1.5");
        let d = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(CellValue::Date(d).display(), "2026-03-01");
    }

    #[test]
    fn short_row_reads_empty() {
        let rec = ShipmentRecord::new(1, vec![CellValue::Text("a".into())]);
        assert_eq!(rec.cell(5), &CellValue::Empty);
    }

    #[test]
    fn finding_label_falls_back_to_unknown() {
        let f = ComplianceFinding {
            row: 3,
            shipment_id: None,
            violations: vec![],
            detail: None,
        };
        assert_eq!(f.label(), "UNKNOWN");
        assert!(f.is_compliant());
    }
}
