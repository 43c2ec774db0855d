//! Per-record compliance rules.
//!
//! A rule is a pure predicate over one record paired with the violation it
//! yields. `RuleSet` keeps them in a fixed order so the tags in a finding are
//! always listed the same way.

use chrono::NaiveDate;

use crate::config::RulesConfig;
use crate::model::{ApprovedCarrierSet, CellValue, ShipmentRecord, Violation};
use crate::schema::{ColumnMap, Field};

/// Date layouts accepted in text cells.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%d-%b-%Y"];

// ---------------------------------------------------------------------------
// Record view
// ---------------------------------------------------------------------------

/// The typed fields a rule can look at. Blank values are `None`, and so are
/// fields that no rule in the set reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordView {
    pub shipment_id: Option<String>,
    pub carrier: Option<String>,
    pub tracking_id: Option<String>,
    pub status: Option<String>,
    pub delivery_date: Option<NaiveDate>,
}

impl RecordView {
    /// Read the fields `rules` look at out of `record`. Fails with a message
    /// when one of those cells holds a value of the wrong type for its field.
    /// Cells the rules never read are not inspected.
    pub fn extract(
        record: &ShipmentRecord,
        columns: &ColumnMap,
        rules: &RuleSet,
    ) -> Result<Self, String> {
        let cell = |field: Field| {
            if rules.reads(field) {
                columns.get(field).map(|idx| record.cell(idx))
            } else {
                None
            }
        };

        Ok(Self {
            shipment_id: Self::shipment_id_of(record, columns),
            carrier: text(cell(Field::Carrier), Field::Carrier)?,
            tracking_id: identifier(cell(Field::TrackingId), Field::TrackingId)?,
            status: text(cell(Field::Status), Field::Status)?,
            delivery_date: date(cell(Field::DeliveryDate), Field::DeliveryDate)?,
        })
    }

    /// Best-effort shipment identifier. Only labels the finding, so a cell of
    /// an unexpected type yields `None` instead of an error.
    pub fn shipment_id_of(record: &ShipmentRecord, columns: &ColumnMap) -> Option<String> {
        let cell = columns.get(Field::ShipmentId).map(|idx| record.cell(idx));
        identifier(cell, Field::ShipmentId).ok().flatten()
    }
}

fn wrong_type(field: Field, cell: &CellValue) -> String {
    format!("{field}: unexpected {} value '{}'", cell.type_name(), cell.display())
}

/// Identifiers accept text and numbers (spreadsheets store numeric IDs as floats).
fn identifier(cell: Option<&CellValue>, field: Field) -> Result<Option<String>, String> {
    match cell {
        None | Some(CellValue::Empty) => Ok(None),
        Some(CellValue::Text(s)) => Ok(non_blank(s)),
        Some(c @ CellValue::Number(n)) if n.is_finite() => Ok(Some(c.display())),
        Some(other) => Err(wrong_type(field, other)),
    }
}

fn text(cell: Option<&CellValue>, field: Field) -> Result<Option<String>, String> {
    match cell {
        None | Some(CellValue::Empty) => Ok(None),
        Some(CellValue::Text(s)) => Ok(non_blank(s)),
        Some(other) => Err(wrong_type(field, other)),
    }
}

fn date(cell: Option<&CellValue>, field: Field) -> Result<Option<NaiveDate>, String> {
    match cell {
        None | Some(CellValue::Empty) => Ok(None),
        Some(CellValue::Date(d)) => Ok(Some(*d)),
        Some(CellValue::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            parse_date(s)
                .map(Some)
                .ok_or_else(|| format!("{field}: cannot parse date '{s}'"))
        }
        Some(other) => Err(wrong_type(field, other)),
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    // Accept a trailing time component ("2026-01-31 14:00" / "2026-01-31T14:00:00")
    let date_part = s.split(['T', ' ']).next().unwrap_or(s);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        .or_else(|| DATE_FORMATS.iter().find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok()))
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Reference data and thresholds shared by every rule in one check.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub carriers: &'a ApprovedCarrierSet,
    pub delayed_keywords: &'a [String],
    pub completed_keywords: &'a [String],
    pub as_of: Option<NaiveDate>,
}

pub type Predicate = fn(&RecordView, &RuleContext<'_>) -> bool;

#[derive(Clone, Copy)]
pub struct Rule {
    pub violation: Violation,
    /// Fields the predicate looks at.
    pub reads: &'static [Field],
    pub predicate: Predicate,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("violation", &self.violation)
            .field("reads", &self.reads)
            .finish()
    }
}

impl Rule {
    pub const fn new(violation: Violation, reads: &'static [Field], predicate: Predicate) -> Self {
        Self { violation, reads, predicate }
    }
}

fn missing_tracking_id(view: &RecordView, _: &RuleContext<'_>) -> bool {
    view.tracking_id.is_none()
}

fn missing_carrier(view: &RecordView, _: &RuleContext<'_>) -> bool {
    view.carrier.is_none()
}

fn unapproved_carrier(view: &RecordView, ctx: &RuleContext<'_>) -> bool {
    match &view.carrier {
        Some(carrier) => !ctx.carriers.contains(carrier),
        None => false,
    }
}

fn delayed_status(view: &RecordView, ctx: &RuleContext<'_>) -> bool {
    view.status
        .as_deref()
        .is_some_and(|status| contains_keyword(status, ctx.delayed_keywords))
}

fn overdue_delivery(view: &RecordView, ctx: &RuleContext<'_>) -> bool {
    let (Some(as_of), Some(due)) = (ctx.as_of, view.delivery_date) else {
        return false;
    };
    let completed = view
        .status
        .as_deref()
        .is_some_and(|status| contains_keyword(status, ctx.completed_keywords));
    due < as_of && !completed
}

fn contains_keyword(value: &str, keywords: &[String]) -> bool {
    let value = value.to_lowercase();
    keywords.iter().any(|k| {
        let k = k.trim().to_lowercase();
        !k.is_empty() && value.contains(&k)
    })
}

pub const MISSING_TRACKING_ID: Rule =
    Rule::new(Violation::MissingTrackingId, &[Field::TrackingId], missing_tracking_id);
pub const MISSING_CARRIER: Rule =
    Rule::new(Violation::MissingCarrier, &[Field::Carrier], missing_carrier);
pub const UNAPPROVED_CARRIER: Rule =
    Rule::new(Violation::UnapprovedCarrier, &[Field::Carrier], unapproved_carrier);
pub const DELAYED_STATUS: Rule =
    Rule::new(Violation::DelayedStatus, &[Field::Status], delayed_status);
pub const OVERDUE_DELIVERY: Rule = Rule::new(
    Violation::OverdueDelivery,
    &[Field::DeliveryDate, Field::Status],
    overdue_delivery,
);

/// Ordered list of rules applied to every record.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Rules enabled by `config`, in canonical order.
    pub fn from_config(config: &RulesConfig) -> Self {
        let mut rules = Vec::new();
        if config.missing_tracking_id {
            rules.push(MISSING_TRACKING_ID);
        }
        if config.carrier {
            rules.push(MISSING_CARRIER);
            rules.push(UNAPPROVED_CARRIER);
        }
        if config.delayed_status {
            rules.push(DELAYED_STATUS);
        }
        if config.overdue_delivery {
            rules.push(OVERDUE_DELIVERY);
        }
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// True when some rule in the set looks at `field`.
    pub fn reads(&self, field: Field) -> bool {
        self.rules.iter().any(|rule| rule.reads.contains(&field))
    }

    pub fn evaluate(&self, view: &RecordView, ctx: &RuleContext<'_>) -> Vec<Violation> {
        self.rules
            .iter()
            .filter(|rule| (rule.predicate)(view, ctx))
            .map(|rule| rule.violation)
            .collect()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::from_config(&RulesConfig::default())
    }
}
