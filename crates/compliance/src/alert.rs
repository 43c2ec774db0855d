//! Alert composition for flagged manifests.
//!
//! Only the message is built here; delivery belongs to the caller.

use std::fmt::Write;

use serde::Serialize;

use crate::config::AlertTone;
use crate::model::{CheckSummary, ComplianceFinding};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
    pub flagged: usize,
}

/// True when the number of flagged records reaches `threshold`.
pub fn should_alert(summary: &CheckSummary, threshold: usize) -> bool {
    summary.flagged > 0 && summary.flagged >= threshold
}

pub fn compose_alert(findings: &[ComplianceFinding], tone: AlertTone) -> AlertMessage {
    let flagged: Vec<&ComplianceFinding> = findings.iter().filter(|f| !f.is_compliant()).collect();
    let count = flagged.len();
    let noun = if count == 1 { "shipment" } else { "shipments" };

    let subject = match tone {
        AlertTone::Urgent => format!("[URGENT] {count} {noun} failed compliance checks"),
        _ => format!("{count} {noun} failed compliance checks"),
    };

    let mut body = String::new();
    match tone {
        AlertTone::Plain => {}
        AlertTone::Formal => {
            body.push_str("Please be advised that the following shipments require attention.\n\n");
        }
        AlertTone::Urgent => {
            body.push_str("URGENT: review the following shipments immediately.\n\n");
        }
    }

    let _ = writeln!(body, "{count} {noun} flagged for compliance review:");
    for f in &flagged {
        let tags: Vec<&str> = f.violations.iter().map(|v| v.tag()).collect();
        let _ = write!(body, "\n- Shipment {} (row {}): {}", f.label(), f.row, tags.join(", "));
        if let Some(ref detail) = f.detail {
            let _ = write!(body, " [{detail}]");
        }
    }
    body.push('\n');

    AlertMessage {
        subject,
        body,
        flagged: count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Violation;
    use crate::summary::compute_summary;

    fn findings() -> Vec<ComplianceFinding> {
        vec![
            ComplianceFinding {
                row: 1,
                shipment_id: Some("SH001".into()),
                violations: vec![Violation::DelayedStatus],
                detail: None,
            },
            ComplianceFinding {
                row: 2,
                shipment_id: Some("SH002".into()),
                violations: vec![],
                detail: None,
            },
            ComplianceFinding {
                row: 3,
                shipment_id: None,
                violations: vec![Violation::UnparseableRecord],
                detail: Some("expected 4 fields, found 2".into()),
            },
        ]
    }

    #[test]
    fn plain_alert_lists_flagged_shipments() {
        let msg = compose_alert(&findings(), AlertTone::Plain);
        assert_eq!(msg.flagged, 2);
        assert_eq!(msg.subject, "2 shipments failed compliance checks");
        assert!(msg.body.starts_with("2 shipments flagged"));
        assert!(msg.body.contains("- Shipment SH001 (row 1): delayed status"));
        assert!(msg.body.contains("- Shipment UNKNOWN (row 3): unparseable record [expected 4 fields, found 2]"));
        assert!(!msg.body.contains("SH002"));
    }

    #[test]
    fn tone_changes_framing() {
        let formal = compose_alert(&findings(), AlertTone::Formal);
        assert!(formal.body.starts_with("Please be advised"));

        let urgent = compose_alert(&findings()[..1], AlertTone::Urgent);
        assert_eq!(urgent.subject, "[URGENT] 1 shipment failed compliance checks");
        assert!(urgent.body.starts_with("URGENT:"));
    }

    #[test]
    fn threshold() {
        let summary = compute_summary(&findings());
        assert!(should_alert(&summary, 1));
        assert!(should_alert(&summary, 2));
        assert!(!should_alert(&summary, 3));

        let clean = compute_summary(&findings()[1..2]);
        assert!(!should_alert(&clean, 1));
    }
}
