use std::collections::BTreeMap;

use crate::model::{CheckSummary, ComplianceFinding, Violation};

/// Compute summary statistics from findings.
pub fn compute_summary(findings: &[ComplianceFinding]) -> CheckSummary {
    let mut violation_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut compliant = 0;
    let mut unparseable = 0;

    for f in findings {
        if f.is_compliant() {
            compliant += 1;
        }
        if f.has(Violation::UnparseableRecord) {
            unparseable += 1;
        }
        for v in &f.violations {
            *violation_counts.entry(v.tag().to_string()).or_insert(0) += 1;
        }
    }

    CheckSummary {
        total_records: findings.len(),
        compliant,
        flagged: findings.len() - compliant,
        unparseable,
        violation_counts,
    }
}
