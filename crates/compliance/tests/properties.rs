use proptest::prelude::*;

use shipcheck_compliance::engine::check;
use shipcheck_compliance::{ApprovedCarrierSet, CellValue, Manifest, ShipmentRecord, Violation};

fn columns() -> Vec<String> {
    ["id", "carrier", "tracking", "status"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn cell() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        Just(CellValue::Empty),
        "[ A-Za-z0-9-]{0,12}".prop_map(CellValue::Text),
        (0u32..100_000).prop_map(|n| CellValue::Number(n as f64)),
        any::<bool>().prop_map(CellValue::Bool),
    ]
}

fn manifest() -> impl Strategy<Value = Manifest> {
    prop::collection::vec(prop::collection::vec(cell(), 4), 0..40).prop_map(|rows| {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, cells)| ShipmentRecord::new(i + 1, cells))
            .collect();
        Manifest::new(columns(), records)
    })
}

fn carriers() -> ApprovedCarrierSet {
    ApprovedCarrierSet::from_names(["FastShip", "UPS", "a"])
}

proptest! {
    #[test]
    fn one_finding_per_record_in_order(manifest in manifest()) {
        let findings = check(&manifest, &carriers()).unwrap();
        prop_assert_eq!(findings.len(), manifest.len());
        for (finding, record) in findings.iter().zip(&manifest.records) {
            prop_assert_eq!(finding.row, record.row);
        }
    }

    #[test]
    fn check_is_deterministic(manifest in manifest()) {
        let first = check(&manifest, &carriers()).unwrap();
        let second = check(&manifest, &carriers()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn unparseable_excludes_other_violations(manifest in manifest()) {
        for finding in check(&manifest, &carriers()).unwrap() {
            if finding.has(Violation::UnparseableRecord) {
                prop_assert_eq!(finding.violations.len(), 1);
                prop_assert!(finding.detail.is_some());
            } else {
                prop_assert!(finding.detail.is_none());
            }
        }
    }

    #[test]
    fn carrier_violations_are_exclusive(manifest in manifest()) {
        for finding in check(&manifest, &carriers()).unwrap() {
            prop_assert!(
                !(finding.has(Violation::MissingCarrier) && finding.has(Violation::UnapprovedCarrier))
            );
        }
    }

    #[test]
    fn blank_tracking_is_flagged_whatever_the_status(manifest in manifest()) {
        let findings = check(&manifest, &carriers()).unwrap();
        for (finding, record) in findings.iter().zip(&manifest.records) {
            let carrier_is_text = matches!(record.cell(1), CellValue::Empty | CellValue::Text(_));
            if record.cell(2).is_blank() && carrier_is_text {
                prop_assert!(finding.has(Violation::MissingTrackingId), "{:?}", record);
            }
        }
    }
}
