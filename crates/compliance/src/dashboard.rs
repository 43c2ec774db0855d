//! Manifest-level tallies for dashboard charts: status and carrier counts,
//! delay statistics and the shipment timeline.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{CellValue, Manifest, ShipmentRecord};
use crate::rules::parse_date;
use crate::schema::{ColumnMap, Field};

/// How many carriers the carrier chart shows.
pub const TOP_CARRIERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub label: String,
    pub count: usize,
}

/// One shipment with both a departure and an arrival date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub row: usize,
    pub shipment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    pub departure: NaiveDate,
    pub arrival: NaiveDate,
    /// Arrival minus departure. Negative when the dates are inverted.
    pub transit_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitStats {
    pub shipments: usize,
    pub average_days: f64,
    pub shortest_days: i64,
    pub longest_days: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ManifestMetrics {
    pub total_shipments: usize,
    pub delayed: usize,
    /// Delayed shipments as a percentage of the total (0 for an empty manifest).
    pub delayed_percent: f64,
    pub in_transit: usize,
    pub completed: usize,
    /// Title-cased status → count, most frequent first.
    pub status_counts: Vec<Tally>,
    /// Title-cased carrier → count, at most `TOP_CARRIERS`.
    pub top_carriers: Vec<Tally>,
    /// Carriers of delayed shipments, most delays first.
    pub delays_by_carrier: Vec<Tally>,
    /// Shipments with both dates, ordered by departure then row.
    pub timeline: Vec<TimelineEntry>,
    /// Rows left off the timeline because a date cell did not parse. Only
    /// counted when both date columns are mapped.
    pub unparsed_dates: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transit: Option<TransitStats>,
}

/// Tally key metrics, status counts, carriers, delays and the timeline.
/// Columns that are not mapped simply contribute nothing.
pub fn compute_metrics(manifest: &Manifest, columns: &ColumnMap) -> ManifestMetrics {
    let mut metrics = ManifestMetrics {
        total_shipments: manifest.records.len(),
        ..Default::default()
    };

    let mut statuses: HashMap<String, usize> = HashMap::new();
    let mut carriers: HashMap<String, usize> = HashMap::new();
    let mut delays: HashMap<String, usize> = HashMap::new();
    let dated = columns.get(Field::ShipDate).is_some() && columns.get(Field::DeliveryDate).is_some();

    for record in &manifest.records {
        let carrier = label_of(record_cell(record, columns, Field::Carrier));
        if let Some(ref carrier) = carrier {
            *carriers.entry(title_case(carrier)).or_insert(0) += 1;
        }

        if let Some(status) = label_of(record_cell(record, columns, Field::Status)) {
            let folded = status.to_lowercase().replace(['-', '_'], " ");
            if folded.contains("delay") {
                metrics.delayed += 1;
                if let Some(ref carrier) = carrier {
                    *delays.entry(title_case(carrier)).or_insert(0) += 1;
                }
            }
            if folded.contains("in transit") {
                metrics.in_transit += 1;
            }
            if folded.contains("delivered") || folded.contains("completed") {
                metrics.completed += 1;
            }
            *statuses.entry(title_case(&status)).or_insert(0) += 1;
        }

        if dated {
            match timeline_entry(record, columns) {
                Ok(Some(entry)) => metrics.timeline.push(entry),
                Ok(None) => {}
                Err(()) => metrics.unparsed_dates += 1,
            }
        }
    }

    if metrics.total_shipments > 0 {
        metrics.delayed_percent = metrics.delayed as f64 * 100.0 / metrics.total_shipments as f64;
    }
    metrics.status_counts = ranked(statuses);
    metrics.top_carriers = ranked(carriers);
    metrics.top_carriers.truncate(TOP_CARRIERS);
    metrics.delays_by_carrier = ranked(delays);

    metrics
        .timeline
        .sort_by(|a, b| a.departure.cmp(&b.departure).then(a.row.cmp(&b.row)));
    metrics.transit = transit_stats(&metrics.timeline);
    metrics
}

/// `Ok(None)` when either date is blank or unmapped, `Err` when one is
/// present but cannot be read as a date.
fn timeline_entry(record: &ShipmentRecord, columns: &ColumnMap) -> Result<Option<TimelineEntry>, ()> {
    let departure = date_of(record_cell(record, columns, Field::ShipDate))?;
    let arrival = date_of(record_cell(record, columns, Field::DeliveryDate))?;
    let (Some(departure), Some(arrival)) = (departure, arrival) else {
        return Ok(None);
    };
    Ok(Some(TimelineEntry {
        row: record.row,
        shipment_id: label_of(record_cell(record, columns, Field::ShipmentId)),
        origin: label_of(record_cell(record, columns, Field::Origin)),
        destination: label_of(record_cell(record, columns, Field::Destination)),
        departure,
        arrival,
        transit_days: (arrival - departure).num_days(),
    }))
}

fn date_of(cell: Option<&CellValue>) -> Result<Option<NaiveDate>, ()> {
    match cell {
        None => Ok(None),
        Some(c) if c.is_blank() => Ok(None),
        Some(CellValue::Date(d)) => Ok(Some(*d)),
        Some(CellValue::Text(s)) => parse_date(s.trim()).map(Some).ok_or(()),
        Some(_) => Err(()),
    }
}

fn transit_stats(timeline: &[TimelineEntry]) -> Option<TransitStats> {
    let days: Vec<i64> = timeline.iter().map(|e| e.transit_days).collect();
    let shortest = *days.iter().min()?;
    let longest = *days.iter().max()?;
    Some(TransitStats {
        shipments: days.len(),
        average_days: days.iter().sum::<i64>() as f64 / days.len() as f64,
        shortest_days: shortest,
        longest_days: longest,
    })
}

fn record_cell<'a>(
    record: &'a ShipmentRecord,
    columns: &ColumnMap,
    field: Field,
) -> Option<&'a CellValue> {
    columns.get(field).map(|idx| record.cell(idx))
}

fn label_of(cell: Option<&CellValue>) -> Option<String> {
    let cell = cell?;
    if cell.is_blank() {
        return None;
    }
    Some(cell.display().trim().to_string())
}

/// Count descending, then label ascending.
fn ranked(counts: HashMap<String, usize>) -> Vec<Tally> {
    let mut tallies: Vec<Tally> = counts
        .into_iter()
        .map(|(label, count)| Tally { label, count })
        .collect();
    tallies.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    tallies
}

pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnOverrides;
    use crate::engine::parse_csv_manifest;

    fn metrics_for(csv: &str) -> ManifestMetrics {
        let manifest = parse_csv_manifest(csv, b',').unwrap();
        let columns = ColumnMap::detect(&manifest.columns, &ColumnOverrides::default()).unwrap();
        compute_metrics(&manifest, &columns)
    }

    #[test]
    fn key_metrics() {
        let m = metrics_for(
            "\
id,carrier,status
1,ups,Delayed
2,UPS,in transit
3,DHL,In-Transit
4,fedex,Delivered
5,dhl,completed
6,DHL,
",
        );
        assert_eq!(m.total_shipments, 6);
        assert_eq!(m.delayed, 1);
        assert_eq!(m.in_transit, 2);
        assert_eq!(m.completed, 2);
        assert_eq!(
            m.top_carriers,
            vec![
                Tally { label: "Dhl".into(), count: 3 },
                Tally { label: "Ups".into(), count: 2 },
                Tally { label: "Fedex".into(), count: 1 },
            ]
        );
        // Ties are ordered by label
        assert_eq!(m.status_counts[0], Tally { label: "Completed".into(), count: 1 });
        assert_eq!(m.status_counts.iter().map(|t| t.count).sum::<usize>(), 5);
    }

    #[test]
    fn top_carriers_capped() {
        let mut csv = String::from("id,carrier,status\n");
        for (i, c) in ["a", "b", "c", "d", "e", "f", "f"].iter().enumerate() {
            csv.push_str(&format!("{i},{c},ok\n"));
        }
        let m = metrics_for(&csv);
        assert_eq!(m.top_carriers.len(), TOP_CARRIERS);
        assert_eq!(m.top_carriers[0].label, "F");
    }

    #[test]
    fn missing_columns_contribute_nothing() {
        let m = metrics_for("id,weight\n1,10\n2,12\n");
        assert_eq!(m.total_shipments, 2);
        assert!(m.status_counts.is_empty());
        assert!(m.top_carriers.is_empty());
    }

    #[test]
    fn delay_statistics() {
        let m = metrics_for(
            "\
id,carrier,status
1,ups,Delayed
2,UPS,delayed at hub
3,dhl,Delayed
4,fedex,Delivered
",
        );
        assert_eq!(m.delayed, 3);
        assert_eq!(m.delayed_percent, 75.0);
        assert_eq!(
            m.delays_by_carrier,
            vec![
                Tally { label: "Ups".into(), count: 2 },
                Tally { label: "Dhl".into(), count: 1 },
            ]
        );
        assert_eq!(metrics_for("id,carrier,status\n").delayed_percent, 0.0);
    }

    #[test]
    fn timeline_spans_departure_to_arrival() {
        let m = metrics_for(
            "\
id,carrier,status,origin,destination,ship_date,eta
A,UPS,ok,Austin,Boston,2026-01-10,2026-01-14
B,UPS,ok,Miami,Denver,2026-01-05,2026-01-15
C,UPS,ok,Reno,Omaha,,2026-01-20
D,UPS,ok,Tulsa,Dallas,soon,2026-01-20
",
        );
        let ids: Vec<_> = m.timeline.iter().map(|e| e.shipment_id.as_deref()).collect();
        assert_eq!(ids, [Some("B"), Some("A")], "ordered by departure");
        assert_eq!(m.timeline[1].origin.as_deref(), Some("Austin"));
        assert_eq!(m.timeline[1].destination.as_deref(), Some("Boston"));
        assert_eq!(m.timeline[1].transit_days, 4);
        assert_eq!(m.unparsed_dates, 1);

        let transit = m.transit.unwrap();
        assert_eq!(transit.shipments, 2);
        assert_eq!(transit.average_days, 7.0);
        assert_eq!(transit.shortest_days, 4);
        assert_eq!(transit.longest_days, 10);
    }

    #[test]
    fn no_dates_no_transit() {
        let m = metrics_for("id,carrier,status\n1,UPS,ok\n");
        assert!(m.timeline.is_empty());
        assert_eq!(m.transit, None);
        assert_eq!(m.unparsed_dates, 0);
    }

    #[test]
    fn title_case_words() {
        assert_eq!(title_case("  in   TRANSIT "), "In Transit");
        assert_eq!(title_case("amazon logistics"), "Amazon Logistics");
        assert_eq!(title_case(""), "");
    }
}
