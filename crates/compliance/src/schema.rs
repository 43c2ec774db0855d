//! Manifest column resolution.
//!
//! Headers are matched against per-field alias lists after normalization.
//! Policy overrides name an exact header and take precedence over aliases.

use std::fmt;

use crate::config::ColumnOverrides;
use crate::error::ComplianceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    ShipmentId,
    Carrier,
    TrackingId,
    Status,
    Origin,
    Destination,
    ShipDate,
    DeliveryDate,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::ShipmentId,
        Field::Carrier,
        Field::TrackingId,
        Field::Status,
        Field::Origin,
        Field::Destination,
        Field::ShipDate,
        Field::DeliveryDate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ShipmentId => "shipment_id",
            Self::Carrier => "carrier",
            Self::TrackingId => "tracking_id",
            Self::Status => "status",
            Self::Origin => "origin",
            Self::Destination => "destination",
            Self::ShipDate => "ship_date",
            Self::DeliveryDate => "delivery_date",
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(
            self,
            Self::ShipmentId | Self::Carrier | Self::TrackingId | Self::Status
        )
    }

    /// Accepted header spellings, already normalized.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::ShipmentId => &[
                "shipment_id",
                "shipmentid",
                "shipment",
                "shipment_number",
                "shipment_ref",
                "reference",
                "id",
            ],
            Self::Carrier => &[
                "carrier",
                "carrier_name",
                "carriername",
                "shipping_company",
                "shipper",
            ],
            Self::TrackingId => &[
                "tracking_id",
                "trackingid",
                "tracking_number",
                "trackingnumber",
                "tracking_no",
                "tracking_ref",
                "tracking",
                "awb",
            ],
            Self::Status => &["status", "shipment_status", "delivery_status"],
            Self::Origin => &["origin", "origin_city", "pickup_location", "from"],
            Self::Destination => &[
                "destination",
                "destination_city",
                "delivery_location",
                "to",
            ],
            Self::ShipDate => &[
                "ship_date",
                "departure_date",
                "departure",
                "pickup_date",
                "start_date",
                "created_date",
                "date",
            ],
            Self::DeliveryDate => &[
                "delivery_date",
                "expected_delivery",
                "expected_arrival",
                "expectedarrival",
                "arrival_date",
                "due_date",
                "eta",
            ],
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lowercase, trim, and fold every run of non-alphanumerics into one `_`.
pub fn normalize_header(header: &str) -> String {
    let mut out = String::with_capacity(header.len());
    let mut pending_sep = false;
    for ch in header.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Field → column index for one manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    indices: [Option<usize>; 8],
}

impl ColumnMap {
    pub fn get(&self, field: Field) -> Option<usize> {
        self.indices[field as usize]
    }

    /// Resolve every field against `columns`. Required fields without a
    /// column are a `SchemaMismatch`.
    pub fn resolve(
        columns: &[String],
        overrides: &ColumnOverrides,
    ) -> Result<Self, ComplianceError> {
        let map = Self::detect(columns, overrides)?;
        for field in Field::ALL {
            if field.is_required() && map.get(field).is_none() {
                return Err(ComplianceError::SchemaMismatch {
                    field: field.name().into(),
                    available: columns.to_vec(),
                });
            }
        }
        Ok(map)
    }

    /// Like `resolve`, but fields without a column are simply unmapped.
    pub fn detect(
        columns: &[String],
        overrides: &ColumnOverrides,
    ) -> Result<Self, ComplianceError> {
        let normalized: Vec<String> = columns.iter().map(|c| normalize_header(c)).collect();
        let mut map = ColumnMap::default();
        let mut claimed = vec![false; columns.len()];

        // Overrides first so aliases never steal an explicitly mapped column
        for field in Field::ALL {
            let Some(header) = overrides.get(field) else {
                continue;
            };
            let idx = columns
                .iter()
                .position(|c| c == header)
                .or_else(|| {
                    let wanted = normalize_header(header);
                    normalized.iter().position(|n| *n == wanted)
                })
                .ok_or_else(|| ComplianceError::UnknownColumn {
                    field: field.name().into(),
                    header: header.into(),
                })?;
            map.indices[field as usize] = Some(idx);
            claimed[idx] = true;
        }

        for field in Field::ALL {
            if map.get(field).is_some() {
                continue;
            }
            let found = field.aliases().iter().find_map(|alias| {
                normalized
                    .iter()
                    .enumerate()
                    .find(|(i, n)| !claimed[*i] && n.as_str() == *alias)
                    .map(|(i, _)| i)
            });
            if let Some(idx) = found {
                map.indices[field as usize] = Some(idx);
                claimed[idx] = true;
            }
        }

        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalize_variants() {
        assert_eq!(normalize_header("  Shipment ID "), "shipment_id");
        assert_eq!(normalize_header("Tracking-Number"), "tracking_number");
        assert_eq!(normalize_header("Tracking #"), "tracking");
        assert_eq!(normalize_header("TrackingNumber"), "trackingnumber");
        assert_eq!(normalize_header("__ETA__"), "eta");
    }

    #[test]
    fn resolves_aliases() {
        let columns = cols(&["Shipment ID", "Carrier Name", "Tracking Number", "Status", "ETA"]);
        let map = ColumnMap::resolve(&columns, &ColumnOverrides::default()).unwrap();
        assert_eq!(map.get(Field::ShipmentId), Some(0));
        assert_eq!(map.get(Field::Carrier), Some(1));
        assert_eq!(map.get(Field::TrackingId), Some(2));
        assert_eq!(map.get(Field::Status), Some(3));
        assert_eq!(map.get(Field::DeliveryDate), Some(4));
        assert_eq!(map.get(Field::Origin), None);
    }

    #[test]
    fn missing_required_field_is_schema_mismatch() {
        let columns = cols(&["shipment_id", "carrier", "status"]);
        let err = ColumnMap::resolve(&columns, &ColumnOverrides::default()).unwrap_err();
        match err {
            ComplianceError::SchemaMismatch { field, available } => {
                assert_eq!(field, "tracking_id");
                assert_eq!(available, columns);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn override_wins_over_alias() {
        let columns = cols(&["id", "carrier", "tracking", "AWB Number", "status"]);
        let overrides = ColumnOverrides {
            tracking_id: Some("AWB Number".into()),
            ..Default::default()
        };
        let map = ColumnMap::resolve(&columns, &overrides).unwrap();
        assert_eq!(map.get(Field::TrackingId), Some(3));
    }

    #[test]
    fn override_naming_unknown_header_fails() {
        let columns = cols(&["id", "carrier", "tracking", "status"]);
        let overrides = ColumnOverrides {
            carrier: Some("Shipper".into()),
            ..Default::default()
        };
        let err = ColumnMap::resolve(&columns, &overrides).unwrap_err();
        assert!(err.to_string().contains("'Shipper'"));
    }

    #[test]
    fn detect_leaves_missing_fields_unmapped() {
        let columns = cols(&["Status", "Carrier"]);
        let map = ColumnMap::detect(&columns, &ColumnOverrides::default()).unwrap();
        assert_eq!(map.get(Field::Status), Some(0));
        assert_eq!(map.get(Field::Carrier), Some(1));
        assert_eq!(map.get(Field::TrackingId), None);
    }

    #[test]
    fn a_column_is_claimed_once() {
        // "shipment_id" is preferred over "id"; "id" stays unclaimed.
        let columns = cols(&["id", "shipment_id", "carrier", "tracking_id", "status"]);
        let map = ColumnMap::resolve(&columns, &ColumnOverrides::default()).unwrap();
        assert_eq!(map.get(Field::ShipmentId), Some(1));
    }
}
