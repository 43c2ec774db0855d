use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ComplianceError;
use crate::schema::Field;

// ---------------------------------------------------------------------------
// Top-level policy
// ---------------------------------------------------------------------------

/// Check policy, normally loaded from a `.policy.toml` file. Every section is
/// optional; an empty document is the standard policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckPolicy {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub carriers: CarrierSource,
    #[serde(default)]
    pub columns: ColumnOverrides,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub alert: AlertConfig,
}

fn default_name() -> String {
    "standard".into()
}

impl Default for CheckPolicy {
    fn default() -> Self {
        Self {
            name: default_name(),
            carriers: CarrierSource::default(),
            columns: ColumnOverrides::default(),
            rules: RulesConfig::default(),
            alert: AlertConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Carriers
// ---------------------------------------------------------------------------

/// Where the approved carrier list comes from. Inline names and the file are
/// merged by the caller; the engine only sees the resulting set.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CarrierSource {
    #[serde(default)]
    pub approved: Vec<String>,
    /// Path to a carrier list, relative to the policy file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

// ---------------------------------------------------------------------------
// Column overrides
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<String>,
}

impl ColumnOverrides {
    pub fn get(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::ShipmentId => &self.shipment_id,
            Field::Carrier => &self.carrier,
            Field::TrackingId => &self.tracking_id,
            Field::Status => &self.status,
            Field::Origin => &self.origin,
            Field::Destination => &self.destination,
            Field::ShipDate => &self.ship_date,
            Field::DeliveryDate => &self.delivery_date,
        };
        value.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RulesConfig {
    #[serde(default = "enabled")]
    pub missing_tracking_id: bool,
    /// Missing-carrier and unapproved-carrier checks.
    #[serde(default = "enabled")]
    pub carrier: bool,
    /// Flag statuses containing a delayed keyword. Off by default so the
    /// standard policy only checks tracking IDs and carriers.
    #[serde(default)]
    pub delayed_status: bool,
    #[serde(default = "default_delayed_keywords")]
    pub delayed_keywords: Vec<String>,
    #[serde(default)]
    pub overdue_delivery: bool,
    #[serde(default = "default_completed_keywords")]
    pub completed_keywords: Vec<String>,
    /// Reference date for the overdue check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
}

fn enabled() -> bool {
    true
}

fn default_delayed_keywords() -> Vec<String> {
    vec!["delay".into()]
}

fn default_completed_keywords() -> Vec<String> {
    vec!["delivered".into(), "completed".into()]
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            missing_tracking_id: true,
            carrier: true,
            delayed_status: false,
            delayed_keywords: default_delayed_keywords(),
            overdue_delivery: false,
            completed_keywords: default_completed_keywords(),
            as_of: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Alert
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertTone {
    #[default]
    Plain,
    Formal,
    Urgent,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AlertConfig {
    /// Minimum number of flagged records that triggers an alert. The alert
    /// fires once the flagged count reaches this value (`flagged >= threshold`),
    /// so the default of 1 alerts on any flagged record.
    #[serde(default = "default_threshold")]
    pub threshold: usize,
    #[serde(default)]
    pub tone: AlertTone,
}

fn default_threshold() -> usize {
    1
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            tone: AlertTone::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl CheckPolicy {
    pub fn from_toml(input: &str) -> Result<Self, ComplianceError> {
        let policy: CheckPolicy =
            toml::from_str(input).map_err(|e| ComplianceError::ConfigParse(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn to_toml(&self) -> Result<String, ComplianceError> {
        toml::to_string_pretty(self).map_err(|e| ComplianceError::ConfigParse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ComplianceError> {
        if self.name.trim().is_empty() {
            return Err(ComplianceError::ConfigValidation(
                "name must not be blank".into(),
            ));
        }

        if let Some(blank) = self.carriers.approved.iter().position(|c| c.trim().is_empty()) {
            return Err(ComplianceError::ConfigValidation(format!(
                "carriers.approved[{blank}] is blank"
            )));
        }

        let rules = &self.rules;
        if rules.delayed_status && !has_keyword(&rules.delayed_keywords) {
            return Err(ComplianceError::ConfigValidation(
                "rules.delayed_status requires at least one delayed keyword".into(),
            ));
        }

        if rules.overdue_delivery {
            if rules.as_of.is_none() {
                return Err(ComplianceError::ConfigValidation(
                    "rules.overdue_delivery requires rules.as_of".into(),
                ));
            }
            if !has_keyword(&rules.completed_keywords) {
                return Err(ComplianceError::ConfigValidation(
                    "rules.overdue_delivery requires at least one completed keyword".into(),
                ));
            }
        }

        if self.alert.threshold == 0 {
            return Err(ComplianceError::ConfigValidation(
                "alert.threshold must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

fn has_keyword(keywords: &[String]) -> bool {
    keywords.iter().any(|k| !k.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
