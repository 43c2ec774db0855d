//! `shipcheck-compliance`: rule-based shipment manifest compliance engine.
//!
//! Pure engine crate: receives a parsed manifest and an approved-carrier set,
//! returns one finding per record. No file or CLI dependencies.

pub mod alert;
pub mod config;
pub mod dashboard;
pub mod engine;
pub mod error;
pub mod model;
pub mod rules;
pub mod schema;
pub mod summary;

pub use config::CheckPolicy;
pub use engine::{check, check_with, run};
pub use error::ComplianceError;
pub use model::{
    ApprovedCarrierSet, CellValue, CheckReport, ComplianceFinding, Manifest, ShipmentRecord,
    Violation,
};
