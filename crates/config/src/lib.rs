// Configuration loading

pub mod settings;

pub use settings::{Settings, SettingsError};

/// Carriers approved out of the box, used when no list has been configured.
pub const DEFAULT_CARRIERS: [&str; 9] = [
    "FedEx",
    "UPS",
    "DHL",
    "USPS",
    "Amazon Logistics",
    "OnTrac",
    "LaserShip",
    "GSO",
    "Purolator",
];

/// Default upload limit for manifest files.
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 10;
