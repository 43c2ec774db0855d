//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; CI scripts gate on them.
//!
//! # Exit Codes
//!
//! | Code | Meaning                                               |
//! |------|-------------------------------------------------------|
//! | 0    | Success (no shipment flagged)                         |
//! | 1    | General error (unspecified, write failures)           |
//! | 2    | CLI usage error (bad args, refusing to overwrite)     |
//! | 3    | Check completed and at least one shipment is flagged  |
//! | 4    | Manifest is missing a required column                 |
//! | 5    | Policy file is invalid                                |
//! | 6    | Input could not be read or parsed                     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use shipcheck_compliance::ComplianceError;
use shipcheck_config::SettingsError;
use shipcheck_io::IoError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// The check ran and flagged at least one shipment.
pub const EXIT_VIOLATIONS: u8 = 3;

/// A required field has no matching manifest column (or an override names
/// a header that does not exist).
pub const EXIT_SCHEMA_MISMATCH: u8 = 4;

/// Policy TOML failed to parse or validate.
pub const EXIT_INVALID_POLICY: u8 = 5;

/// Manifest, carrier list, or settings could not be read or parsed.
pub const EXIT_INPUT: u8 = 6;

/// Map a ComplianceError to its exit code.
pub fn compliance_exit_code(err: &ComplianceError) -> u8 {
    match err {
        ComplianceError::SchemaMismatch { .. } | ComplianceError::UnknownColumn { .. } => {
            EXIT_SCHEMA_MISMATCH
        }
        ComplianceError::ConfigParse(_) | ComplianceError::ConfigValidation(_) => {
            EXIT_INVALID_POLICY
        }
        ComplianceError::Csv(_) => EXIT_INPUT,
    }
}

/// Map an IoError to its exit code.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Manifest(inner) => compliance_exit_code(inner),
        IoError::Write { .. } => EXIT_ERROR,
        IoError::Read { .. }
        | IoError::TooLarge { .. }
        | IoError::UnsupportedFormat { .. }
        | IoError::Workbook(_)
        | IoError::SheetNotFound { .. }
        | IoError::NoSheets
        | IoError::Carriers { .. } => EXIT_INPUT,
    }
}

/// Map a SettingsError to its exit code.
pub fn settings_exit_code(err: &SettingsError) -> u8 {
    match err {
        SettingsError::InvalidEnv { .. } => EXIT_USAGE,
        SettingsError::Read { .. } | SettingsError::Parse { .. } => EXIT_INPUT,
    }
}
