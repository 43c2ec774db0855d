use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComplianceError {
    /// TOML parse / deserialization error.
    #[error("policy parse error: {0}")]
    ConfigParse(String),

    /// Policy validation error (empty keyword list, zero threshold, etc.).
    #[error("policy validation error: {0}")]
    ConfigValidation(String),

    /// A required field has no column in the manifest.
    #[error("manifest is missing required field '{field}' (columns: {})", format_columns(.available))]
    SchemaMismatch { field: String, available: Vec<String> },

    /// A column override in the policy names a header the manifest does not have.
    #[error("column override for '{field}' names unknown header '{header}'")]
    UnknownColumn { field: String, header: String },

    /// Manifest text could not be read as CSV at all.
    #[error("CSV error: {0}")]
    Csv(String),
}

fn format_columns(columns: &[String]) -> String {
    if columns.is_empty() {
        "none".to_string()
    } else {
        columns.join(", ")
    }
}
