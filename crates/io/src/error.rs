use std::path::PathBuf;

use shipcheck_compliance::ComplianceError;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {message}", path.display())]
    Write { path: PathBuf, message: String },

    #[error("{} is {size_mb:.1} MB, over the {limit_mb} MB limit", path.display())]
    TooLarge {
        path: PathBuf,
        size_mb: f64,
        limit_mb: u64,
    },

    #[error("unsupported file type '{extension}' (expected csv, tsv, txt, xlsx, xls, xlsb or ods)")]
    UnsupportedFormat { extension: String },

    #[error("failed to open workbook: {0}")]
    Workbook(String),

    #[error("sheet '{sheet}' not found (sheets: {})", available.join(", "))]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },

    #[error("workbook contains no sheets")]
    NoSheets,

    #[error("invalid carrier list {}: {message}", path.display())]
    Carriers { path: PathBuf, message: String },

    #[error(transparent)]
    Manifest(#[from] ComplianceError),
}

impl IoError {
    pub(crate) fn read(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn write(path: &std::path::Path, message: impl ToString) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_large_message() {
        let err = IoError::TooLarge {
            path: PathBuf::from("big.csv"),
            size_mb: 12.34,
            limit_mb: 10,
        };
        assert_eq!(err.to_string(), "big.csv is 12.3 MB, over the 10 MB limit");
    }

    #[test]
    fn schema_mismatch_passes_through() {
        let err: IoError = ComplianceError::SchemaMismatch {
            field: "carrier".into(),
            available: vec!["id".into()],
        }
        .into();
        assert!(err.to_string().contains("'carrier'"));
    }
}
