// Manifest loading: picks the reader from the file extension

use std::path::Path;

use shipcheck_compliance::Manifest;

use crate::error::IoError;

const BYTES_PER_MB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Worksheet to read from a workbook. Ignored for delimited text.
    pub sheet: Option<String>,
    /// Reject files larger than this many megabytes.
    pub max_file_size_mb: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    /// Delimiter sniffed from the content.
    Delimited,
    Tsv,
    Workbook,
}

impl ManifestFormat {
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "txt" => Ok(Self::Delimited),
            "tsv" | "tab" => Ok(Self::Tsv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Self::Workbook),
            _ => Err(IoError::UnsupportedFormat { extension: ext }),
        }
    }
}

pub fn load_manifest(path: &Path, options: &LoadOptions) -> Result<Manifest, IoError> {
    let format = ManifestFormat::from_path(path)?;

    if let Some(limit_mb) = options.max_file_size_mb {
        let size = std::fs::metadata(path).map_err(|e| IoError::read(path, e))?.len();
        if size > limit_mb * BYTES_PER_MB {
            return Err(IoError::TooLarge {
                path: path.to_path_buf(),
                size_mb: size as f64 / BYTES_PER_MB as f64,
                limit_mb,
            });
        }
    }

    let manifest = match format {
        ManifestFormat::Delimited => crate::csv::import(path)?,
        ManifestFormat::Tsv => crate::csv::import_with_delimiter(path, b'\t')?,
        ManifestFormat::Workbook => crate::xlsx::import(path, options.sheet.as_deref())?,
    };

    tracing::info!(
        path = %path.display(),
        records = manifest.len(),
        columns = manifest.columns.len(),
        "loaded manifest"
    );
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ManifestFormat::from_path(Path::new("a.CSV")).unwrap(), ManifestFormat::Delimited);
        assert_eq!(ManifestFormat::from_path(Path::new("a.tsv")).unwrap(), ManifestFormat::Tsv);
        assert_eq!(ManifestFormat::from_path(Path::new("a.xlsx")).unwrap(), ManifestFormat::Workbook);
        assert_eq!(ManifestFormat::from_path(Path::new("a.ods")).unwrap(), ManifestFormat::Workbook);

        let err = ManifestFormat::from_path(Path::new("a.pdf")).unwrap_err();
        assert!(err.to_string().starts_with("unsupported file type 'pdf'"));
    }

    #[test]
    fn test_size_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.csv");
        let mut content = String::from("id,carrier,tracking,status\n");
        while content.len() <= BYTES_PER_MB as usize {
            content.push_str("SH000001,FastShip,TRK0000001,In Transit\n");
        }
        fs::write(&path, &content).unwrap();

        let limited = LoadOptions {
            max_file_size_mb: Some(1),
            ..Default::default()
        };
        assert!(matches!(load_manifest(&path, &limited), Err(IoError::TooLarge { limit_mb: 1, .. })));

        let unlimited = LoadOptions::default();
        assert!(load_manifest(&path, &unlimited).unwrap().len() > 1000);
    }

    #[test]
    fn test_tsv_uses_tab() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.tsv");
        fs::write(&path, "id\tcarrier\n1\tUPS, Inc\n").unwrap();

        let manifest = load_manifest(&path, &LoadOptions::default()).unwrap();
        assert_eq!(manifest.columns, vec!["id", "carrier"]);
        assert_eq!(manifest.records[0].cell(1).display(), "UPS, Inc");
    }
}
