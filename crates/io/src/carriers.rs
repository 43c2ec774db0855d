// Approved carrier lists: JSON array, CSV, or one name per line

use std::path::Path;

use shipcheck_compliance::ApprovedCarrierSet;

use crate::csv::read_file_as_utf8;
use crate::error::IoError;

/// Load carrier names from `path`. The format follows the extension:
/// `.json` is an array of strings, `.csv` takes the `carrier` column (or the
/// first column when there is no such header), anything else is read as one
/// name per line with `#` comments.
pub fn load_carriers(path: &Path) -> Result<ApprovedCarrierSet, IoError> {
    let content = read_file_as_utf8(path)?;
    let names = match extension(path).as_str() {
        "json" => parse_json(&content).map_err(|message| carriers_error(path, message))?,
        "csv" => parse_csv(&content).map_err(|message| carriers_error(path, message))?,
        _ => parse_lines(&content),
    };

    let set = ApprovedCarrierSet::from_names(&names);
    if set.len() < names.len() {
        tracing::debug!(
            path = %path.display(),
            skipped = names.len() - set.len(),
            "dropped blank or duplicate carrier names"
        );
    }
    Ok(set)
}

/// Load `path` if it exists, otherwise return `None`.
pub fn load_carriers_if_exists(path: &Path) -> Result<Option<ApprovedCarrierSet>, IoError> {
    if !path.exists() {
        return Ok(None);
    }
    load_carriers(path).map(Some)
}

/// Write `names` as a pretty JSON array, creating parent directories.
pub fn save_carriers_json(names: &[String], path: &Path) -> Result<(), IoError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| IoError::write(path, e))?;
        }
    }
    let json = serde_json::to_string_pretty(names).map_err(|e| IoError::write(path, e))?;
    std::fs::write(path, json + "\n").map_err(|e| IoError::write(path, e))
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

fn carriers_error(path: &Path, message: String) -> IoError {
    IoError::Carriers {
        path: path.to_path_buf(),
        message,
    }
}

fn parse_json(content: &str) -> Result<Vec<String>, String> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str::<Vec<String>>(content)
        .map_err(|e| format!("expected a JSON array of carrier names: {e}"))
}

fn parse_csv(content: &str) -> Result<Vec<String>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        rows.push(record);
    }

    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };

    // A header row is recognised by a "carrier" column
    let header_col = first.iter().position(|h| {
        let h = h.trim().to_ascii_lowercase();
        h == "carrier" || h == "carrier_name" || h == "carrier name" || h == "name"
    });
    let (col, skip) = match header_col {
        Some(col) => (col, 1),
        None => (0, 0),
    };

    Ok(rows
        .iter()
        .skip(skip)
        .filter_map(|r| r.get(col))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect())
}

fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
