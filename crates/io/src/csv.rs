// CSV/TSV manifest import and findings export

use std::io::Read;
use std::path::Path;

use shipcheck_compliance::engine::parse_csv_manifest;
use shipcheck_compliance::{ComplianceFinding, Manifest};

use crate::error::IoError;

/// Import a delimited manifest, sniffing the delimiter from the content.
pub fn import(path: &Path) -> Result<Manifest, IoError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    tracing::debug!(path = %path.display(), delimiter = %(delimiter as char).escape_default(), "importing delimited manifest");
    Ok(parse_csv_manifest(&content, delimiter)?)
}

pub fn import_with_delimiter(path: &Path, delimiter: u8) -> Result<Manifest, IoError> {
    let content = read_file_as_utf8(path)?;
    Ok(parse_csv_manifest(&content, delimiter)?)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(10)
        .collect();

    let mut best = b',';
    let mut best_score = 0usize;

    for &delim in candidates {
        let widths: Vec<usize> = sample.iter().map(|line| field_count(line, delim)).collect();

        let Some(&header_width) = widths.first() else {
            break;
        };
        if header_width <= 1 {
            continue;
        }

        // Lines agreeing with the header, weighted by width
        let agreeing = widths.iter().filter(|&&w| w == header_width).count();
        let score = agreeing * header_width;
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

fn field_count(line: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(|r| r.ok())
        .map_or(1, |r| r.len())
}

/// Read file and convert to UTF-8 if needed (Excel exports are often Windows-1252)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let mut file = std::fs::File::open(path).map_err(|e| IoError::read(path, e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| IoError::read(path, e))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            tracing::warn!(path = %path.display(), "file is not UTF-8, decoding as Windows-1252");
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Write one row per finding: row, shipment id, `;`-joined tags, detail.
pub fn export_findings(findings: &[ComplianceFinding], path: &Path) -> Result<(), IoError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| IoError::write(path, e))?;
    write_findings(&mut writer, findings).map_err(|e| IoError::write(path, e))?;
    writer.flush().map_err(|e| IoError::write(path, e))?;
    Ok(())
}

fn write_findings<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    findings: &[ComplianceFinding],
) -> Result<(), csv::Error> {
    writer.write_record(["row", "shipment_id", "compliant", "violations", "detail"])?;
    for f in findings {
        let tags: Vec<&str> = f.violations.iter().map(|v| v.tag()).collect();
        writer.write_record([
            f.row.to_string().as_str(),
            f.shipment_id.as_deref().unwrap_or(""),
            if f.is_compliant() { "yes" } else { "no" },
            tags.join("; ").as_str(),
            f.detail.as_deref().unwrap_or(""),
        ])?;
    }
    Ok(())
}
