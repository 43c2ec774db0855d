// JSON report export

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::IoError;

/// Write `value` as pretty JSON followed by a newline.
pub fn export<T: Serialize>(value: &T, path: &Path) -> Result<(), IoError> {
    let file = File::create(path).map_err(|e| IoError::write(path, e))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| IoError::write(path, e))?;
    writer
        .write_all(b"\n")
        .and_then(|_| writer.flush())
        .map_err(|e| IoError::write(path, e))?;

    Ok(())
}
