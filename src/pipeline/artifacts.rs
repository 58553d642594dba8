//! Newline-delimited JSON artifacts written between pipeline stages.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::{AppError, Result};

/// Write one JSON object per line, replacing any existing file.
pub fn write_jsonl<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    for row in rows {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    tracing::debug!(path = %path.display(), rows = rows.len(), "Wrote artifact");
    Ok(())
}

/// Read a JSONL file; blank lines are skipped. Malformed lines are `Data`
/// errors carrying the line number.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.is_file() {
        return Err(AppError::NotFound(format!(
            "Artifact not found: {}",
            path.display()
        )));
    }

    let reader = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line).map_err(|e| {
            AppError::Data(format!(
                "Invalid JSON at {}:{}: {}",
                path.display(),
                idx + 1,
                e
            ))
        })?;
        rows.push(row);
    }
    Ok(rows)
}
