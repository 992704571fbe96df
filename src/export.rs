use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{ReportError, Result};
use crate::model::CsvRow;

/// Write `rows` to `path` as CSV with the row type's header.
///
/// The data goes to a temporary file beside `path` which is renamed over it
/// only once fully flushed, so `path` ends up either complete or untouched.
/// The parent directory must already exist.
pub fn write_csv<T: CsvRow>(path: &Path, rows: &[T]) -> Result<usize> {
    let start_time = Instant::now();
    info!(action = "start", component = "csv_export", path = ?path, row_count = rows.len(), "Writing report");

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let staging = write_rows(NamedTempFile::new_in(directory)?, rows)?;
    staging.as_file().sync_all()?;
    staging.persist(path).map_err(|e| ReportError::Io(e.error))?;

    info!(
        action = "complete",
        component = "csv_export",
        path = ?path,
        row_count = rows.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Report written"
    );
    Ok(rows.len())
}

/// Render rows to a string in the same format `write_csv` produces
pub fn to_csv_string<T: CsvRow>(rows: &[T]) -> Result<String> {
    let bytes = write_rows(Vec::new(), rows)?;
    String::from_utf8(bytes)
        .map_err(|e| ReportError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

fn write_rows<W: Write, T: CsvRow>(sink: W, rows: &[T]) -> Result<W> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(sink);

    writer.write_record(T::HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    writer
        .into_inner()
        .map_err(|e| ReportError::Io(io::Error::new(e.error().kind(), e.error().to_string())))
}
