//! NetCDF → JSON conversion step
//!
//! Reads the downloaded subset, removes it, and writes the output document
//! next to it under a millisecond-timestamp name. The returned name doubles
//! as the object key used by the publisher.

use crate::config::GridRequest;
use crate::dataset::read_grid;
use crate::document::OutputDocument;
use crate::errors::Result;
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{info, instrument, warn};

static LAST_TIMESTAMP_MS: AtomicI64 = AtomicI64::new(0);

/// Epoch milliseconds that never go backwards within this process, even if
/// the wall clock does.
pub fn monotonic_timestamp_ms() -> i64 {
    let now = Utc::now().timestamp_millis();
    let previous = LAST_TIMESTAMP_MS.fetch_max(now, Ordering::SeqCst);
    previous.max(now)
}

/// `{timestamp_ms}.json`
pub fn output_file_name() -> String {
    format!("{}.json", monotonic_timestamp_ms())
}

/// Converts the NetCDF file at `source` and returns the generated file name
/// (relative to `work_dir`).
///
/// Nothing is written if reading the grid fails; the source file is left in
/// place in that case. A JSON file that fails mid-write is removed.
#[instrument(skip(source, request), fields(source = %source.display()))]
pub fn transform(source: &Path, work_dir: &Path, request: &GridRequest) -> Result<String> {
    let dataset = read_grid(source)?;
    let document = OutputDocument::build(&dataset, request);

    match fs::remove_file(source) {
        Ok(()) => info!("Deleted NetCDF matrix"),
        Err(e) => warn!(error = %e, "Could not delete downloaded NetCDF file"),
    }

    let file_name = output_file_name();
    let output_path = work_dir.join(&file_name);

    write_output(&output_path, &document)?;

    info!(file = %file_name, "Built JSON file");
    Ok(file_name)
}

/// Serializes `value` to `path`, removing the file again if the write fails.
fn write_output<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let written = write_json(path, value);
    if written.is_err() {
        if let Err(cleanup) = fs::remove_file(path) {
            warn!(error = %cleanup, "Could not remove partial JSON file");
        }
    }
    written
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}
