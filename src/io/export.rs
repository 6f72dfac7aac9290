//! File exports.
//!
//! - forecast predictions as CSV (one row per forecast day)
//! - backfilled or seed records as CSV (same columns the CSV ingest reads)
//! - any response document as pretty JSON

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::{ObservationRecord, Prediction};
use crate::error::AppError;

pub fn write_predictions_csv(path: &Path, predictions: &[Prediction]) -> Result<(), AppError> {
    let mut file = create(path)?;

    writeln!(file, "day,date,predicted_weight,days_to_target")
        .map_err(|e| AppError::io(format!("Failed to write predictions CSV header: {e}")))?;

    for p in predictions {
        writeln!(
            file,
            "{},{},{:.4},{}",
            p.day,
            p.date,
            p.predicted_weight,
            p.days_to_target.map(|d| d.to_string()).unwrap_or_default(),
        )
        .map_err(|e| AppError::io(format!("Failed to write predictions CSV row: {e}")))?;
    }
    Ok(())
}

pub fn write_records_csv(path: &Path, records: &[ObservationRecord]) -> Result<(), AppError> {
    let mut file = create(path)?;

    writeln!(file, "date,fish_type,pool_type,start_weight,avg_weight,week_age")
        .map_err(|e| AppError::io(format!("Failed to write records CSV header: {e}")))?;

    for r in records {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            r.date,
            r.fish_type.label(),
            r.pool_type.label(),
            r.start_weight,
            r.avg_weight,
            r.week_age,
        )
        .map_err(|e| AppError::io(format!("Failed to write records CSV row: {e}")))?;
    }
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let file = create(path)?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| AppError::io(format!("Failed to write JSON '{}': {e}", path.display())))
}

fn create(path: &Path) -> Result<File, AppError> {
    File::create(path).map_err(|e| AppError::io(format!("Failed to create '{}': {e}", path.display())))
}
