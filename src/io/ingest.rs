//! Request ingest.
//!
//! Forecast requests come either as JSON (`{"target_weight", "fish_type",
//! "sequence"}`) or as a CSV seed history plus a target from the command line.
//! Both paths end in `validate::validate_request`, so the same rules and
//! messages apply regardless of the file format.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use serde_json::{Map, Value, json};

use crate::domain::{FishType, ForecastRequest};
use crate::error::AppError;
use crate::io::validate::validate_request;

const CSV_COLUMNS: [&str; 6] = ["date", "fish_type", "pool_type", "start_weight", "avg_weight", "week_age"];

/// Read any JSON document.
pub fn read_json(path: &Path) -> Result<Value, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::io(format!("Invalid JSON in '{}': {e}", path.display())))
}

/// Read and validate a single forecast request file.
pub fn load_request(path: &Path) -> Result<ForecastRequest, AppError> {
    validate_request(&read_json(path)?)
}

/// Read a batch file of the form `{"requests": [...]}`.
///
/// Individual requests are returned unvalidated; the batch runner validates
/// each one in isolation.
pub fn load_batch(path: &Path) -> Result<Vec<Value>, AppError> {
    match read_json(path)? {
        Value::Object(mut obj) => match obj.remove("requests") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(batch_format_error()),
        },
        _ => Err(batch_format_error()),
    }
}

fn batch_format_error() -> AppError {
    AppError::validation(r#"Invalid batch request format: expected {"requests": [list_of_forecast_requests]}"#)
}

/// Read a CSV seed history into loose JSON records.
///
/// Headers are matched case-insensitively; blank cells are treated as absent
/// so validation reports them as missing fields.
pub fn read_sequence_csv(path: &Path) -> Result<Vec<Value>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::io(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let mut items = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Line 1 is the header.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::io(format!("CSV parse error on line {line}: {e}")))?;
        items.push(Value::Object(record_to_object(&record, &header_map)));
    }
    Ok(items)
}

/// Build a request from a CSV seed history and a command-line target.
pub fn request_from_csv(
    path: &Path,
    target_weight: f64,
    fish_type: Option<FishType>,
) -> Result<ForecastRequest, AppError> {
    let sequence = read_sequence_csv(path)?;
    let mut request = json!({
        "target_weight": target_weight,
        "sequence": sequence,
    });
    if let (Some(fish), Some(obj)) = (fish_type, request.as_object_mut()) {
        obj.insert("fish_type".to_string(), Value::String(fish.label().to_string()));
    }
    validate_request(&request)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn record_to_object(record: &StringRecord, header_map: &HashMap<String, usize>) -> Map<String, Value> {
    let mut obj = Map::new();
    for column in CSV_COLUMNS {
        let cell = header_map
            .get(column)
            .and_then(|&idx| record.get(idx))
            .filter(|s| !s.is_empty());
        if let Some(cell) = cell {
            obj.insert(column.to_string(), Value::String(cell.to_string()));
        }
    }
    obj
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PoolType;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(contents.as_bytes()).unwrap();
        tmp
    }

    fn csv_rows(n: usize) -> String {
        let mut out = String::from("\u{feff}Date,Fish_Type,pool_type,start_weight,avg_weight,week_age\n");
        for i in 0..n {
            out.push_str(&format!(
                "2024-06-{:02},Nila Merah,,0.02,{:.2},9\n",
                i + 10,
                0.3 + 0.02 * i as f64
            ));
        }
        out
    }

    #[test]
    fn csv_sequence_becomes_request() {
        let tmp = write_temp(&csv_rows(8));
        let req = request_from_csv(tmp.path(), 1.2, Some(FishType::NilaMerah)).unwrap();
        assert_eq!(req.sequence.len(), 8);
        assert_eq!(req.sequence[0].fish_type, FishType::NilaMerah);
        assert_eq!(req.sequence[0].pool_type, PoolType::Earthen);
        assert_eq!(req.sequence[7].week_age, 9);
        assert_eq!(req.fish_type, Some(FishType::NilaMerah));
    }

    #[test]
    fn csv_target_ceiling_uses_fish_type() {
        let tmp = write_temp(&csv_rows(7));
        let err = request_from_csv(tmp.path(), 2.8, Some(FishType::NilaMerah)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn csv_blank_cells_are_missing_fields() {
        let mut rows = csv_rows(7);
        rows = rows.replacen(",0.02,0.30,9", ",0.02,,9", 1);
        let tmp = write_temp(&rows);
        let err = request_from_csv(tmp.path(), 1.0, None).unwrap_err();
        assert_eq!(
            err.details(),
            vec!["sequence[0] missing required field: avg_weight".to_string()]
        );
    }

    #[test]
    fn batch_file_shape() {
        let tmp = write_temp(r#"{"requests": [{"target_weight": 1.0}, {}]}"#);
        assert_eq!(load_batch(tmp.path()).unwrap().len(), 2);

        let tmp = write_temp(r#"[{"target_weight": 1.0}]"#);
        assert!(matches!(load_batch(tmp.path()), Err(AppError::Validation(_))));
    }

    #[test]
    fn unreadable_json_is_io_error() {
        let tmp = write_temp("{not json");
        assert!(matches!(read_json(tmp.path()), Err(AppError::Io(_))));
    }
}
