//! Request validation.
//!
//! Requests arrive as loose JSON. Every problem found is collected so the
//! caller can see all of them at once; a request either converts fully into a
//! `ForecastRequest` or fails with `AppError::Validation`.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::domain::{
    FALLBACK_TARGET_CEILING_KG, FishType, ForecastRequest, ObservationRecord, PoolType, WINDOW_SIZE,
};
use crate::error::AppError;

pub const MAX_SEQUENCE_LEN: usize = 100;
/// Upper bound on any single record weight (kg).
pub const MAX_RECORD_WEIGHT_KG: f64 = 10.0;
pub const MAX_WEEK_AGE: f64 = 100.0;

const REQUIRED_FIELDS: [&str; 5] = ["date", "fish_type", "start_weight", "avg_weight", "week_age"];

/// Validate a single forecast request object.
pub fn validate_request(value: &Value) -> Result<ForecastRequest, AppError> {
    let Some(obj) = value.as_object() else {
        return Err(AppError::validation("Request data must be a JSON object"));
    };

    let mut errors = Vec::new();
    let fish_type = match obj.get("fish_type") {
        None | Some(Value::Null) => None,
        Some(v) => match v.as_str().and_then(FishType::from_label) {
            Some(f) => Some(f),
            None => {
                errors.push(format!("fish_type must be one of: {}", fish_labels()));
                None
            }
        },
    };
    let target_weight = check_target_weight(obj.get("target_weight"), fish_type, &mut errors);
    let sequence = check_sequence(obj.get("sequence"), &mut errors);

    match (target_weight, errors.is_empty()) {
        (Some(target_weight), true) => Ok(ForecastRequest {
            target_weight,
            fish_type,
            sequence,
        }),
        _ => Err(AppError::Validation(errors)),
    }
}

/// Target must be positive and under the species ceiling (or the fallback).
pub fn check_target_weight(
    value: Option<&Value>,
    fish_type: Option<FishType>,
    errors: &mut Vec<String>,
) -> Option<f64> {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        errors.push("target_weight is required".to_string());
        return None;
    };
    let Some(target) = as_number(value) else {
        errors.push("target_weight must be a number".to_string());
        return None;
    };

    if target <= 0.0 {
        errors.push("target_weight must be greater than 0".to_string());
        return None;
    }
    match fish_type {
        Some(fish) if target > fish.max_target_weight() => {
            errors.push(format!(
                "target_weight for {} cannot exceed {}kg (max in dataset)",
                fish.label(),
                fish.max_target_weight()
            ));
            None
        }
        None if target > FALLBACK_TARGET_CEILING_KG => {
            errors.push(format!("target_weight cannot exceed {FALLBACK_TARGET_CEILING_KG}kg"));
            None
        }
        _ => Some(target),
    }
}

fn check_sequence(value: Option<&Value>, errors: &mut Vec<String>) -> Vec<ObservationRecord> {
    let items = match value {
        None | Some(Value::Null) => {
            errors.push("sequence is required".to_string());
            return Vec::new();
        }
        Some(Value::Array(items)) => items,
        Some(_) => {
            errors.push("sequence must be an array".to_string());
            return Vec::new();
        }
    };
    if items.is_empty() {
        errors.push("sequence is required".to_string());
        return Vec::new();
    }
    if items.len() < WINDOW_SIZE {
        errors.push(format!("sequence must contain at least {WINDOW_SIZE} data points"));
        return Vec::new();
    }
    if items.len() > MAX_SEQUENCE_LEN {
        errors.push(format!("sequence cannot exceed {MAX_SEQUENCE_LEN} data points"));
        return Vec::new();
    }

    let before = errors.len();
    let mut records = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match item.as_object() {
            Some(obj) => {
                if let Some(record) = check_record(i, obj, errors) {
                    records.push(record);
                }
            }
            None => errors.push(format!("sequence[{i}] must be an object")),
        }
    }

    if errors.len() == before {
        check_consecutive(&records, errors);
    }
    records
}

fn check_record(i: usize, obj: &Map<String, Value>, errors: &mut Vec<String>) -> Option<ObservationRecord> {
    let before = errors.len();
    for field in REQUIRED_FIELDS {
        if !obj.contains_key(field) {
            errors.push(format!("sequence[{i}] missing required field: {field}"));
        }
    }

    let date = obj.get("date").and_then(|v| check_date(i, v, errors));

    let fish_type = obj.get("fish_type").and_then(|v| {
        let parsed = v.as_str().and_then(FishType::from_label);
        if parsed.is_none() {
            errors.push(format!("sequence[{i}].fish_type must be one of: {}", fish_labels()));
        }
        parsed
    });

    let pool_type = match obj.get("pool_type") {
        None | Some(Value::Null) => Some(PoolType::default()),
        Some(v) => {
            let parsed = v.as_str().and_then(PoolType::from_label);
            if parsed.is_none() {
                let labels: Vec<&str> = PoolType::ALL.iter().map(|p| p.label()).collect();
                errors.push(format!("sequence[{i}].pool_type must be one of: {}", labels.join(", ")));
            }
            parsed
        }
    };

    let start_weight = check_numeric(i, "start_weight", obj, MAX_RECORD_WEIGHT_KG, "kg", errors);
    let avg_weight = check_numeric(i, "avg_weight", obj, MAX_RECORD_WEIGHT_KG, "kg", errors);
    let week_age = check_numeric(i, "week_age", obj, MAX_WEEK_AGE, " weeks", errors).and_then(|age| {
        if age.fract() != 0.0 {
            errors.push(format!("sequence[{i}].week_age must be a whole number"));
            None
        } else {
            Some(age as u32)
        }
    });

    if errors.len() != before {
        return None;
    }
    Some(ObservationRecord {
        date: date?,
        fish_type: fish_type?,
        pool_type: pool_type?,
        start_weight: start_weight?,
        avg_weight: avg_weight?,
        week_age: week_age?,
    })
}

fn check_date(i: usize, value: &Value, errors: &mut Vec<String>) -> Option<NaiveDate> {
    let text = value.as_str().unwrap_or_default();
    if !is_iso_date_shape(text) {
        errors.push(format!("sequence[{i}].date must be in YYYY-MM-DD format"));
        return None;
    }
    match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(format!("sequence[{i}].date is not a valid date"));
            None
        }
    }
}

/// `dddd-dd-dd` exactly.
fn is_iso_date_shape(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(pos, b)| match pos {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

fn check_numeric(
    i: usize,
    field: &str,
    obj: &Map<String, Value>,
    max: f64,
    unit: &str,
    errors: &mut Vec<String>,
) -> Option<f64> {
    let value = obj.get(field)?;
    let Some(n) = as_number(value) else {
        errors.push(format!("sequence[{i}].{field} must be a number"));
        return None;
    };
    if n < 0.0 {
        errors.push(format!("sequence[{i}].{field} must be non-negative"));
        None
    } else if n > max {
        errors.push(format!("sequence[{i}].{field} cannot exceed {max}{unit}"));
        None
    } else {
        Some(n)
    }
}

fn check_consecutive(records: &[ObservationRecord], errors: &mut Vec<String>) {
    for (i, pair) in records.windows(2).enumerate() {
        if pair[0].date.succ_opt() != Some(pair[1].date) {
            errors.push(format!(
                "sequence[{}].date must be the day after sequence[{i}].date",
                i + 1
            ));
        }
    }
}

/// Numbers, or strings holding a number.
fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

fn fish_labels() -> String {
    FishType::ALL.iter().map(|f| f.label()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sequence(n: usize) -> Value {
        let items: Vec<Value> = (0..n)
            .map(|i| {
                json!({
                    "date": format!("2024-03-{:02}", i + 1),
                    "fish_type": "Lele",
                    "pool_type": "biofloc",
                    "start_weight": 0.01,
                    "avg_weight": 0.1 + 0.01 * i as f64,
                    "week_age": 6
                })
            })
            .collect();
        Value::Array(items)
    }

    #[test]
    fn valid_request_converts() {
        let req = json!({"target_weight": 0.5, "fish_type": "Lele", "sequence": sequence(7)});
        let parsed = validate_request(&req).unwrap();
        assert_eq!(parsed.sequence.len(), 7);
        assert_eq!(parsed.fish_type, Some(FishType::Lele));
        assert_eq!(parsed.sequence[0].pool_type, PoolType::Biofloc);
    }

    #[test]
    fn species_ceiling_applies() {
        let req = json!({"target_weight": 0.5, "fish_type": "Gurame", "sequence": sequence(7)});
        let err = validate_request(&req).unwrap_err();
        assert_eq!(
            err.details(),
            vec!["target_weight for Gurame cannot exceed 0.3kg (max in dataset)".to_string()]
        );

        let req = json!({"target_weight": 12, "sequence": sequence(7)});
        assert_eq!(
            validate_request(&req).unwrap_err().details(),
            vec!["target_weight cannot exceed 10kg".to_string()]
        );
    }

    #[test]
    fn errors_are_collected() {
        let mut seq = sequence(7);
        seq[1]["date"] = json!("2024/03/02");
        seq[2]["fish_type"] = json!("Tuna");
        seq[3]["avg_weight"] = json!(-1.0);
        seq[4].as_object_mut().unwrap().remove("week_age");
        let req = json!({"target_weight": "abc", "sequence": seq});

        let details = validate_request(&req).unwrap_err().details();
        assert_eq!(details.len(), 5);
        assert_eq!(details[0], "target_weight must be a number");
        assert!(details.contains(&"sequence[1].date must be in YYYY-MM-DD format".to_string()));
        assert!(details.contains(&"sequence[3].avg_weight must be non-negative".to_string()));
        assert!(details.contains(&"sequence[4] missing required field: week_age".to_string()));
    }

    #[test]
    fn sequence_length_bounds() {
        let short = json!({"target_weight": 1.0, "sequence": sequence(6)});
        assert_eq!(
            validate_request(&short).unwrap_err().details(),
            vec!["sequence must contain at least 7 data points".to_string()]
        );
        let missing = json!({"target_weight": 1.0});
        assert_eq!(
            validate_request(&missing).unwrap_err().details(),
            vec!["sequence is required".to_string()]
        );
    }

    #[test]
    fn impossible_dates_and_gaps() {
        let mut seq = sequence(7);
        seq[6]["date"] = json!("2024-02-30");
        let req = json!({"target_weight": 1.0, "sequence": seq});
        assert_eq!(
            validate_request(&req).unwrap_err().details(),
            vec!["sequence[6].date is not a valid date".to_string()]
        );

        let mut seq = sequence(7);
        seq[6]["date"] = json!("2024-03-09");
        let req = json!({"target_weight": 1.0, "sequence": seq});
        assert_eq!(
            validate_request(&req).unwrap_err().details(),
            vec!["sequence[6].date must be the day after sequence[5].date".to_string()]
        );
    }

    #[test]
    fn pool_type_defaults_and_rejects_unknown() {
        let mut seq = sequence(7);
        seq[0].as_object_mut().unwrap().remove("pool_type");
        seq[1]["pool_type"] = json!("ocean");
        let req = json!({"target_weight": 1.0, "sequence": seq});
        let details = validate_request(&req).unwrap_err().details();
        assert_eq!(details.len(), 1);
        assert!(details[0].starts_with("sequence[1].pool_type must be one of"));
    }

    #[test]
    fn non_object_request() {
        assert!(validate_request(&json!([1, 2])).is_err());
    }
}
