//! Feature column schema.
//!
//! Column order is part of the model contract. Any change to the order or the
//! categorical sets must bump `SCHEMA_VERSION`.
//!
//! ```text
//! day, month, week, day_of_year,            calendar (ISO week)
//! fish_type_<label> x5,                     one-hot, FishType::ALL order
//! pool_type_<label> x8,                     one-hot, PoolType::ALL order
//! week_age, start_weight                    carried numeric fields
//! ```
//!
//! `avg_weight` (the prediction target) and the raw date are not features.

use chrono::Datelike;

use crate::domain::{FishType, ObservationRecord, PoolType};
use crate::error::AppError;

pub const SCHEMA_VERSION: u32 = 1;

const CALENDAR_COLUMNS: [&str; 4] = ["day", "month", "week", "day_of_year"];
const NUMERIC_COLUMNS: [&str; 2] = ["week_age", "start_weight"];

/// Number of features per day.
pub const FEATURE_COUNT: usize =
    CALENDAR_COLUMNS.len() + FishType::ALL.len() + PoolType::ALL.len() + NUMERIC_COLUMNS.len();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    pub version: u32,
    columns: Vec<String>,
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::current()
    }
}

impl FeatureSchema {
    pub fn current() -> Self {
        let mut columns: Vec<String> = CALENDAR_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.extend(FishType::ALL.iter().map(|f| format!("fish_type_{}", f.label())));
        columns.extend(PoolType::ALL.iter().map(|p| format!("pool_type_{}", p.label())));
        columns.extend(NUMERIC_COLUMNS.iter().map(|c| c.to_string()));
        Self {
            version: SCHEMA_VERSION,
            columns,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Reject a column list that differs from this schema in any way.
    pub fn ensure_matches(&self, version: u32, columns: &[String]) -> Result<(), AppError> {
        if version != self.version {
            return Err(AppError::Schema(format!(
                "feature schema version {version} does not match compiled version {}",
                self.version
            )));
        }
        if columns != self.columns.as_slice() {
            let first_diff = columns
                .iter()
                .zip(self.columns.iter())
                .position(|(a, b)| a != b)
                .unwrap_or(columns.len().min(self.columns.len()));
            return Err(AppError::Schema(format!(
                "feature columns differ at position {first_diff} (got {} columns, expected {})",
                columns.len(),
                self.columns.len()
            )));
        }
        Ok(())
    }

    /// Unscaled feature row for one record.
    pub fn encode(&self, record: &ObservationRecord) -> Vec<f64> {
        let d = record.date;
        let mut row = Vec::with_capacity(self.width());
        row.push(d.day() as f64);
        row.push(d.month() as f64);
        row.push(d.iso_week().week() as f64);
        row.push(d.ordinal() as f64);
        row.extend(
            FishType::ALL
                .iter()
                .map(|&f| if f == record.fish_type { 1.0 } else { 0.0 }),
        );
        row.extend(
            PoolType::ALL
                .iter()
                .map(|&p| if p == record.pool_type { 1.0 } else { 0.0 }),
        );
        row.push(record.week_age as f64);
        row.push(record.start_weight);
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn schema_has_nineteen_columns() {
        let schema = FeatureSchema::current();
        assert_eq!(schema.width(), 19);
        assert_eq!(FEATURE_COUNT, 19);
        assert_eq!(schema.columns()[4], "fish_type_Bawal");
        assert_eq!(schema.columns()[7], "fish_type_Nila Merah");
        assert_eq!(schema.columns()[18], "start_weight");
    }

    #[test]
    fn encode_decomposes_calendar_and_one_hots() {
        let schema = FeatureSchema::current();
        let rec = ObservationRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            fish_type: FishType::Patin,
            pool_type: PoolType::Ras,
            start_weight: 0.05,
            avg_weight: 0.9,
            week_age: 20,
        };
        let row = schema.encode(&rec);
        assert_eq!(row.len(), 19);
        assert_eq!(&row[0..4], &[1.0, 1.0, 1.0, 1.0]);
        assert_eq!(&row[4..9], &[0.0, 0.0, 0.0, 0.0, 1.0]);
        assert_eq!(row[9 + 5], 1.0);
        assert_eq!(row[9..17].iter().sum::<f64>(), 1.0);
        assert_eq!(&row[17..], &[20.0, 0.05]);
        assert!(!row.contains(&0.9));
    }

    #[test]
    fn drifted_columns_are_rejected() {
        let schema = FeatureSchema::current();
        let mut cols = schema.columns().to_vec();
        assert!(schema.ensure_matches(1, &cols).is_ok());
        cols.swap(0, 1);
        assert!(matches!(schema.ensure_matches(1, &cols), Err(AppError::Schema(_))));
        assert!(matches!(schema.ensure_matches(2, schema.columns()), Err(AppError::Schema(_))));
    }
}
