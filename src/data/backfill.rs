//! Daily history backfill between known weights.
//!
//! Turns two (or more) weighed dates into one `ObservationRecord` per day so a
//! forecast can be seeded when only sparse weighings exist.

use chrono::Duration;
use tracing::debug;

use crate::curve::{select_for_anchors, weight_ratio};
use crate::domain::{BackfillSpec, CurveKind, ObservationRecord};
use crate::error::AppError;
use crate::math::{self, LogisticParams, MonotoneCubic, WEIGHT_DECIMALS, round_to};

/// Longest span a single backfill may cover.
pub const MAX_BACKFILL_DAYS: i64 = 365;

#[derive(Debug, Clone)]
pub struct Backfill {
    pub curve: CurveKind,
    pub ratio: f64,
    pub records: Vec<ObservationRecord>,
    /// True when the target was crossed before the end date.
    pub truncated: bool,
}

/// Build the daily sequence described by `spec`.
///
/// Emission stops on the first day whose interpolated weight is strictly
/// above the target; that day is not included. An empty sequence is a valid
/// outcome.
pub fn build_sequence(spec: &BackfillSpec) -> Result<Backfill, AppError> {
    validate_spec(spec)?;

    let days = (spec.end_date - spec.start_date).num_days() as usize;
    let anchors = spec.all_anchors();
    let ratio = weight_ratio(spec.start_weight, spec.end_weight)?;
    let curve = select_for_anchors(anchors.len(), ratio)?;

    let weights = match curve {
        CurveKind::Linear => math::linear(spec.start_weight, spec.end_weight, days)?,
        CurveKind::Exponential => math::exponential(spec.start_weight, spec.end_weight, days)?,
        // Raw curve values; records round once below.
        CurveKind::Logistic => {
            let params =
                LogisticParams::solve(spec.start_weight, spec.end_weight, spec.target_weight, days)?;
            (0..=days).map(|i| params.eval(i as f64)).collect()
        }
        CurveKind::MonotonicSpline => {
            let x: Vec<f64> = anchors
                .iter()
                .map(|a| (a.date - spec.start_date).num_days() as f64)
                .collect();
            let y: Vec<f64> = anchors.iter().map(|a| a.weight).collect();
            MonotoneCubic::new(&x, &y)?.daily()
        }
    };

    let start_weight = round_to(spec.initial_weight, WEIGHT_DECIMALS);
    let mut records = Vec::with_capacity(weights.len());
    let mut truncated = false;
    for (i, &weight) in weights.iter().enumerate() {
        if weight > spec.target_weight {
            truncated = true;
            break;
        }
        records.push(ObservationRecord {
            date: spec.start_date + Duration::days(i as i64),
            fish_type: spec.fish_type,
            pool_type: spec.pool_type,
            start_weight,
            avg_weight: round_to(weight, WEIGHT_DECIMALS),
            week_age: spec.week_age,
        });
    }

    debug!(
        curve = curve.display_name(),
        ratio,
        days,
        emitted = records.len(),
        truncated,
        "backfilled sequence"
    );

    Ok(Backfill {
        curve,
        ratio,
        records,
        truncated,
    })
}

fn validate_spec(spec: &BackfillSpec) -> Result<(), AppError> {
    let mut errors = Vec::new();

    if let Err(message) = validate_date_range(spec.start_date, spec.end_date) {
        errors.push(message);
    }
    for (name, value) in [
        ("initial_weight", spec.initial_weight),
        ("start_weight", spec.start_weight),
        ("end_weight", spec.end_weight),
        ("target_weight", spec.target_weight),
    ] {
        if !(value.is_finite() && value > 0.0) {
            errors.push(format!("{name} must be greater than 0"));
        }
    }
    for (i, anchor) in spec.anchors.iter().enumerate() {
        if !(anchor.date > spec.start_date && anchor.date < spec.end_date) {
            errors.push(format!("anchors[{i}].date must lie strictly between start_date and end_date"));
        }
        if !(anchor.weight.is_finite() && anchor.weight > 0.0) {
            errors.push(format!("anchors[{i}].weight must be greater than 0"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Check that `start < end` and the span is at most a year.
pub fn validate_date_range(
    start: chrono::NaiveDate,
    end: chrono::NaiveDate,
) -> Result<(), String> {
    if start >= end {
        return Err("start_date must be before end_date".to_string());
    }
    if (end - start).num_days() > MAX_BACKFILL_DAYS {
        return Err(format!("Date range cannot exceed {MAX_BACKFILL_DAYS} days"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Anchor, FishType, PoolType};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn week_spec(start_weight: f64, end_weight: f64, target_weight: f64) -> BackfillSpec {
        BackfillSpec {
            initial_weight: 0.051,
            start_weight,
            end_weight,
            start_date: date(2024, 1, 19),
            end_date: date(2024, 1, 25),
            target_weight,
            fish_type: FishType::NilaMerah,
            pool_type: PoolType::Earthen,
            week_age: 12,
            anchors: Vec::new(),
        }
    }

    #[test]
    fn linear_week_emits_seven_consecutive_days() {
        let out = build_sequence(&week_spec(0.22, 0.24, 1.0)).unwrap();
        assert_eq!(out.curve, CurveKind::Linear);
        assert_eq!(out.records.len(), 7);
        assert!(!out.truncated);
        for (i, rec) in out.records.iter().enumerate() {
            assert_eq!(rec.date, date(2024, 1, 19) + Duration::days(i as i64));
            assert_eq!(rec.start_weight, 0.05);
            assert_eq!(rec.week_age, 12);
        }
        assert_eq!(out.records[0].avg_weight, 0.22);
        assert_eq!(out.records[6].avg_weight, 0.24);
    }

    #[test]
    fn strong_growth_uses_logistic_under_target() {
        let out = build_sequence(&week_spec(0.2, 0.4, 1.0)).unwrap();
        assert_eq!(out.curve, CurveKind::Logistic);
        assert_eq!(out.records.len(), 7);
        assert!(out.records.iter().all(|r| r.avg_weight < 1.0));
    }

    #[test]
    fn crossing_day_is_excluded() {
        // Linear 1.00 -> 1.06: 1.00, 1.01, ..., 1.06; target 1.03 keeps four days.
        let out = build_sequence(&week_spec(1.0, 1.06, 1.03)).unwrap();
        assert_eq!(out.records.len(), 4);
        assert!(out.truncated);
        assert_eq!(out.records.last().unwrap().avg_weight, 1.03);
    }

    #[test]
    fn target_below_first_point_yields_empty_sequence() {
        let out = build_sequence(&week_spec(0.5, 0.52, 0.4)).unwrap();
        assert!(out.records.is_empty());
        assert!(out.truncated);
    }

    #[test]
    fn interior_anchor_switches_to_spline() {
        let mut spec = week_spec(0.2, 0.3, 1.0);
        spec.end_date = date(2024, 2, 2);
        spec.anchors = vec![Anchor {
            date: date(2024, 1, 26),
            weight: 0.26,
        }];
        let out = build_sequence(&spec).unwrap();
        assert_eq!(out.curve, CurveKind::MonotonicSpline);
        assert_eq!(out.records.len(), 15);
        assert_eq!(out.records[7].avg_weight, 0.26);
        for pair in out.records.windows(2) {
            assert!(pair[1].avg_weight >= pair[0].avg_weight);
        }
    }

    #[test]
    fn spline_weights_are_rounded_once() {
        // 0.2449 would become 0.245 and then 0.25 if rounded in two passes.
        let mut spec = week_spec(0.2, 0.3, 1.0);
        spec.end_date = date(2024, 2, 2);
        spec.anchors = vec![Anchor {
            date: date(2024, 1, 26),
            weight: 0.2449,
        }];
        let out = build_sequence(&spec).unwrap();
        assert_eq!(out.curve, CurveKind::MonotonicSpline);
        assert_eq!(out.records[7].avg_weight, 0.24);
        assert_eq!(out.records[14].avg_weight, 0.3);
    }

    #[test]
    fn rejects_inverted_and_oversized_ranges() {
        let mut spec = week_spec(0.2, 0.3, 1.0);
        spec.end_date = spec.start_date;
        assert!(matches!(build_sequence(&spec), Err(AppError::Validation(_))));

        spec.end_date = date(2025, 6, 1);
        let err = build_sequence(&spec).unwrap_err();
        assert_eq!(err.details(), vec!["Date range cannot exceed 365 days".to_string()]);
    }
}
