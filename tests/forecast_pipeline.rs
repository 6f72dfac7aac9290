use std::io::Write;
use std::sync::Mutex;

use approx::assert_abs_diff_eq;
use chrono::NaiveDate;
use nalgebra::DMatrix;
use serde_json::{Value, json};

use growth_curves::app::limiter::RateLimiter;
use growth_curves::app::pipeline::{ForecastService, LOCAL_CLIENT};
use growth_curves::data::build_sequence;
use growth_curves::domain::{BackfillSpec, CurveKind, FishType, ObservationRecord, PoolType, RunState};
use growth_curves::error::AppError;
use growth_curves::features::{FeatureSchema, FeatureTransform};
use growth_curves::forecast::{ForecastDriver, ForecastOptions};
use growth_curves::models::load_model;

fn week_backfill() -> Vec<ObservationRecord> {
    let spec = BackfillSpec {
        initial_weight: 0.05,
        start_weight: 0.30,
        end_weight: 0.32,
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
        target_weight: 1.0,
        fish_type: FishType::NilaMerah,
        pool_type: PoolType::Earthen,
        week_age: 12,
        anchors: Vec::new(),
    };
    let backfill = build_sequence(&spec).unwrap();
    assert_eq!(backfill.curve, CurveKind::Linear);
    backfill.records
}

fn request_json(records: &[ObservationRecord], target: f64) -> Value {
    json!({
        "target_weight": target,
        "fish_type": "Nila Merah",
        "sequence": serde_json::to_value(records).unwrap(),
    })
}

#[test]
fn backfilled_history_seeds_a_forecast() {
    let records = week_backfill();
    assert_eq!(records.len(), 7);
    assert_abs_diff_eq!(records[6].avg_weight, 0.32);

    let current = Mutex::new(records[6].avg_weight);
    let model = move |_: &DMatrix<f64>| {
        let mut w = current.lock().unwrap();
        *w += 0.05;
        Ok::<f64, AppError>(*w)
    };
    let transform = FeatureTransform::default();
    let run = ForecastDriver::new(&model, &transform, &records, 0.5, ForecastOptions::default())
        .unwrap()
        .run()
        .unwrap();

    let expected = ((0.5 - 0.32) / 0.05_f64).ceil() as usize;
    assert_eq!(run.state, RunState::TargetReached);
    assert_eq!(run.predictions.len(), expected);
    assert_eq!(run.summary().days_to_reach_target, Some(expected));
    assert_eq!(
        run.predictions[0].date,
        NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()
    );
}

#[test]
fn linear_readout_model_file_drives_the_service() {
    let schema = FeatureSchema::current();
    let mut coefficients = vec![0.0; schema.width()];
    // Scaled prediction grows with week_age.
    coefficients[17] = 0.01;
    let model = json!({
        "schema_version": 1,
        "feature_columns": schema.columns(),
        "target_scaler": {"mean": 0.3, "scale": 1.0},
        "coefficients": coefficients,
        "intercept": 0.0
    });
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(model.to_string().as_bytes()).unwrap();

    let loaded = load_model(file.path()).unwrap();
    let service = ForecastService::from_loaded(loaded, ForecastOptions::default(), RateLimiter::new(10));

    // 0.3 + 0.01 * 12 = 0.42 on day one.
    let out = service
        .handle(LOCAL_CLIENT, &request_json(&week_backfill(), 0.4))
        .unwrap();
    assert_eq!(out.response.predictions.len(), 1);
    assert_abs_diff_eq!(out.response.predictions[0].predicted_weight, 0.42, epsilon = 1e-9);
    assert_eq!(out.response.metadata.input_data.sequences_shape, [1, 7, 19]);
}

#[test]
fn drifted_model_file_is_rejected() {
    let schema = FeatureSchema::current();
    let mut columns = schema.columns().to_vec();
    columns.reverse();
    let model = json!({
        "schema_version": 1,
        "feature_columns": columns,
        "coefficients": vec![0.0; schema.width()],
        "intercept": 0.0
    });
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(model.to_string().as_bytes()).unwrap();

    assert!(matches!(load_model(file.path()), Err(AppError::Schema(_))));
}

#[test]
fn batch_reports_three_successes_and_two_failures() {
    let records = week_backfill();
    let model = |_: &DMatrix<f64>| Ok::<f64, AppError>(0.6);
    let service = ForecastService::new(
        model,
        FeatureTransform::default(),
        ForecastOptions::default(),
        RateLimiter::new(10),
    );

    let mut short = request_json(&records, 0.5);
    short["sequence"].as_array_mut().unwrap().truncate(5);
    let requests = vec![
        request_json(&records, 0.5),
        request_json(&records, 3.0),
        request_json(&records, 0.55),
        short,
        request_json(&records, 0.59),
    ];

    let batch = service.batch(LOCAL_CLIENT, &requests).unwrap();
    assert_eq!(batch.total_requests, 5);
    assert_eq!(batch.successful_requests, 3);

    let ok: Vec<usize> = batch.results.iter().filter(|r| r.success).map(|r| r.request_id).collect();
    assert_eq!(ok, vec![0, 2, 4]);
    assert_eq!(
        batch.results[1].details,
        vec!["target_weight for Nila Merah cannot exceed 2.5kg (max in dataset)".to_string()]
    );
    assert_eq!(
        batch.results[3].details,
        vec!["sequence must contain at least 7 data points".to_string()]
    );
    for r in batch.results.iter().filter(|r| r.success) {
        let data = r.data.as_ref().unwrap();
        assert_eq!(data.summary.days_to_reach_target, Some(1));
        assert_eq!(data.summary.current_weight, 0.32);
    }
}
