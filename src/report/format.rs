//! Formatted terminal output.
//!
//! Formatting lives here so the math and forecast code stay free of
//! presentation concerns, and output changes stay local.

use crate::app::pipeline::{BatchResponse, ForecastResponse};
use crate::data::Backfill;
use crate::domain::{CurveKind, ObservationRecord, Prediction, RunState};

/// Rows shown at each end of a long prediction table.
const TABLE_EDGE_ROWS: usize = 10;

/// Run header plus summary block for one forecast.
pub fn format_forecast_summary(response: &ForecastResponse, state: RunState) -> String {
    let s = &response.summary;
    let meta = &response.metadata;
    let mut out = String::new();

    out.push_str("=== grow - Fish Growth Forecast ===\n");
    out.push_str(&format!("Model: {}\n", meta.model_type));
    out.push_str(&format!(
        "Input: {} records | tensor={:?}\n",
        meta.input_data.sequence_length, meta.input_data.sequences_shape
    ));
    out.push_str(&format!(
        "Weight: current={:.4} kg | target={:.4} kg | final={:.4} kg\n",
        s.current_weight, s.target_weight, s.final_predicted_weight
    ));
    let outcome = match (state, s.days_to_reach_target) {
        (RunState::TargetReached, Some(days)) => format!("target reached in {days} days"),
        (RunState::HorizonExceeded, _) => {
            format!("target not reached within {} days", s.total_predictions)
        }
        _ => "running".to_string(),
    };
    out.push_str(&format!("Outcome: {outcome}\n"));
    out
}

/// Day-by-day table; long runs show only the first and last rows.
pub fn format_predictions(predictions: &[Prediction]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>5} {:<10} {:>10} {:>6}\n", "day", "date", "weight", "target"));
    out.push_str(&format!("{:->5} {:-<10} {:->10} {:->6}\n", "", "", "", ""));

    let row = |p: &Prediction| {
        let mark = if p.days_to_target.is_some() { "yes" } else { "" };
        format!("{:>5} {:<10} {:>10.4} {:>6}", p.day, p.date, p.predicted_weight, mark)
            .trim_end()
            .to_string()
    };

    if predictions.len() <= 2 * TABLE_EDGE_ROWS {
        for p in predictions {
            out.push_str(&row(p));
            out.push('\n');
        }
    } else {
        for p in &predictions[..TABLE_EDGE_ROWS] {
            out.push_str(&row(p));
            out.push('\n');
        }
        out.push_str(&format!(
            "  ... {} more days ...\n",
            predictions.len() - 2 * TABLE_EDGE_ROWS
        ));
        for p in &predictions[predictions.len() - TABLE_EDGE_ROWS..] {
            out.push_str(&row(p));
            out.push('\n');
        }
    }
    out
}

pub fn format_batch(batch: &BatchResponse) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Batch: {}/{} requests succeeded\n",
        batch.successful_requests, batch.total_requests
    ));
    for r in &batch.results {
        match (&r.data, &r.error) {
            (Some(data), _) => {
                let days = data
                    .summary
                    .days_to_reach_target
                    .map(|d| format!("{d} days"))
                    .unwrap_or_else(|| "not reached".to_string());
                out.push_str(&format!(
                    "  [{}] ok    target={:.3} kg -> {days}\n",
                    r.request_id, data.summary.target_weight
                ));
            }
            (None, error) => {
                out.push_str(&format!(
                    "  [{}] error {}\n",
                    r.request_id,
                    error.as_deref().unwrap_or("unknown error")
                ));
                for d in &r.details {
                    out.push_str(&format!("        - {d}\n"));
                }
            }
        }
    }
    out
}

pub fn format_backfill(backfill: &Backfill) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Curve: {} (ratio={:.2}) | records={}{}\n",
        backfill.curve.display_name(),
        backfill.ratio,
        backfill.records.len(),
        if backfill.truncated { " | truncated at target" } else { "" }
    ));
    out.push_str(&format_records(&backfill.records));
    out
}

fn format_records(records: &[ObservationRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<10} {:>10} {:>8}\n", "date", "avg_weight", "week_age"));
    for r in records {
        out.push_str(&format!("{:<10} {:>10.2} {:>8}\n", r.date, r.avg_weight, r.week_age));
    }
    out
}

pub fn format_curve(kind: CurveKind, values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("{}: [{}]\n", kind.display_name(), parts.join(", "))
}
