//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - read from request files (JSON / CSV)
//! - used in-memory while backfilling and forecasting
//! - exported to JSON/CSV

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Number of daily records the model consumes per prediction.
pub const WINDOW_SIZE: usize = 7;

/// Hard cap on forecast iterations.
pub const DEFAULT_SAFETY_HORIZON: usize = 365;

/// Target ceiling applied when the fish type has no dedicated ceiling.
pub const FALLBACK_TARGET_CEILING_KG: f64 = 10.0;

/// Species tracked by the farm. Closed set; the one-hot order is `ALL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum FishType {
    Bawal,
    Gurame,
    Lele,
    #[serde(rename = "Nila Merah")]
    #[value(name = "nila-merah")]
    NilaMerah,
    Patin,
}

impl FishType {
    pub const ALL: [FishType; 5] = [
        FishType::Bawal,
        FishType::Gurame,
        FishType::Lele,
        FishType::NilaMerah,
        FishType::Patin,
    ];

    /// Label as it appears in request files.
    pub fn label(self) -> &'static str {
        match self {
            FishType::Bawal => "Bawal",
            FishType::Gurame => "Gurame",
            FishType::Lele => "Lele",
            FishType::NilaMerah => "Nila Merah",
            FishType::Patin => "Patin",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.label() == label)
    }

    /// Largest harvest weight (kg) seen for this species.
    pub fn max_target_weight(self) -> f64 {
        match self {
            FishType::NilaMerah => 2.5,
            FishType::Patin => 3.0,
            FishType::Lele => 2.0,
            FishType::Bawal => 1.5,
            FishType::Gurame => 0.3,
        }
    }
}

/// Rearing environment of the pool a record was measured in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PoolType {
    Biofloc,
    Concrete,
    #[default]
    Earthen,
    FloatingCage,
    Paddy,
    Ras,
    RunningWater,
    Tarpaulin,
}

impl PoolType {
    pub const ALL: [PoolType; 8] = [
        PoolType::Biofloc,
        PoolType::Concrete,
        PoolType::Earthen,
        PoolType::FloatingCage,
        PoolType::Paddy,
        PoolType::Ras,
        PoolType::RunningWater,
        PoolType::Tarpaulin,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PoolType::Biofloc => "biofloc",
            PoolType::Concrete => "concrete",
            PoolType::Earthen => "earthen",
            PoolType::FloatingCage => "floating_cage",
            PoolType::Paddy => "paddy",
            PoolType::Ras => "ras",
            PoolType::RunningWater => "running_water",
            PoolType::Tarpaulin => "tarpaulin",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.label() == label)
    }
}

/// Interpolation curve family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CurveKind {
    Linear,
    Exponential,
    /// Logistic growth toward an asymptote `K`.
    Logistic,
    /// Shape-preserving piecewise cubic over three or more anchors.
    MonotonicSpline,
}

impl CurveKind {
    pub fn display_name(self) -> &'static str {
        match self {
            CurveKind::Linear => "linear",
            CurveKind::Exponential => "exponential",
            CurveKind::Logistic => "logistic",
            CurveKind::MonotonicSpline => "monotonic-spline",
        }
    }
}

/// One day's state of a tracked fish cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub date: NaiveDate,
    pub fish_type: FishType,
    #[serde(default)]
    pub pool_type: PoolType,
    /// Weight (kg) at the start of the tracked lifetime; constant across a sequence.
    pub start_weight: f64,
    /// Measured or predicted weight (kg) on `date`.
    pub avg_weight: f64,
    pub week_age: u32,
}

/// A known `(date, weight)` pair used as an interpolation boundary condition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub date: NaiveDate,
    pub weight: f64,
}

/// One forecast day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub day: usize,
    pub predicted_weight: f64,
    pub date: NaiveDate,
    /// Set to `day` on the day the target is reached, `None` otherwise.
    pub days_to_target: Option<usize>,
}

/// Forecast loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Running,
    TargetReached,
    HorizonExceeded,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunState::Running)
    }
}

/// Read-only digest of a completed forecast run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub days_to_reach_target: Option<usize>,
    pub target_weight: f64,
    /// Last known (seed) weight.
    pub current_weight: f64,
    pub final_predicted_weight: f64,
    pub target_reached: bool,
    pub total_predictions: usize,
}

/// A validated forecast request.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub target_weight: f64,
    /// Request-level fish type used for the target ceiling, if supplied.
    pub fish_type: Option<FishType>,
    pub sequence: Vec<ObservationRecord>,
}

/// Inputs for backfilling a daily history between known weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackfillSpec {
    /// Weight at stocking, copied to every record's `start_weight`.
    pub initial_weight: f64,
    pub start_weight: f64,
    pub end_weight: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub target_weight: f64,
    pub fish_type: FishType,
    #[serde(default)]
    pub pool_type: PoolType,
    pub week_age: u32,
    /// Extra interior anchors. With three or more anchors in total the
    /// monotonic spline replaces the ratio-based curve choice.
    #[serde(default)]
    pub anchors: Vec<Anchor>,
}

impl BackfillSpec {
    /// All anchors ordered by date: start, interior, end.
    pub fn all_anchors(&self) -> Vec<Anchor> {
        let mut out = Vec::with_capacity(self.anchors.len() + 2);
        out.push(Anchor {
            date: self.start_date,
            weight: self.start_weight,
        });
        out.extend(self.anchors.iter().copied());
        out.push(Anchor {
            date: self.end_date,
            weight: self.end_weight,
        });
        out.sort_by_key(|a| a.date);
        out
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags and environment (plus defaults).
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    pub model_path: PathBuf,
    pub safety_horizon: usize,
    /// Permit a horizon above `DEFAULT_SAFETY_HORIZON`.
    pub allow_long_horizon: bool,
    /// Requests per client per hour.
    pub rate_limit: u32,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fish_type_labels_round_trip() {
        for fish in FishType::ALL {
            assert_eq!(FishType::from_label(fish.label()), Some(fish));
        }
        assert_eq!(FishType::from_label("Tuna"), None);
    }

    #[test]
    fn record_pool_type_defaults_when_missing() {
        let json = r#"{"date":"2024-01-19","fish_type":"Nila Merah","start_weight":0.05,"avg_weight":0.22,"week_age":12}"#;
        let rec: ObservationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.fish_type, FishType::NilaMerah);
        assert_eq!(rec.pool_type, PoolType::Earthen);
        assert_eq!(rec.date, NaiveDate::from_ymd_opt(2024, 1, 19).unwrap());
    }

    #[test]
    fn backfill_anchors_are_date_ordered() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        let spec = BackfillSpec {
            initial_weight: 0.05,
            start_weight: 0.2,
            end_weight: 0.4,
            start_date: d(1),
            end_date: d(15),
            target_weight: 1.0,
            fish_type: FishType::Lele,
            pool_type: PoolType::Tarpaulin,
            week_age: 8,
            anchors: vec![Anchor { date: d(8), weight: 0.3 }],
        };
        let dates: Vec<_> = spec.all_anchors().iter().map(|a| a.date).collect();
        assert_eq!(dates, vec![d(1), d(8), d(15)]);
    }
}
