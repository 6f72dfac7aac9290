//! Autoregressive forecast driver.
//!
//! Each step feeds the newest `W`-record window through the feature transform
//! and the model, appends the predicted day to the window and evicts the
//! oldest one. The loop ends when the prediction reaches the target
//! (`TargetReached`) or the safety horizon runs out (`HorizonExceeded`).
//!
//! A failing step aborts the whole run: the caller gets `ForecastFailed` and
//! no predictions.

use tracing::{debug, error, info};

use crate::domain::{
    DEFAULT_SAFETY_HORIZON, ForecastSummary, ObservationRecord, Prediction, RunState, WINDOW_SIZE,
};
use crate::error::AppError;
use crate::features::FeatureTransform;
use crate::math::round_to;
use crate::models::{GrowthModel, predict_weight};

/// Decimal places kept on recorded predictions.
pub const PREDICTION_DECIMALS: i32 = 4;

/// Per-run limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastOptions {
    safety_horizon: usize,
}

impl Default for ForecastOptions {
    fn default() -> Self {
        Self {
            safety_horizon: DEFAULT_SAFETY_HORIZON,
        }
    }
}

impl ForecastOptions {
    /// Lower the safety horizon. Values above the default are rejected; use
    /// `with_horizon_override` to raise it.
    pub fn with_horizon(horizon: usize) -> Result<Self, AppError> {
        if horizon == 0 || horizon > DEFAULT_SAFETY_HORIZON {
            return Err(AppError::validation(format!(
                "horizon must be between 1 and {DEFAULT_SAFETY_HORIZON} days"
            )));
        }
        Ok(Self {
            safety_horizon: horizon,
        })
    }

    /// Set any positive horizon, including ones above the default.
    pub fn with_horizon_override(horizon: usize) -> Self {
        Self {
            safety_horizon: horizon.max(1),
        }
    }

    pub fn safety_horizon(&self) -> usize {
        self.safety_horizon
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRun {
    pub target_weight: f64,
    /// The `W` seed records the run started from.
    pub seed_window: Vec<ObservationRecord>,
    pub predictions: Vec<Prediction>,
    pub safety_horizon: usize,
    pub state: RunState,
}

impl ForecastRun {
    pub fn summary(&self) -> ForecastSummary {
        let current_weight = self.seed_window.last().map(|r| r.avg_weight).unwrap_or(0.0);
        ForecastSummary {
            days_to_reach_target: self.predictions.iter().find_map(|p| p.days_to_target),
            target_weight: self.target_weight,
            current_weight,
            final_predicted_weight: self
                .predictions
                .last()
                .map(|p| p.predicted_weight)
                .unwrap_or(current_weight),
            target_reached: self.state == RunState::TargetReached,
            total_predictions: self.predictions.len(),
        }
    }
}

pub struct ForecastDriver<'a> {
    model: &'a dyn GrowthModel,
    transform: &'a FeatureTransform,
    target_weight: f64,
    safety_horizon: usize,
    seed_age: u32,
    seed_window: Vec<ObservationRecord>,
    window: Vec<ObservationRecord>,
    predictions: Vec<Prediction>,
    day: usize,
    state: RunState,
}

impl<'a> ForecastDriver<'a> {
    /// Start a run from the last `W` records of `seed`.
    ///
    /// The seed is copied; the caller's slice is never touched.
    pub fn new(
        model: &'a dyn GrowthModel,
        transform: &'a FeatureTransform,
        seed: &[ObservationRecord],
        target_weight: f64,
        options: ForecastOptions,
    ) -> Result<Self, AppError> {
        if !(target_weight.is_finite() && target_weight > 0.0) {
            return Err(AppError::validation("target_weight must be greater than 0"));
        }
        let w = transform.window();
        if seed.len() < w {
            return Err(AppError::validation(format!(
                "sequence must contain at least {w} records, got {}",
                seed.len()
            )));
        }

        let window = seed[seed.len() - w..].to_vec();
        check_contiguous(&window)?;
        let seed_age = window[w - 1].week_age;

        Ok(Self {
            model,
            transform,
            target_weight,
            safety_horizon: options.safety_horizon(),
            seed_age,
            seed_window: window.clone(),
            window,
            predictions: Vec::new(),
            day: 0,
            state: RunState::Running,
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn window(&self) -> &[ObservationRecord] {
        &self.window
    }

    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    /// Advance one day. Calling this on a finished run is a no-op.
    pub fn step(&mut self) -> Result<RunState, AppError> {
        if self.state.is_terminal() {
            return Ok(self.state);
        }
        let day = self.day + 1;

        let (value, record) = self.next_record(day).map_err(|e| {
            let first = self.window.first().map(|r| r.date);
            let last = self.window.last().map(|r| r.date);
            error!(day, ?first, ?last, error = %e, "forecast step failed");
            e.at_day(day)
        })?;

        let date = record.date;
        self.window.remove(0);
        self.window.push(record);

        let reached = value >= self.target_weight;
        self.predictions.push(Prediction {
            day,
            predicted_weight: round_to(value, PREDICTION_DECIMALS),
            date,
            days_to_target: reached.then_some(day),
        });
        self.day = day;

        debug!(
            day,
            predicted = value,
            window_start = %self.window[0].date,
            window_end = %date,
            "forecast step"
        );

        self.state = if reached {
            RunState::TargetReached
        } else if day >= self.safety_horizon {
            RunState::HorizonExceeded
        } else {
            RunState::Running
        };
        Ok(self.state)
    }

    /// Step until a terminal state and hand back the finished run.
    pub fn run(mut self) -> Result<ForecastRun, AppError> {
        while !self.step()?.is_terminal() {}
        info!(
            state = ?self.state,
            days = self.day,
            target = self.target_weight,
            "forecast finished"
        );
        Ok(ForecastRun {
            target_weight: self.target_weight,
            seed_window: self.seed_window,
            predictions: self.predictions,
            safety_horizon: self.safety_horizon,
            state: self.state,
        })
    }

    fn next_record(&self, day: usize) -> Result<(f64, ObservationRecord), AppError> {
        check_contiguous(&self.window)?;
        let tensor = self.transform.transform(&self.window)?;
        let features = tensor
            .latest()
            .ok_or_else(|| AppError::Schema("feature transform produced no windows".into()))?;
        let value = predict_weight(self.model, features)?;

        let last = &self.window[self.window.len() - 1];
        let date = last
            .date
            .succ_opt()
            .ok_or_else(|| AppError::invalid_input("forecast date out of range"))?;
        let record = ObservationRecord {
            date,
            fish_type: last.fish_type,
            pool_type: last.pool_type,
            start_weight: last.start_weight,
            avg_weight: value,
            week_age: self.seed_age + (day / 7) as u32,
        };
        Ok((value, record))
    }
}

fn check_contiguous(window: &[ObservationRecord]) -> Result<(), AppError> {
    if window.len() != WINDOW_SIZE {
        return Err(AppError::Schema(format!(
            "window holds {} records, expected {WINDOW_SIZE}",
            window.len()
        )));
    }
    for pair in window.windows(2) {
        if pair[0].date.succ_opt() != Some(pair[1].date) {
            return Err(AppError::validation(format!(
                "window dates must be consecutive: {} is followed by {}",
                pair[0].date, pair[1].date
            )));
        }
    }
    Ok(())
}
