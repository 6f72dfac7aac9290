//! Two-anchor interpolation curves.
//!
//! Each evaluator takes `(w_start, w_end, days)` and returns `days + 1` values,
//! one per day, inclusive of both anchors:
//!
//! - linear: `w(i) = w0 + (w1 - w0) * i / days`
//! - exponential: `w(i) = w0 * m^i` with `m = (w1 / w0)^(1 / days)`
//! - logistic: `w(t) = K / (1 + exp(-r (t - t0)))`, with `r` and `t0` solved
//!   from both anchors and the asymptote `K`
//!
//! Numerical notes:
//! - weights are floored at `WEIGHT_FLOOR` before any ratio or logit is taken.
//! - a logistic rate with `|r| < RATE_EPS` (equal anchors) is replaced by
//!   `RATE_CLAMP` so the inflection offset `t0 = A / r` stays finite.

use crate::error::AppError;

/// Minimum weight used in ratios and logits.
pub const WEIGHT_FLOOR: f64 = 1e-9;

/// Logistic rates below this magnitude are considered degenerate.
pub const RATE_EPS: f64 = 1e-12;

/// Replacement rate for degenerate logistic fits.
pub const RATE_CLAMP: f64 = 1e-6;

/// Default interpolation span: one week, seven points.
pub const DEFAULT_DAYS: usize = 6;

/// Decimal places kept by the linear and exponential curves.
pub const WEIGHT_DECIMALS: i32 = 2;

/// Decimal places kept by the logistic curve.
pub const LOGISTIC_DECIMALS: i32 = 6;

/// Round to `decimals` places, ties to even.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

fn check_days(days: usize) -> Result<(), AppError> {
    if days == 0 {
        return Err(AppError::invalid_input("Interpolation needs at least one day."));
    }
    Ok(())
}

pub fn linear(w_start: f64, w_end: f64, days: usize) -> Result<Vec<f64>, AppError> {
    check_days(days)?;
    let d = days as f64;
    Ok((0..=days)
        .map(|i| round_to(w_start + (w_end - w_start) * i as f64 / d, WEIGHT_DECIMALS))
        .collect())
}

/// Geometric interpolation between two weights.
pub fn exponential(w_start: f64, w_end: f64, days: usize) -> Result<Vec<f64>, AppError> {
    check_days(days)?;
    let w0 = w_start.max(WEIGHT_FLOOR);
    let w1 = w_end.max(WEIGHT_FLOOR);
    let m = (w1 / w0).powf(1.0 / days as f64);
    Ok((0..=days)
        .map(|i| round_to(w0 * m.powi(i as i32), WEIGHT_DECIMALS))
        .collect())
}

/// Fitted logistic parameters for two anchors under asymptote `k`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogisticParams {
    pub k: f64,
    pub r: f64,
    pub t0: f64,
}

impl LogisticParams {
    /// Solve `r` and `t0` so the curve passes through `w_start` at `t = 0`
    /// and `w_end` at `t = days`.
    pub fn solve(w_start: f64, w_end: f64, k: f64, days: usize) -> Result<Self, AppError> {
        check_days(days)?;
        let y0 = w_start.max(WEIGHT_FLOOR);
        let y1 = w_end.max(WEIGHT_FLOOR);
        if !(k.is_finite() && y0 < k && y1 < k) {
            return Err(AppError::invalid_input(format!(
                "Logistic endpoints must be below the asymptote (start={w_start}, end={w_end}, K={k})."
            )));
        }

        let a = (k / y0 - 1.0).ln();
        let b = (k / y1 - 1.0).ln();
        let mut r = (a - b) / days as f64;
        if r.abs() < RATE_EPS {
            r = RATE_CLAMP;
        }
        Ok(Self { k, r, t0: a / r })
    }

    pub fn eval(&self, t: f64) -> f64 {
        self.k / (1.0 + (-self.r * (t - self.t0)).exp())
    }
}

/// Logistic interpolation toward asymptote `k`.
pub fn logistic(w_start: f64, w_end: f64, k: f64, days: usize) -> Result<Vec<f64>, AppError> {
    let params = LogisticParams::solve(w_start, w_end, k, days)?;
    Ok((0..=days)
        .map(|i| round_to(params.eval(i as f64), LOGISTIC_DECIMALS))
        .collect())
}
