//! Ratio-bracket curve selection.
//!
//! The ratio `end / start` (rounded to 2 dp) picks the family:
//!
//! ```text
//! growth  (r > 1):  r <= 1.10 linear | r <= 1.30 exponential | else logistic
//! decline (r <= 1): r >= 0.90 linear | r >= 0.70 exponential | else logistic
//! ```
//!
//! With three or more anchors the monotonic spline is used instead, whatever
//! the ratio.

use crate::domain::CurveKind;
use crate::error::AppError;
use crate::math::{MIN_SPLINE_ANCHORS, round_to};

const GROWTH_LINEAR_MAX: f64 = 1.10;
const GROWTH_EXPONENTIAL_MAX: f64 = 1.30;
const DECLINE_LINEAR_MIN: f64 = 0.90;
const DECLINE_EXPONENTIAL_MIN: f64 = 0.70;

/// Decimal places the ratio is rounded to before bracketing.
const RATIO_DECIMALS: i32 = 2;

/// `end / start`, rounded so bracket edges are not lost to float noise.
pub fn weight_ratio(start_weight: f64, end_weight: f64) -> Result<f64, AppError> {
    if !(start_weight.is_finite() && end_weight.is_finite() && start_weight > 0.0 && end_weight > 0.0) {
        return Err(AppError::invalid_input(format!(
            "Anchor weights must be finite and > 0 (start={start_weight}, end={end_weight})."
        )));
    }
    Ok(round_to(end_weight / start_weight, RATIO_DECIMALS))
}

/// Pick the curve family for a two-anchor ratio.
pub fn select_curve(ratio: f64) -> Result<CurveKind, AppError> {
    if !(ratio.is_finite() && ratio > 0.0) {
        return Err(AppError::invalid_input(format!(
            "Weight ratio must be finite and > 0, got {ratio}."
        )));
    }

    let kind = if ratio > 1.0 {
        if ratio <= GROWTH_LINEAR_MAX {
            CurveKind::Linear
        } else if ratio <= GROWTH_EXPONENTIAL_MAX {
            CurveKind::Exponential
        } else {
            CurveKind::Logistic
        }
    } else if ratio >= DECLINE_LINEAR_MIN {
        CurveKind::Linear
    } else if ratio >= DECLINE_EXPONENTIAL_MIN {
        CurveKind::Exponential
    } else {
        CurveKind::Logistic
    };
    Ok(kind)
}

/// Pick the curve family given how many anchors are known.
pub fn select_for_anchors(anchor_count: usize, ratio: f64) -> Result<CurveKind, AppError> {
    if anchor_count >= MIN_SPLINE_ANCHORS {
        return Ok(CurveKind::MonotonicSpline);
    }
    select_curve(ratio)
}
