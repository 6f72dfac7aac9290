//! Shape-preserving piecewise cubic Hermite interpolation (PCHIP).
//!
//! Slopes follow Fritsch–Carlson with the weighted harmonic mean at interior
//! knots, so the interpolant never overshoots between monotone anchors.
//! Queries outside `[x_first, x_last]` return `NaN`; there is no extrapolation.

use crate::error::AppError;

/// Minimum anchor count for the spline family.
pub const MIN_SPLINE_ANCHORS: usize = 3;

#[derive(Debug, Clone)]
pub struct MonotoneCubic {
    x: Vec<f64>,
    y: Vec<f64>,
    slopes: Vec<f64>,
}

impl MonotoneCubic {
    /// Build the interpolant. `x` must be strictly increasing and finite.
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, AppError> {
        if x.len() != y.len() {
            return Err(AppError::invalid_input(format!(
                "Spline anchors length mismatch: {} times vs {} values.",
                x.len(),
                y.len()
            )));
        }
        if x.len() < MIN_SPLINE_ANCHORS {
            return Err(AppError::invalid_input(format!(
                "Monotonic spline needs at least {MIN_SPLINE_ANCHORS} anchors, got {}.",
                x.len()
            )));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(AppError::invalid_input("Spline anchors must be finite."));
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(AppError::invalid_input(
                "Spline anchor times must be strictly increasing.",
            ));
        }

        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            slopes: pchip_slopes(x, y),
        })
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    /// Evaluate at `xq`; `NaN` outside the anchor range.
    pub fn value(&self, xq: f64) -> f64 {
        let (lo, hi) = self.domain();
        if !(xq >= lo && xq <= hi) {
            return f64::NAN;
        }
        let idx = self.x.partition_point(|v| *v <= xq);
        let i = idx.saturating_sub(1).min(self.x.len() - 2);
        hermite_eval(
            self.x[i],
            self.x[i + 1],
            self.y[i],
            self.y[i + 1],
            self.slopes[i],
            self.slopes[i + 1],
            xq,
        )
    }

    /// One unrounded value per integer step from the first to the last anchor.
    pub fn daily(&self) -> Vec<f64> {
        let (lo, hi) = self.domain();
        let start = lo.ceil() as i64;
        let end = hi.floor() as i64;
        (start..=end).map(|t| self.value(t as f64)).collect()
    }
}

fn pchip_slopes(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut h = vec![0.0; n - 1];
    let mut delta = vec![0.0; n - 1];
    for i in 0..(n - 1) {
        h[i] = x[i + 1] - x[i];
        delta[i] = (y[i + 1] - y[i]) / h[i];
    }

    let mut d = vec![0.0; n];
    for k in 1..(n - 1) {
        if delta[k - 1] * delta[k] <= 0.0 {
            d[k] = 0.0;
        } else {
            let w1 = 2.0 * h[k] + h[k - 1];
            let w2 = h[k] + 2.0 * h[k - 1];
            d[k] = (w1 + w2) / (w1 / delta[k - 1] + w2 / delta[k]);
        }
    }

    d[0] = end_slope(h[0], h[1], delta[0], delta[1]);
    d[n - 1] = end_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    d
}

/// Three-point end slope, limited so the end interval stays monotone.
fn end_slope(h0: f64, h1: f64, m0: f64, m1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * m0 - h0 * m1) / (h0 + h1);
    if d.signum() != m0.signum() || m0 == 0.0 {
        0.0
    } else if m0.signum() != m1.signum() && d.abs() > 3.0 * m0.abs() {
        3.0 * m0
    } else {
        d
    }
}

#[inline]
fn hermite_eval(x0: f64, x1: f64, y0: f64, y1: f64, m0: f64, m1: f64, xq: f64) -> f64 {
    let h = x1 - x0;
    let s = (xq - x0) / h;
    let s2 = s * s;
    let s3 = s2 * s;

    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;

    h00 * y0 + h10 * h * m0 + h01 * y1 + h11 * h * m1
}
