//! Standardization with training-time statistics.
//!
//! `scaled = (x - mean) / scale`. A zero or non-finite scale is treated as 1
//! (constant columns, such as a one-hot never seen in training).

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl FeatureScaler {
    pub fn identity(width: usize) -> Self {
        Self {
            mean: vec![0.0; width],
            scale: vec![1.0; width],
        }
    }

    pub fn validate(&self, expected_width: usize) -> Result<(), AppError> {
        if self.mean.len() != expected_width || self.scale.len() != expected_width {
            return Err(AppError::Schema(format!(
                "feature scaler has {} means and {} scales, schema has {expected_width} columns",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(AppError::Schema("feature scaler mean contains non-finite values".into()));
        }
        Ok(())
    }

    pub fn transform_in_place(&self, row: &mut [f64]) {
        for ((x, &m), &s) in row.iter_mut().zip(&self.mean).zip(&self.scale) {
            let s = if s.is_finite() && s != 0.0 { s } else { 1.0 };
            *x = (*x - m) / s;
        }
    }
}

/// Scalar scaler for the model's output space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetScaler {
    pub mean: f64,
    pub scale: f64,
}

impl Default for TargetScaler {
    fn default() -> Self {
        Self::identity()
    }
}

impl TargetScaler {
    pub fn identity() -> Self {
        Self {
            mean: 0.0,
            scale: 1.0,
        }
    }

    pub fn inverse(&self, scaled: f64) -> f64 {
        scaled * self.effective_scale() + self.mean
    }

    fn effective_scale(&self) -> f64 {
        if self.scale.is_finite() && self.scale != 0.0 {
            self.scale
        } else {
            1.0
        }
    }
}
