//! Linear readout model loaded from a JSON file.
//!
//! The file carries everything needed at inference time:
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "feature_columns": ["day", "month", ...],
//!   "feature_scaler": { "mean": [...], "scale": [...] },
//!   "target_scaler": { "mean": 0.8, "scale": 0.4 },
//!   "coefficients": [...],
//!   "intercept": 0.0
//! }
//! ```
//!
//! Prediction is `intercept + coefficients · x_last` in scaled space, where
//! `x_last` is the newest row of the window.

use std::fs::File;
use std::path::Path;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::features::{FeatureScaler, FeatureSchema, FeatureTransform, TargetScaler};
use crate::models::{GrowthModel, ModelInfo};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearReadoutFile {
    pub schema_version: u32,
    pub feature_columns: Vec<String>,
    #[serde(default)]
    pub feature_scaler: Option<FeatureScaler>,
    #[serde(default)]
    pub target_scaler: Option<TargetScaler>,
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

#[derive(Debug, Clone)]
pub struct LinearReadout {
    coefficients: DVector<f64>,
    intercept: f64,
    target: TargetScaler,
}

impl LinearReadout {
    pub fn new(coefficients: Vec<f64>, intercept: f64, target: TargetScaler) -> Self {
        Self {
            coefficients: DVector::from_vec(coefficients),
            intercept,
            target,
        }
    }
}

impl GrowthModel for LinearReadout {
    fn predict(&self, window: &DMatrix<f64>) -> Result<f64, AppError> {
        if window.nrows() == 0 {
            return Err(AppError::Schema("empty feature window".into()));
        }
        if window.ncols() != self.coefficients.len() {
            return Err(AppError::Schema(format!(
                "window has {} features, model expects {}",
                window.ncols(),
                self.coefficients.len()
            )));
        }
        let last = window.row(window.nrows() - 1);
        Ok(self.intercept + last.transpose().dot(&self.coefficients))
    }

    fn target_scaler(&self) -> TargetScaler {
        self.target
    }

    fn info(&self) -> ModelInfo {
        ModelInfo::new("Linear readout growth model")
    }
}

/// A model together with the feature transform it was trained against.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub model: LinearReadout,
    pub transform: FeatureTransform,
}

impl LinearReadoutFile {
    /// Check the file against the compiled schema and build the model.
    pub fn into_model(self) -> Result<LoadedModel, AppError> {
        let schema = FeatureSchema::current();
        schema.ensure_matches(self.schema_version, &self.feature_columns)?;
        if self.coefficients.len() != schema.width() {
            return Err(AppError::Schema(format!(
                "model has {} coefficients, schema has {} columns",
                self.coefficients.len(),
                schema.width()
            )));
        }
        if self.coefficients.iter().any(|c| !c.is_finite()) || !self.intercept.is_finite() {
            return Err(AppError::Schema("model parameters must be finite".into()));
        }

        let scaler = self
            .feature_scaler
            .unwrap_or_else(|| FeatureScaler::identity(schema.width()));
        let transform = FeatureTransform::new(schema, scaler)?;
        let model = LinearReadout::new(
            self.coefficients,
            self.intercept,
            self.target_scaler.unwrap_or_default(),
        );
        Ok(LoadedModel { model, transform })
    }
}

/// Read and validate a model file.
pub fn load_model(path: &Path) -> Result<LoadedModel, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open model file '{}': {e}", path.display())))?;
    let parsed: LinearReadoutFile = serde_json::from_reader(file)
        .map_err(|e| AppError::io(format!("Invalid model file '{}': {e}", path.display())))?;
    parsed.into_model()
}
