//! The opaque model capability.
//!
//! A model maps the newest `W x F` feature window to a single next-day value.
//! If the model works in a scaled output space it reports the scaler through
//! `target_scaler`, and the driver inverse-transforms every prediction.
//!
//! Any `Fn(&DMatrix<f64>) -> Result<f64, AppError>` is a model, which keeps
//! deterministic stubs cheap to write.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::domain::WINDOW_SIZE;
use crate::error::AppError;
use crate::features::{FEATURE_COUNT, SCHEMA_VERSION, TargetScaler};

/// Descriptive metadata reported alongside forecasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub input_shape: String,
    pub schema_version: u32,
    pub output_type: String,
}

impl ModelInfo {
    pub fn new(model_type: impl Into<String>) -> Self {
        Self {
            model_type: model_type.into(),
            input_shape: format!("(batch_size, {WINDOW_SIZE}, {FEATURE_COUNT})"),
            schema_version: SCHEMA_VERSION,
            output_type: "Sequential weight predictions until target".to_string(),
        }
    }
}

pub trait GrowthModel: Send + Sync {
    /// Predict the next-day value from the newest feature window.
    fn predict(&self, window: &DMatrix<f64>) -> Result<f64, AppError>;

    fn target_scaler(&self) -> TargetScaler {
        TargetScaler::identity()
    }

    fn info(&self) -> ModelInfo {
        ModelInfo::new("Fish Growth Forecast Model")
    }
}

impl<F> GrowthModel for F
where
    F: Fn(&DMatrix<f64>) -> Result<f64, AppError> + Send + Sync,
{
    fn predict(&self, window: &DMatrix<f64>) -> Result<f64, AppError> {
        self(window)
    }
}

/// Predict and map back to weight units.
pub fn predict_weight(model: &dyn GrowthModel, window: &DMatrix<f64>) -> Result<f64, AppError> {
    let raw = model.predict(window)?;
    let weight = model.target_scaler().inverse(raw);
    if !weight.is_finite() {
        return Err(AppError::invalid_input(format!(
            "model produced a non-finite prediction ({raw})"
        )));
    }
    if weight < 0.0 {
        return Err(AppError::invalid_input(format!(
            "model produced a negative weight ({weight})"
        )));
    }
    Ok(weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scaled;

    impl GrowthModel for Scaled {
        fn predict(&self, _window: &DMatrix<f64>) -> Result<f64, AppError> {
            Ok(1.0)
        }

        fn target_scaler(&self) -> TargetScaler {
            TargetScaler {
                mean: 0.5,
                scale: 0.25,
            }
        }
    }

    #[test]
    fn closures_are_models() {
        let model = |_: &DMatrix<f64>| Ok::<f64, AppError>(0.42);
        let w = DMatrix::zeros(WINDOW_SIZE, FEATURE_COUNT);
        assert_eq!(predict_weight(&model, &w).unwrap(), 0.42);
        assert_eq!(model.info().input_shape, "(batch_size, 7, 19)");
    }

    #[test]
    fn scaled_output_is_inverted() {
        let w = DMatrix::zeros(WINDOW_SIZE, FEATURE_COUNT);
        assert_eq!(predict_weight(&Scaled, &w).unwrap(), 0.75);
    }

    #[test]
    fn non_finite_output_is_rejected() {
        let model = |_: &DMatrix<f64>| Ok::<f64, AppError>(f64::NAN);
        let w = DMatrix::zeros(WINDOW_SIZE, FEATURE_COUNT);
        assert!(predict_weight(&model, &w).is_err());
    }

    #[test]
    fn negative_weight_is_rejected() {
        let model = |_: &DMatrix<f64>| Ok::<f64, AppError>(-0.2);
        let w = DMatrix::zeros(WINDOW_SIZE, FEATURE_COUNT);
        let err = predict_weight(&model, &w).unwrap_err();
        assert!(err.to_string().contains("negative weight"));

        let zero = |_: &DMatrix<f64>| Ok::<f64, AppError>(0.0);
        assert_eq!(predict_weight(&zero, &w).unwrap(), 0.0);
    }
}
