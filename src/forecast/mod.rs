//! Autoregressive forecasting until a target weight.

pub mod driver;

pub use driver::*;

use crate::domain::ForecastRequest;
use crate::error::AppError;
use crate::features::FeatureTransform;
use crate::models::GrowthModel;

/// Run one validated request to completion.
pub fn forecast(
    model: &dyn GrowthModel,
    transform: &FeatureTransform,
    request: &ForecastRequest,
    options: ForecastOptions,
) -> Result<ForecastRun, AppError> {
    ForecastDriver::new(model, transform, &request.sequence, request.target_weight, options)?.run()
}
