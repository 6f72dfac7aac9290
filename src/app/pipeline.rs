//! Shared forecast pipeline used by every front-end.
//!
//! validate -> forecast -> response, plus batch mode on top of it. The CLI
//! only decides where requests come from and what to print.

use chrono::Utc;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::app::limiter::RateLimiter;
use crate::domain::{ForecastRequest, ForecastSummary, Prediction};
use crate::error::AppError;
use crate::features::FeatureTransform;
use crate::forecast::{ForecastOptions, ForecastRun, forecast};
use crate::io::validate_request;
use crate::models::{GrowthModel, LoadedModel, ModelInfo};

/// Largest number of requests accepted in one batch.
pub const MAX_BATCH_REQUESTS: usize = 10;

/// Client name used for local CLI invocations.
pub const LOCAL_CLIENT: &str = "local";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputData {
    pub target_weight: f64,
    pub sequence_length: usize,
    /// `(sub_windows, window, features)` of the request's feature tensor.
    pub sequences_shape: [usize; 3],
    pub feature_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub model_type: String,
    /// RFC 3339 timestamp.
    pub generated_at: String,
    pub input_data: InputData,
    pub model_info: ModelInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub predictions: Vec<Prediction>,
    pub summary: ForecastSummary,
    pub metadata: ResponseMetadata,
}

/// One completed forecast: the run itself plus its response document.
#[derive(Debug, Clone)]
pub struct ForecastOutput {
    pub run: ForecastRun,
    pub response: ForecastResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub request_id: usize,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ForecastResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl BatchResult {
    fn from_outcome(request_id: usize, outcome: Result<ForecastResponse, AppError>) -> Self {
        match outcome {
            Ok(data) => Self {
                request_id,
                success: true,
                data: Some(data),
                error: None,
                details: Vec::new(),
            },
            Err(AppError::Validation(details)) => Self {
                request_id,
                success: false,
                data: None,
                error: Some("Validation failed".to_string()),
                details,
            },
            Err(err) => Self {
                request_id,
                success: false,
                data: None,
                error: Some(err.to_string()),
                details: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub results: Vec<BatchResult>,
    pub total_requests: usize,
    pub successful_requests: usize,
    pub generated_at: String,
}

/// A loaded model, its feature transform and the per-run limits.
///
/// The model is shared read-only between concurrent batch requests; every
/// request gets its own window inside its own driver.
pub struct ForecastService {
    model: Box<dyn GrowthModel>,
    transform: FeatureTransform,
    options: ForecastOptions,
    limiter: RateLimiter,
}

impl ForecastService {
    pub fn new(
        model: impl GrowthModel + 'static,
        transform: FeatureTransform,
        options: ForecastOptions,
        limiter: RateLimiter,
    ) -> Self {
        Self {
            model: Box::new(model),
            transform,
            options,
            limiter,
        }
    }

    pub fn from_loaded(loaded: LoadedModel, options: ForecastOptions, limiter: RateLimiter) -> Self {
        Self::new(loaded.model, loaded.transform, options, limiter)
    }

    pub fn model_info(&self) -> ModelInfo {
        self.model.info()
    }

    /// Forecast one already-validated request.
    pub fn forecast_request(&self, request: &ForecastRequest) -> Result<ForecastOutput, AppError> {
        let shape = self.transform.transform(&request.sequence)?.shape();
        let run = forecast(self.model.as_ref(), &self.transform, request, self.options)?;

        let model_info = self.model.info();
        let response = ForecastResponse {
            predictions: run.predictions.clone(),
            summary: run.summary(),
            metadata: ResponseMetadata {
                model_type: model_info.model_type.clone(),
                generated_at: Utc::now().to_rfc3339(),
                input_data: InputData {
                    target_weight: request.target_weight,
                    sequence_length: request.sequence.len(),
                    sequences_shape: shape,
                    feature_columns: self.transform.schema().columns().to_vec(),
                },
                model_info,
            },
        };
        Ok(ForecastOutput { run, response })
    }

    /// Count one call from `client` against the hourly limit.
    pub fn admit(&self, client: &str) -> Result<(), AppError> {
        self.limiter.check(client)
    }

    /// Rate-limit, validate and forecast a raw JSON request.
    pub fn handle(&self, client: &str, request: &Value) -> Result<ForecastOutput, AppError> {
        self.admit(client)?;
        let request = validate_request(request)?;
        self.forecast_request(&request)
    }

    /// Run up to `MAX_BATCH_REQUESTS` requests independently.
    ///
    /// A failing request is reported in its slot and never affects the others.
    pub fn batch(&self, client: &str, requests: &[Value]) -> Result<BatchResponse, AppError> {
        self.admit(client)?;
        if requests.len() > MAX_BATCH_REQUESTS {
            return Err(AppError::validation(format!(
                "Batch size too large: maximum {MAX_BATCH_REQUESTS} requests per batch allowed"
            )));
        }

        let results: Vec<BatchResult> = requests
            .par_iter()
            .enumerate()
            .map(|(i, raw)| {
                let outcome = validate_request(raw)
                    .and_then(|req| self.forecast_request(&req))
                    .map(|out| out.response);
                if let Err(e) = &outcome {
                    warn!(request_id = i, error = %e, "batch request failed");
                }
                BatchResult::from_outcome(i, outcome)
            })
            .collect();

        let successful_requests = results.iter().filter(|r| r.success).count();
        Ok(BatchResponse {
            total_requests: requests.len(),
            successful_requests,
            results,
            generated_at: Utc::now().to_rfc3339(),
        })
    }
}
