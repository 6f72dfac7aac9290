//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - closed categorical sets (`FishType`, `PoolType`) and curve families (`CurveKind`)
//! - daily observation records (`ObservationRecord`) and interpolation anchors
//! - forecast outputs (`Prediction`, `ForecastSummary`, `RunState`)
//! - run configuration (`ForecastConfig`, `BackfillSpec`)

pub mod types;

pub use types::*;
