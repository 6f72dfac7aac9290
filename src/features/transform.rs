//! Window → feature tensor.
//!
//! For `n` ordered records and window `W` the transform emits `n - W + 1`
//! overlapping sub-windows, each a `W x F` matrix of scaled features. The
//! forecast driver only ever consumes the newest one (`FeatureTensor::latest`).

use nalgebra::DMatrix;

use crate::domain::{ObservationRecord, WINDOW_SIZE};
use crate::error::AppError;
use crate::features::{FeatureScaler, FeatureSchema};

#[derive(Debug, Clone)]
pub struct FeatureTensor {
    windows: Vec<DMatrix<f64>>,
    window: usize,
    width: usize,
}

impl FeatureTensor {
    /// `(sub_windows, window, features)`.
    pub fn shape(&self) -> [usize; 3] {
        [self.windows.len(), self.window, self.width]
    }

    /// Most recent sub-window.
    pub fn latest(&self) -> Option<&DMatrix<f64>> {
        self.windows.last()
    }
}

#[derive(Debug, Clone)]
pub struct FeatureTransform {
    schema: FeatureSchema,
    scaler: FeatureScaler,
    window: usize,
}

impl Default for FeatureTransform {
    fn default() -> Self {
        let schema = FeatureSchema::current();
        let scaler = FeatureScaler::identity(schema.width());
        Self {
            schema,
            scaler,
            window: WINDOW_SIZE,
        }
    }
}

impl FeatureTransform {
    pub fn new(schema: FeatureSchema, scaler: FeatureScaler) -> Result<Self, AppError> {
        scaler.validate(schema.width())?;
        Ok(Self {
            schema,
            scaler,
            window: WINDOW_SIZE,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Build every sub-window over `records`.
    pub fn transform(&self, records: &[ObservationRecord]) -> Result<FeatureTensor, AppError> {
        let n = records.len();
        if n < self.window {
            return Err(AppError::Schema(format!(
                "need at least {} records to build a feature window, got {n}",
                self.window
            )));
        }

        let width = self.schema.width();
        let mut flat = Vec::with_capacity(n * width);
        for record in records {
            let mut row = self.schema.encode(record);
            if row.len() != width {
                return Err(AppError::Schema(format!(
                    "encoded row has {} features, schema has {width}",
                    row.len()
                )));
            }
            self.scaler.transform_in_place(&mut row);
            flat.extend(row);
        }
        let all = DMatrix::from_row_slice(n, width, &flat);

        let windows = (0..=n - self.window)
            .map(|start| all.rows(start, self.window).into_owned())
            .collect();

        Ok(FeatureTensor {
            windows,
            window: self.window,
            width,
        })
    }
}
