//! Terminal reports for forecasts, batches, backfills and curves.

pub mod format;

pub use format::*;
