//! Predictive model boundary.
//!
//! The forecast driver only sees `GrowthModel`: a feature window in, one
//! next-day value out. Concrete adapters live alongside it.

pub mod linear;
pub mod model;

pub use linear::*;
pub use model::*;
