//! Feature transform: observation windows to scaled numeric matrices.
//!
//! - fixed, versioned column schema (`schema`)
//! - z-score scaling with training-time statistics (`scaler`)
//! - sliding-window tensor construction (`transform`)

pub mod scaler;
pub mod schema;
pub mod transform;

pub use scaler::*;
pub use schema::*;
pub use transform::*;
