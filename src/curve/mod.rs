//! Curve family selection.
//!
//! Given two anchor weights (or three and more), decide which interpolation
//! family models the growth or decline regime between them.

pub mod selection;

pub use selection::*;
