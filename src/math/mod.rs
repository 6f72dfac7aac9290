//! Interpolation math: two-anchor growth curves and the monotone spline.

pub mod curves;
pub mod pchip;

pub use curves::*;
pub use pchip::*;
