//! `growth-curves` library crate.
//!
//! The binary (`grow`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the forecast driver can be embedded behind other front-ends
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod curve;
pub mod data;
pub mod domain;
pub mod error;
pub mod features;
pub mod forecast;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
