//! Input/output helpers.
//!
//! - JSON/CSV request ingest (`ingest`)
//! - request validation (`validate`)
//! - prediction, record and response exports (`export`)

pub mod export;
pub mod ingest;
pub mod validate;

pub use export::*;
pub use ingest::*;
pub use validate::*;
