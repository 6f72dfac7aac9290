//! Synthetic history generation.
//!
//! - daily backfill between sparse weighings (`backfill`)

pub mod backfill;

pub use backfill::{Backfill, build_sequence, validate_date_range};
