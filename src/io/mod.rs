//! Input/output helpers.
//!
//! - CSV export of wide tables and HICP pivots (`export`)
//! - CSV read-back of existing outputs (`ingest`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
