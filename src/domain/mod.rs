//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - series descriptors and source enums (`SeriesDescriptor`, `Source`, `Measure`)
//! - normalized observations (`ObservationSeries`) and joined tables (`SeriesTable`)
//! - the HICP sector panel and its pivots (`HicpPanel`)
//! - the per-run outcome record (`RunReport`)
//! - date-bound and period-label parsing (`period`)

pub mod panel;
pub mod period;
pub mod report;
pub mod types;

pub use panel::*;
pub use period::*;
pub use report::*;
pub use types::*;
