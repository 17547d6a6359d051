//! Reporting utilities: formatted terminal output for runs and the registry.

pub mod format;

pub use format::*;
