//! Data acquisition: registry, HTTP fetch, payload normalization, the
//! offline fallback store and the dataset catalogue.

pub mod datasets;
pub mod ecb;
pub mod fallback;
pub mod fetch;
pub mod fred;
pub mod normalize;
pub mod registry;

pub use datasets::{DatasetPlan, Layout, Member, OutputPaths};
pub use fallback::FallbackStore;
pub use fetch::{Endpoints, Fetcher, HttpFetcher};
pub use registry::SeriesRegistry;
