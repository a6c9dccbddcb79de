//! Trend refresh service for loadtrend.
//!
//! Ties the pieces together: locate each build's report, extract metric
//! series, and render the job's graphs, one refresh per job at a time.

pub mod aggregator;
pub mod error;
pub mod history;
pub mod locator;
pub mod metrics;
pub mod refresh;
pub mod series_builder;

pub use aggregator::TrendAggregator;
pub use error::{ServiceError, ServiceResult};
pub use history::{BuildHistory, FsBuildHistory};
pub use locator::{candidate_paths, locate, strip_workspace};
pub use refresh::{RefreshOutcome, TrendRefresher};
pub use series_builder::MetricSeriesBuilder;
