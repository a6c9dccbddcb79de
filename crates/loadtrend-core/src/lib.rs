//! Core domain types for loadtrend: builds, graph and curve specifications,
//! metric series, the per-job refresh lock and shared configuration.

pub mod build;
pub mod config;
pub mod error;
pub mod graph;
pub mod job;
pub mod lite_path;
pub mod lock;
pub mod palette;
pub mod series;

pub use build::{Artifact, Build, BuildNumber, BuildResult};
pub use config::{LoadtrendConfig, LoggingConfig, RenderConfig, ReportConfig};
pub use error::{CoreError, CoreResult};
pub use graph::{CurveSpec, GraphSpec, Rgb, StatisticKind};
pub use job::{CustomGraphConfig, JobTrendConfig};
pub use lock::{RefreshGuard, RefreshLock};
pub use series::{MetricSeries, TrendCurve, TrendGraph, TrendSet};
