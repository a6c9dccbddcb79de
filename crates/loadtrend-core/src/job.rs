//! Per-job trend configuration as supplied by the host.

use std::path::Path;

use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::graph::StatisticKind;

/// Trend settings of one job.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct JobTrendConfig {
    /// Show the built-in average response time graph.
    #[serde(default = "default_true")]
    pub show_trend_average_response: bool,

    /// Show the built-in error rate graph.
    #[serde(default = "default_true")]
    pub show_trend_error_rate: bool,

    /// User-defined graphs, rendered after the built-in ones.
    #[serde(default)]
    pub graphs: Vec<CustomGraphConfig>,

    /// Maximum number of builds contributing to the trends (0 = unlimited).
    #[serde(default)]
    pub max_trends: u32,

    /// Custom report location, tried after the path recorded by the build.
    #[serde(default)]
    pub xml_report_path: Option<String>,

    /// Whether failed builds contribute to the trends.
    #[serde(default = "default_true")]
    pub include_failed_builds: bool,
}

/// A user-defined graph: a name, a statistic and one lite path per curve.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CustomGraphConfig {
    pub name: String,
    #[serde(default)]
    pub statistic: StatisticKind,
    pub curves: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Default for JobTrendConfig {
    fn default() -> Self {
        Self {
            show_trend_average_response: true,
            show_trend_error_rate: true,
            graphs: Vec::new(),
            max_trends: 0,
            xml_report_path: None,
            include_failed_builds: true,
        }
    }
}

impl JobTrendConfig {
    /// Loads a job configuration file (YAML, TOML or JSON, by extension).
    pub fn from_file<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let config: Self = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// `max_trends` as an optional limit.
    #[must_use]
    pub fn build_limit(&self) -> Option<usize> {
        (self.max_trends > 0).then_some(self.max_trends as usize)
    }

    /// Rejects graphs without a name or without usable curves.
    pub fn validate(&self) -> CoreResult<()> {
        for (index, graph) in self.graphs.iter().enumerate() {
            if graph.name.trim().is_empty() {
                return Err(CoreError::validation(format!(
                    "graphs[{index}].name cannot be empty"
                )));
            }
            if graph.curves.is_empty() {
                return Err(CoreError::validation(format!(
                    "graph `{}` needs at least one curve",
                    graph.name
                )));
            }
            if graph.curves.iter().any(|curve| curve.trim().is_empty()) {
                return Err(CoreError::validation(format!(
                    "graph `{}` has an empty curve path",
                    graph.name
                )));
            }
        }
        Ok(())
    }
}
