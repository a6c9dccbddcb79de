//! Graph and curve specifications.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::lite_path;
use crate::palette::{self, AVERAGE_RESPONSE_COLOR, ERROR_RATE_COLOR};

/// Query for the average page response time in the report summary.
pub const AVERAGE_RESPONSE_QUERY: &str =
    "/report/summary/all-summary/statistic-item[@type='httppage']/@avg";

/// Query for the global error rate in the report summary.
pub const ERROR_RATE_QUERY: &str =
    "/report/summary/statistics/statistic[@name='error_percentile']/@value";

/// 24-bit colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Which attribute of a report statistic a custom graph plots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticKind {
    Average,
    Percentile,
    Error,
    #[default]
    Value,
}

impl StatisticKind {
    /// Attribute selector appended to a custom graph query.
    #[must_use]
    pub const fn query_suffix(self) -> &'static str {
        match self {
            Self::Average => "/@avg",
            Self::Percentile => "/@percentile2",
            Self::Error => "/@error_rate",
            Self::Value => "/@value",
        }
    }

    /// Y-axis label used for custom graphs of this kind.
    #[must_use]
    pub const fn axis_label(self) -> &'static str {
        match self {
            Self::Average => "Average",
            Self::Percentile => "Percentile",
            Self::Error => "Error %",
            Self::Value => "Value",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Average => "average",
            Self::Percentile => "percentile",
            Self::Error => "error",
            Self::Value => "value",
        }
    }
}

impl fmt::Display for StatisticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatisticKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "average" | "avg" => Ok(Self::Average),
            "percentile" => Ok(Self::Percentile),
            "error" => Ok(Self::Error),
            "value" => Ok(Self::Value),
            other => Err(CoreError::validation(format!(
                "unknown statistic kind `{other}` (expected average, percentile, error or value)"
            ))),
        }
    }
}

/// One plotted line: a legend, alternative queries tried in order, a colour.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurveSpec {
    legend: String,
    queries: Vec<String>,
    color: Rgb,
}

impl CurveSpec {
    /// Creates a curve.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `queries` is empty.
    pub fn new(
        legend: impl Into<String>,
        color: Rgb,
        queries: impl IntoIterator<Item = String>,
    ) -> Result<Self, CoreError> {
        let legend = legend.into();
        let queries: Vec<String> = queries.into_iter().collect();
        if queries.is_empty() {
            return Err(CoreError::validation(format!(
                "curve `{legend}` needs at least one query"
            )));
        }
        Ok(Self {
            legend,
            queries,
            color,
        })
    }

    /// Builds the curve for a custom graph from a lite path.
    ///
    /// The virtual-user query comes first; the monitor counter query is only
    /// added when the lite path names a host.
    #[must_use]
    pub fn from_lite_path(lite_path: &str, statistic: StatisticKind, color: Rgb) -> Self {
        Self {
            legend: lite_path.to_string(),
            queries: lite_path::expand(lite_path, statistic),
            color,
        }
    }

    #[must_use]
    pub fn legend(&self) -> &str {
        &self.legend
    }

    #[must_use]
    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    #[must_use]
    pub const fn color(&self) -> Rgb {
        self.color
    }
}

/// A chart made of one or more curves sharing a Y axis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphSpec {
    title: String,
    y_label: String,
    curves: Vec<CurveSpec>,
    legend: bool,
}

impl GraphSpec {
    /// Single-curve graph rendered without a legend.
    #[must_use]
    pub fn simple(title: impl Into<String>, y_label: impl Into<String>, curve: CurveSpec) -> Self {
        Self {
            title: title.into(),
            y_label: y_label.into(),
            curves: vec![curve],
            legend: false,
        }
    }

    /// Graph rendered with a legend, whatever its number of curves.
    #[must_use]
    pub fn with_legend(
        title: impl Into<String>,
        y_label: impl Into<String>,
        curves: Vec<CurveSpec>,
    ) -> Self {
        Self {
            title: title.into(),
            y_label: y_label.into(),
            curves,
            legend: true,
        }
    }

    /// Built-in average page response time graph.
    #[must_use]
    pub fn average_response_time() -> Self {
        let curve = CurveSpec {
            legend: "Time".to_string(),
            queries: vec![AVERAGE_RESPONSE_QUERY.to_string()],
            color: AVERAGE_RESPONSE_COLOR,
        };
        Self::simple("Avg. Resp. Time (pages)", "Avg Resp Time (secs)", curve)
    }

    /// Built-in error rate graph.
    #[must_use]
    pub fn error_rate() -> Self {
        let curve = CurveSpec {
            legend: "Time".to_string(),
            queries: vec![ERROR_RATE_QUERY.to_string()],
            color: ERROR_RATE_COLOR,
        };
        Self::simple("Error Rate", "Error Rate %", curve)
    }

    /// Custom graph whose curves are lite paths, coloured from the palette.
    #[must_use]
    pub fn custom<S: AsRef<str>>(name: &str, statistic: StatisticKind, lite_paths: &[S]) -> Self {
        let curves = lite_paths
            .iter()
            .enumerate()
            .map(|(index, path)| {
                CurveSpec::from_lite_path(path.as_ref(), statistic, palette::curve_color(index))
            })
            .collect();
        Self::with_legend(name, statistic.axis_label(), curves)
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn y_label(&self) -> &str {
        &self.y_label
    }

    #[must_use]
    pub fn curves(&self) -> &[CurveSpec] {
        &self.curves
    }

    #[must_use]
    pub const fn has_legend(&self) -> bool {
        self.legend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistic_suffixes() {
        assert_eq!(StatisticKind::Average.query_suffix(), "/@avg");
        assert_eq!(StatisticKind::Percentile.query_suffix(), "/@percentile2");
        assert_eq!(StatisticKind::Error.query_suffix(), "/@error_rate");
        assert_eq!(StatisticKind::Value.query_suffix(), "/@value");
    }

    #[test]
    fn test_custom_graph_axis_labels() {
        let labels: Vec<String> = [
            StatisticKind::Average,
            StatisticKind::Percentile,
            StatisticKind::Error,
            StatisticKind::Value,
        ]
        .into_iter()
        .map(|kind| GraphSpec::custom("g", kind, &["A>B"]).y_label().to_string())
        .collect();
        assert_eq!(labels, ["Average", "Percentile", "Error %", "Value"]);
    }

    #[test]
    fn test_statistic_from_str() {
        assert_eq!("Average".parse::<StatisticKind>().unwrap(), StatisticKind::Average);
        assert_eq!(" error ".parse::<StatisticKind>().unwrap(), StatisticKind::Error);
        assert!("median".parse::<StatisticKind>().is_err());
    }

    #[test]
    fn test_builtin_graphs_have_no_legend() {
        let avg = GraphSpec::average_response_time();
        assert!(!avg.has_legend());
        assert_eq!(avg.curves().len(), 1);
        assert_eq!(avg.curves()[0].queries(), [AVERAGE_RESPONSE_QUERY]);
        assert_eq!(avg.curves()[0].color(), AVERAGE_RESPONSE_COLOR);

        let errors = GraphSpec::error_rate();
        assert!(!errors.has_legend());
        assert_eq!(errors.curves()[0].color(), ERROR_RATE_COLOR);
    }

    #[test]
    fn test_custom_graph_assigns_palette_colors() {
        let graph = GraphSpec::custom(
            "Transactions",
            StatisticKind::Average,
            &["UserPath>Actions>Login", "UserPath>Actions>Logout"],
        );
        assert!(graph.has_legend());
        assert_eq!(graph.y_label(), "Average");
        assert_eq!(graph.curves()[0].color(), palette::curve_color(0));
        assert_eq!(graph.curves()[1].color(), palette::curve_color(1));
        assert_eq!(graph.curves()[1].legend(), "UserPath>Actions>Logout");
    }

    #[test]
    fn test_curve_requires_query() {
        assert!(CurveSpec::new("empty", Rgb::new(0, 0, 0), Vec::new()).is_err());
    }
}
