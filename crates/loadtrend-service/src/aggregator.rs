//! Rebuilding a job's trend set from its build history.

use loadtrend_core::{
    Build, BuildResult, GraphSpec, JobTrendConfig, ReportConfig, TrendGraph, TrendSet,
};
use loadtrend_query::{QueryError, ReportDocument};
use tracing::{debug, info, instrument, warn};

use crate::locator::{candidate_paths, locate};
use crate::metrics::REPORTS_TOTAL;
use crate::series_builder::MetricSeriesBuilder;

/// Turns build reports into per-graph metric series.
#[derive(Debug, Clone, Default)]
pub struct TrendAggregator {
    report: ReportConfig,
}

impl TrendAggregator {
    pub fn new(report: ReportConfig) -> Self {
        Self { report }
    }

    /// Graphs of `job` in output order: enabled built-ins, then custom graphs
    /// in configuration order.
    pub fn graph_specs(job: &JobTrendConfig) -> Vec<GraphSpec> {
        let mut specs = Vec::with_capacity(job.graphs.len() + 2);
        if job.show_trend_average_response {
            specs.push(GraphSpec::average_response_time());
        }
        if job.show_trend_error_rate {
            specs.push(GraphSpec::error_rate());
        }
        specs.extend(
            job.graphs
                .iter()
                .map(|graph| GraphSpec::custom(&graph.name, graph.statistic, &graph.curves)),
        );
        specs
    }

    /// Builds a fresh trend set from `builds`.
    ///
    /// Builds are visited newest first. With `max_trends` set, the scan stops
    /// once that many builds contributed at least one value. Builds without a
    /// report are skipped quietly; unreadable reports are skipped with a
    /// warning. When no build contributes anything the set is empty.
    #[instrument(skip_all, fields(builds = builds.len()))]
    pub fn rebuild(&self, job: &JobTrendConfig, builds: &[Build]) -> TrendSet {
        let specs = Self::graph_specs(job);
        let mut graphs: Vec<(GraphSpec, Vec<MetricSeriesBuilder>)> = specs
            .into_iter()
            .map(|spec| {
                let builders = spec
                    .curves()
                    .iter()
                    .cloned()
                    .map(MetricSeriesBuilder::new)
                    .collect();
                (spec, builders)
            })
            .collect();

        let mut ordered: Vec<&Build> = builds.iter().collect();
        ordered.sort_by(|a, b| b.number.cmp(&a.number));

        let limit = job.build_limit();
        let mut used = 0usize;

        for build in ordered {
            if limit.is_some_and(|limit| used >= limit) {
                debug!(limit = used, "build limit reached");
                break;
            }
            if !job.include_failed_builds && build.result == BuildResult::Failure {
                debug!(build = %build.number, "skipping failed build");
                continue;
            }

            let Some(document) = self.load_report(job, build) else {
                continue;
            };

            let mut contributed = false;
            for (_, builders) in &mut graphs {
                for builder in builders.iter_mut() {
                    contributed |= builder.add_build(build.number, &document);
                }
            }
            if contributed {
                used += 1;
            } else {
                debug!(build = %build.number, "report holds none of the plotted statistics");
            }
        }

        if used == 0 {
            info!("no build contributed data, trend set is empty");
            return TrendSet::default();
        }

        let graphs: Vec<TrendGraph> = graphs
            .into_iter()
            .map(|(spec, builders)| TrendGraph {
                spec,
                curves: builders
                    .into_iter()
                    .map(MetricSeriesBuilder::finish)
                    .collect(),
            })
            .collect();

        info!(graphs = graphs.len(), reports = used, "trend set rebuilt");
        TrendSet::new(graphs)
    }

    fn load_report(&self, job: &JobTrendConfig, build: &Build) -> Option<ReportDocument> {
        let candidates = candidate_paths(
            build,
            job.xml_report_path.as_deref(),
            &self.report.default_path,
        );

        let Some(artifact) = locate(build, &candidates) else {
            debug!(build = %build.number, ?candidates, "no report among artifacts");
            REPORTS_TOTAL.with_label_values(&["missing"]).inc();
            return None;
        };

        match ReportDocument::open(&artifact.file) {
            Ok(document) => {
                REPORTS_TOTAL.with_label_values(&["parsed"]).inc();
                Some(document)
            }
            Err(error) => {
                let status = match error {
                    QueryError::Io { .. } => "unreadable",
                    _ => "malformed",
                };
                warn!(
                    build = %build.number,
                    path = %artifact.file.display(),
                    %error,
                    "skipping unusable report"
                );
                REPORTS_TOTAL.with_label_values(&[status]).inc();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadtrend_core::{CustomGraphConfig, StatisticKind};

    #[test]
    fn test_graph_specs_order() {
        let job = JobTrendConfig {
            graphs: vec![CustomGraphConfig {
                name: "Login".to_string(),
                statistic: StatisticKind::Percentile,
                curves: vec!["UserPath>Login".to_string(), "lg1/CPU".to_string()],
            }],
            ..JobTrendConfig::default()
        };

        let specs = TrendAggregator::graph_specs(&job);
        let titles: Vec<&str> = specs.iter().map(GraphSpec::title).collect();
        assert_eq!(titles, ["Avg. Resp. Time (pages)", "Error Rate", "Login"]);
        assert!(!specs[0].has_legend());
        assert!(specs[2].has_legend());
        assert_eq!(specs[2].y_label(), "Percentile");
        assert_eq!(specs[2].curves()[0].queries().len(), 1);
        assert_eq!(specs[2].curves()[1].queries().len(), 2);
    }

    #[test]
    fn test_builtins_can_be_disabled() {
        let job = JobTrendConfig {
            show_trend_average_response: false,
            show_trend_error_rate: false,
            ..JobTrendConfig::default()
        };
        assert!(TrendAggregator::graph_specs(&job).is_empty());
        assert!(TrendAggregator::default().rebuild(&job, &[]).is_empty());
    }

    #[test]
    fn test_builds_without_reports_yield_empty_set() {
        let builds = vec![
            Build::new(1, BuildResult::Success),
            Build::new(2, BuildResult::Success),
        ];
        let set = TrendAggregator::default().rebuild(&JobTrendConfig::default(), &builds);
        assert!(set.is_empty());
    }
}
