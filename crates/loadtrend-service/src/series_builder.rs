use loadtrend_core::{BuildNumber, CurveSpec, MetricSeries, TrendCurve};
use loadtrend_query::{extract_first, Query, ReportDocument};
use tracing::warn;

/// Accumulates one curve's values, one build at a time.
///
/// The curve's queries are compiled once; a query that does not compile is
/// reported and left out, the remaining alternatives still apply.
#[derive(Debug, Clone)]
pub struct MetricSeriesBuilder {
    spec: CurveSpec,
    queries: Vec<Query>,
    series: MetricSeries,
}

impl MetricSeriesBuilder {
    pub fn new(spec: CurveSpec) -> Self {
        let queries = spec
            .queries()
            .iter()
            .filter_map(|source| match Query::parse(source) {
                Ok(query) => Some(query),
                Err(error) => {
                    warn!(curve = spec.legend(), %error, "skipping invalid query");
                    None
                }
            })
            .collect();

        Self {
            spec,
            queries,
            series: MetricSeries::new(),
        }
    }

    /// Records the value of the first query alternative that yields one.
    ///
    /// Returns whether a value was recorded. Adding the same build again
    /// replaces its value.
    pub fn add_build(&mut self, build: BuildNumber, document: &ReportDocument) -> bool {
        match extract_first(&self.queries, document) {
            Some(value) => {
                self.series.insert(build, value);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn series(&self) -> &MetricSeries {
        &self.series
    }

    /// Number of queries that compiled.
    #[must_use]
    pub fn usable_queries(&self) -> usize {
        self.queries.len()
    }

    #[must_use]
    pub fn finish(self) -> TrendCurve {
        TrendCurve {
            spec: self.spec,
            series: self.series,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadtrend_core::Rgb;

    fn doc(avg: &str) -> ReportDocument {
        ReportDocument::parse(&format!(
            r#"<report><summary><all-summary><statistic-item type="httppage" avg="{avg}"/></all-summary></summary></report>"#
        ))
        .unwrap()
    }

    fn curve(queries: &[&str]) -> CurveSpec {
        CurveSpec::new(
            "Time",
            Rgb::new(237, 184, 0),
            queries.iter().map(|q| q.to_string()),
        )
        .unwrap()
    }

    const AVG: &str = "/report/summary/all-summary/statistic-item[@type='httppage']/@avg";

    #[test]
    fn test_values_keyed_by_build() {
        let mut builder = MetricSeriesBuilder::new(curve(&[AVG]));
        assert!(builder.add_build(BuildNumber::new(3), &doc("0,98")));
        assert!(builder.add_build(BuildNumber::new(1), &doc("1,2")));
        assert!(!builder.add_build(BuildNumber::new(2), &doc("-")));

        let entries: Vec<_> = builder.series().iter().map(|(b, v)| (b.get(), v)).collect();
        assert_eq!(entries, vec![(1, 1.2), (3, 0.98)]);
    }

    #[test]
    fn test_re_adding_overwrites() {
        let mut builder = MetricSeriesBuilder::new(curve(&[AVG]));
        builder.add_build(BuildNumber::new(1), &doc("1"));
        builder.add_build(BuildNumber::new(1), &doc("2"));
        assert_eq!(builder.series().len(), 1);
        assert_eq!(builder.series().get(BuildNumber::new(1)), Some(2.0));
    }

    #[test]
    fn test_alternatives_in_priority_order() {
        let mut builder = MetricSeriesBuilder::new(curve(&[
            "/report/virtual-users/statistic-item[@name='x']/@avg",
            AVG,
        ]));
        assert!(builder.add_build(BuildNumber::new(4), &doc("7")));
        assert_eq!(builder.series().get(BuildNumber::new(4)), Some(7.0));
    }

    #[test]
    fn test_invalid_query_is_skipped() {
        let mut builder = MetricSeriesBuilder::new(curve(&["/report[", AVG]));
        assert_eq!(builder.usable_queries(), 1);
        assert!(builder.add_build(BuildNumber::new(1), &doc("5")));

        let curve = builder.finish();
        assert_eq!(curve.spec.legend(), "Time");
        assert_eq!(curve.series.len(), 1);
    }
}
