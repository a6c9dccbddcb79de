use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};

use crate::build::BuildNumber;
use crate::graph::{CurveSpec, GraphSpec};

/// Per-build values of one metric, ordered by build number.
///
/// A build with no usable value is simply absent; there are no sentinel
/// entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetricSeries {
    values: BTreeMap<BuildNumber, f64>,
}

impl MetricSeries {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` for `build`, replacing any earlier value.
    pub fn insert(&mut self, build: BuildNumber, value: f64) -> Option<f64> {
        self.values.insert(build, value)
    }

    #[must_use]
    pub fn get(&self, build: BuildNumber) -> Option<f64> {
        self.values.get(&build).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries in ascending build order.
    pub fn iter(&self) -> impl Iterator<Item = (BuildNumber, f64)> + '_ {
        self.values.iter().map(|(build, value)| (*build, *value))
    }

    pub fn builds(&self) -> btree_map::Keys<'_, BuildNumber, f64> {
        self.values.keys()
    }

    /// Smallest and largest value, if any.
    #[must_use]
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.values.values().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

impl FromIterator<(BuildNumber, f64)> for MetricSeries {
    fn from_iter<I: IntoIterator<Item = (BuildNumber, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// A curve together with the series materialised for it.
#[derive(Clone, Debug, PartialEq)]
pub struct TrendCurve {
    pub spec: CurveSpec,
    pub series: MetricSeries,
}

/// A graph together with the series of each of its curves.
#[derive(Clone, Debug, PartialEq)]
pub struct TrendGraph {
    pub spec: GraphSpec,
    /// One entry per curve of `spec`, in the same order.
    pub curves: Vec<TrendCurve>,
}

impl TrendGraph {
    /// Distinct build numbers that have a value in at least one curve.
    #[must_use]
    pub fn build_numbers(&self) -> BTreeSet<BuildNumber> {
        self.curves
            .iter()
            .flat_map(|curve| curve.series.builds().copied())
            .collect()
    }

    /// Total number of values across all curves.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.curves.iter().map(|curve| curve.series.len()).sum()
    }
}

/// The graphs of one job after aggregation, in configuration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrendSet {
    graphs: Vec<TrendGraph>,
}

impl TrendSet {
    #[must_use]
    pub fn new(graphs: Vec<TrendGraph>) -> Self {
        Self { graphs }
    }

    #[must_use]
    pub fn graphs(&self) -> &[TrendGraph] {
        &self.graphs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphSpec;

    fn b(n: u32) -> BuildNumber {
        BuildNumber::new(n)
    }

    #[test]
    fn test_insert_overwrites_same_build() {
        let mut series = MetricSeries::new();
        assert_eq!(series.insert(b(4), 1.0), None);
        assert_eq!(series.insert(b(4), 2.5), Some(1.0));
        assert_eq!(series.len(), 1);
        assert_eq!(series.get(b(4)), Some(2.5));
    }

    #[test]
    fn test_iteration_is_sorted_by_build() {
        let series: MetricSeries = [(b(9), 0.9), (b(2), 0.2), (b(5), 0.5)].into_iter().collect();
        let order: Vec<u32> = series.iter().map(|(build, _)| build.get()).collect();
        assert_eq!(order, vec![2, 5, 9]);
        assert_eq!(series.bounds(), Some((0.2, 0.9)));
    }

    #[test]
    fn test_graph_build_numbers_are_union() {
        let spec = GraphSpec::custom("g", Default::default(), &["a", "b"]);
        let graph = TrendGraph {
            curves: vec![
                TrendCurve {
                    spec: spec.curves()[0].clone(),
                    series: [(b(1), 1.0), (b(2), 2.0)].into_iter().collect(),
                },
                TrendCurve {
                    spec: spec.curves()[1].clone(),
                    series: [(b(2), 1.0), (b(3), 2.0)].into_iter().collect(),
                },
            ],
            spec,
        };
        assert_eq!(graph.build_numbers().len(), 3);
        assert_eq!(graph.point_count(), 4);
    }
}
