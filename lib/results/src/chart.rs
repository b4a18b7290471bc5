//! Charts over the aggregated results.
//!
//! The statistics are computed here. A [ChartRenderer] only decides how they are drawn.

use crate::error::OutputError;
use crate::model::{BenchmarkTask, QueryExecutionRecord};
use crate::output::{write_pretty_json, StagedFile};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Draws charts from the aggregated results into a directory.
pub trait ChartRenderer: Send + Sync {
    /// Writes the charts and returns the paths of the written files.
    fn render(
        &self,
        benchmarks: &[BenchmarkTask],
        queries: &[QueryExecutionRecord],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, OutputError>;
}

/// The tasks that share a dataset and a client count are drawn into the same charts.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChartGroup {
    pub dataset: String,
    pub no_clients: u32,
}

impl ChartGroup {
    fn of_task(task: &BenchmarkTask) -> Self {
        Self {
            dataset: task.dataset.clone(),
            no_clients: task.no_clients,
        }
    }

    fn of_query(query: &QueryExecutionRecord) -> Self {
        Self {
            dataset: query.dataset.clone(),
            no_clients: query.no_clients,
        }
    }

    /// Returns the file name of the chart of `metric` within this group.
    pub fn file_name(&self, metric: &str) -> String {
        format!(
            "{}_{:02}-clients_{}.vl.json",
            self.dataset, self.no_clients, metric
        )
    }
}

impl Display for ChartGroup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {} clients", self.dataset, self.no_clients)
    }
}

/// A task-level metric that is drawn as one bar per triplestore.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarMetric {
    PenalizedAverageQps,
    QueriesPerHour,
}

impl BarMetric {
    pub const ALL: [BarMetric; 2] = [BarMetric::PenalizedAverageQps, BarMetric::QueriesPerHour];

    /// The column name of the metric in the aggregated JSON.
    pub fn label(self) -> &'static str {
        match self {
            BarMetric::PenalizedAverageQps => "PenalizedAvgQPS",
            BarMetric::QueriesPerHour => "QMPH",
        }
    }

    fn value(self, task: &BenchmarkTask) -> Option<f64> {
        match self {
            BarMetric::PenalizedAverageQps => Some(task.penalized_average_qps),
            BarMetric::QueriesPerHour => task.queries_per_hour,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Bar {
    pub triplestore: String,
    pub value: f64,
}

/// Computes the bars of `metric` for every group.
///
/// Every group has one bar per triplestore found in `benchmarks`, in lexicographic order. Missing
/// and null values are drawn as 0 and values are rounded to integers. If a group holds several
/// tasks of one triplestore, the last one wins.
pub fn bar_series(
    benchmarks: &[BenchmarkTask],
    metric: BarMetric,
) -> BTreeMap<ChartGroup, Vec<Bar>> {
    let triplestores: BTreeSet<&str> = benchmarks.iter().map(|t| t.triplestore.as_str()).collect();

    let mut values: BTreeMap<ChartGroup, BTreeMap<&str, Option<f64>>> = BTreeMap::new();
    for task in benchmarks {
        values
            .entry(ChartGroup::of_task(task))
            .or_default()
            .insert(task.triplestore.as_str(), metric.value(task));
    }

    values
        .into_iter()
        .map(|(group, by_triplestore)| {
            let bars = triplestores
                .iter()
                .map(|triplestore| Bar {
                    triplestore: (*triplestore).to_owned(),
                    value: by_triplestore
                        .get(triplestore)
                        .copied()
                        .flatten()
                        .filter(|value| value.is_finite())
                        .map_or(0.0, f64::round_ties_even),
                })
                .collect();
            (group, bars)
        })
        .collect()
}

/// The summary of a distribution as drawn by a box plot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BoxStats {
    pub triplestore: String,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// `q1 - 1.5 IQR`, but not below the minimum.
    pub lower: f64,
    /// `q3 + 1.5 IQR`, but not above the maximum.
    pub upper: f64,
    #[serde(skip)]
    pub outliers: Vec<f64>,
}

impl BoxStats {
    /// Summarizes `values`. Returns [None] if there are no values.
    pub fn new(triplestore: impl Into<String>, values: &[f64]) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let (&min, &max) = (sorted.first()?, sorted.last()?);

        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let iqr = q3 - q1;
        let lower_fence = q1 - 1.5 * iqr;
        let upper_fence = q3 + 1.5 * iqr;

        Some(Self {
            triplestore: triplestore.into(),
            q1,
            median,
            q3,
            lower: lower_fence.max(min),
            upper: upper_fence.min(max),
            outliers: sorted
                .iter()
                .copied()
                .filter(|value| *value < lower_fence || *value > upper_fence)
                .collect(),
        })
    }
}

/// Returns the `q`-quantile of `sorted`, interpolating linearly between the closest ranks.
///
/// `sorted` must not be empty.
#[allow(clippy::cast_precision_loss, reason = "Sample sizes are far below 2^53")]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "The position lies within the bounds of the slice"
)]
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let below = position.floor() as usize;
    let above = position.ceil() as usize;
    sorted[below] + (sorted[above] - sorted[below]) * (position - below as f64)
}

/// Computes the per-query QPS box plots for every group, one box per triplestore.
pub fn qps_box_plots(queries: &[QueryExecutionRecord]) -> BTreeMap<ChartGroup, Vec<BoxStats>> {
    let mut values: BTreeMap<ChartGroup, BTreeMap<&str, Vec<f64>>> = BTreeMap::new();
    for query in queries {
        values
            .entry(ChartGroup::of_query(query))
            .or_default()
            .entry(query.triplestore.as_str())
            .or_default()
            .push(query.qps);
    }

    values
        .into_iter()
        .map(|(group, by_triplestore)| {
            let boxes = by_triplestore
                .into_iter()
                .filter_map(|(triplestore, values)| BoxStats::new(triplestore, &values))
                .collect();
            (group, boxes)
        })
        .collect()
}

const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// Writes [Vega-Lite](https://vega.github.io/vega-lite/) specifications.
///
/// For every group, one bar chart per [BarMetric] and one box plot of the per-query QPS.
#[derive(Clone, Copy, Debug, Default)]
pub struct VegaLiteRenderer;

impl VegaLiteRenderer {
    fn bar_chart(group: &ChartGroup, metric: BarMetric, bars: &[Bar]) -> Result<Value, OutputError> {
        let x = json!({ "field": "triplestore", "type": "nominal", "sort": null, "title": null });
        let y = json!({ "field": "value", "type": "quantitative", "title": metric.label() });
        Ok(json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": format!("{} ({group})", metric.label()),
            "data": { "values": serde_json::to_value(bars)? },
            "layer": [
                {
                    "mark": "bar",
                    "encoding": { "x": x, "y": y },
                },
                {
                    "mark": { "type": "text", "dy": -10 },
                    "encoding": { "x": x, "y": y, "text": { "field": "value" } },
                },
            ],
        }))
    }

    fn box_plot(group: &ChartGroup, boxes: &[BoxStats]) -> Result<Value, OutputError> {
        let outliers: Vec<Value> = boxes
            .iter()
            .flat_map(|stats| {
                stats
                    .outliers
                    .iter()
                    .map(|value| json!({ "triplestore": stats.triplestore, "value": value }))
            })
            .collect();
        let x = json!({ "field": "triplestore", "type": "nominal", "sort": null, "title": null });
        let scale = json!({ "type": "log" });

        Ok(json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": format!("qps ({group})"),
            "layer": [
                {
                    "data": { "values": serde_json::to_value(boxes)? },
                    "layer": [
                        {
                            "mark": "rule",
                            "encoding": {
                                "x": x,
                                "y": { "field": "lower", "type": "quantitative", "scale": scale, "title": "qps" },
                                "y2": { "field": "upper" },
                            },
                        },
                        {
                            "mark": { "type": "bar", "size": 28, "color": "#3B8686", "stroke": "black" },
                            "encoding": {
                                "x": x,
                                "y": { "field": "q1", "type": "quantitative", "scale": scale },
                                "y2": { "field": "q3" },
                            },
                        },
                        {
                            "mark": { "type": "tick", "size": 28, "color": "#E08E79" },
                            "encoding": {
                                "x": x,
                                "y": { "field": "median", "type": "quantitative", "scale": scale },
                            },
                        },
                    ],
                },
                {
                    "data": { "values": outliers },
                    "mark": { "type": "point", "color": "#F38630", "opacity": 0.6 },
                    "encoding": {
                        "x": x,
                        "y": { "field": "value", "type": "quantitative", "scale": scale },
                    },
                },
            ],
        }))
    }

    fn write(path: &Path, chart: Value) -> Result<(), OutputError> {
        let (file, ()) = StagedFile::write(path, |writer| write_pretty_json(writer, chart))?;
        file.commit()?;
        debug!(file = %path.display(), "Wrote chart");
        Ok(())
    }
}

impl ChartRenderer for VegaLiteRenderer {
    fn render(
        &self,
        benchmarks: &[BenchmarkTask],
        queries: &[QueryExecutionRecord],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, OutputError> {
        let mut written = Vec::new();

        for metric in BarMetric::ALL {
            for (group, bars) in bar_series(benchmarks, metric) {
                let path = output_dir.join(group.file_name(metric.label()));
                Self::write(&path, Self::bar_chart(&group, metric, &bars)?)?;
                written.push(path);
            }
        }

        for (group, boxes) in qps_box_plots(queries) {
            let path = output_dir.join(group.file_name("qps"));
            Self::write(&path, Self::box_plot(&group, &boxes)?)?;
            written.push(path);
        }

        written.sort();
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{StartTime, TaskFormat};
    use std::fs::File;

    fn task(dataset: &str, triplestore: &str, qmph: Option<f64>, penalized: f64) -> BenchmarkTask {
        BenchmarkTask {
            benchmark_id: "1/1/1".to_owned(),
            format: TaskFormat::Http,
            dataset: dataset.to_owned(),
            triplestore: triplestore.to_owned(),
            no_clients: 1,
            start_time: "2020-11-03T10:15:00".parse::<StartTime>().unwrap(),
            runtime: 60_000.0,
            queries_per_hour: qmph,
            average_qps: None,
            penalized_average_qps: penalized,
            query_count: None,
            queries_per_hour_normalized: None,
        }
    }

    #[test]
    fn quartiles_interpolate_linearly() {
        let stats = BoxStats::new("tentris", &[4.0, 1.0, 3.0, 2.0]).unwrap();

        assert_eq!(stats.q1, 1.75);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.q3, 3.25);
        assert_eq!(stats.lower, 1.0);
        assert_eq!(stats.upper, 4.0);
        assert!(stats.outliers.is_empty());
    }

    #[test]
    fn values_beyond_the_fences_are_outliers() {
        let stats = BoxStats::new("tentris", &[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();

        assert_eq!(stats.q1, 2.0);
        assert_eq!(stats.q3, 4.0);
        assert_eq!(stats.upper, 7.0);
        assert_eq!(stats.outliers, vec![100.0]);
    }

    #[test]
    fn single_value_collapses_the_box() {
        let stats = BoxStats::new("tentris", &[5.0]).unwrap();

        assert_eq!((stats.lower, stats.q1, stats.median, stats.q3, stats.upper), (5.0, 5.0, 5.0, 5.0, 5.0));
        assert!(BoxStats::new("tentris", &[]).is_none());
    }

    #[test]
    fn bars_cover_every_triplestore() {
        let benchmarks = [
            task("swdf", "tentris", Some(2.5), 10.4),
            task("swdf", "fuseki", None, 3.5),
            task("dbpedia", "virtuoso", Some(7.0), 1.0),
        ];

        let series = bar_series(&benchmarks, BarMetric::QueriesPerHour);
        let swdf = &series[&ChartGroup {
            dataset: "swdf".to_owned(),
            no_clients: 1,
        }];

        assert_eq!(series.len(), 2);
        assert_eq!(
            swdf.iter().map(|bar| (bar.triplestore.as_str(), bar.value)).collect::<Vec<_>>(),
            [("fuseki", 0.0), ("tentris", 2.0), ("virtuoso", 0.0)]
        );
    }

    #[test]
    fn renderer_writes_one_file_per_chart() {
        let dir = tempfile::tempdir().unwrap();
        let benchmarks = [task("swdf", "tentris", Some(2.0), 1.0)];

        let written = VegaLiteRenderer.render(&benchmarks, &[], dir.path()).unwrap();

        let names: Vec<String> = written
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            [
                "swdf_01-clients_PenalizedAvgQPS.vl.json",
                "swdf_01-clients_QMPH.vl.json"
            ]
        );
        let chart: Value =
            serde_json::from_reader(File::open(&written[1]).unwrap()).unwrap();
        assert_eq!(chart["data"]["values"][0]["value"], json!(2.0));
    }
}
