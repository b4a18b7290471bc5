//! Conversion of [IGUANA](https://github.com/dice-group/IGUANA) benchmark results into tables.
//!
//! IGUANA writes the results of a benchmark as an RDF graph. This crate locates the benchmark
//! tasks in such a graph, extracts their metadata and per-query metrics, applies a penalty for
//! failed queries, and writes one CSV file (one row per query) and one JSON file (the task
//! metadata) per task. The per-task files can then be concatenated into `all_results.csv` and
//! `all_results.json` and drawn as charts.
//!
//! ```text
//! result file -> ResultGraph -> ResultSchema -> TaskResults -> {stem}.csv / {stem}.json
//!                                                            -> all_results.csv / .json -> charts
//! ```

pub mod aggregate;
pub mod chart;
mod config;
mod convert;
pub mod error;
mod extract;
mod graph;
mod model;
pub mod output;
pub mod pattern;
mod penalty;
pub mod schema;
pub mod vocab;

pub use aggregate::{aggregate, discover_task_outputs, AggregatedResults, TaskOutput};
pub use config::{ConversionConfig, ParseOptions};
pub use convert::{
    convert_directory, convert_file, convert_graph, discover_input_files, extract_file,
    ConversionSummary, FileFailure, INPUT_EXTENSIONS,
};
pub use extract::{extract_tasks, TaskResults};
pub use graph::ResultGraph;
pub use model::{
    BenchmarkTask, QueryExecutionRecord, QueryId, QueryOrdering, RawQueryExecution, StartTime,
    TaskFormat, TaskMetadata,
};
pub use penalty::{PenalizedAverage, PenaltyPolicy};
pub use schema::SchemaVersion;

// Re-export the serialization identifier used by `ResultGraph::parse_slice`.
pub use oxrdfio::RdfFormat;
