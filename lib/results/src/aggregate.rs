//! Concatenation of the per-task artifacts into `all_results.csv` and `all_results.json`.

use crate::error::OutputError;
use crate::model::{BenchmarkTask, QueryExecutionRecord};
use crate::output::{
    csv_writer, read_task_csv, read_task_json, write_pretty_json, StagedFile, CSV_HEADER,
};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The stem of the aggregated files.
pub const ALL_RESULTS_STEM: &str = "all_results";

/// The CSV and JSON file of one task in an output directory.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TaskOutput {
    pub stem: String,
    pub csv: PathBuf,
    pub json: PathBuf,
}

impl TaskOutput {
    pub fn new(output_dir: &Path, stem: impl Into<String>) -> Self {
        let stem = stem.into();
        Self {
            csv: output_dir.join(format!("{stem}.csv")),
            json: output_dir.join(format!("{stem}.json")),
            stem,
        }
    }
}

/// Finds every per-task CSV/JSON pair in `output_dir`, sorted by stem.
///
/// The aggregated files and CSV files without a JSON sibling are ignored.
pub fn discover_task_outputs(output_dir: &Path) -> Result<Vec<TaskOutput>, OutputError> {
    let mut outputs = Vec::new();
    for entry in fs::read_dir(output_dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if stem == ALL_RESULTS_STEM {
            continue;
        }
        let output = TaskOutput::new(output_dir, stem);
        if output.json.is_file() {
            outputs.push(output);
        } else {
            debug!(file = %path.display(), "Skipping CSV file without metadata");
        }
    }
    outputs.sort();
    Ok(outputs)
}

/// What an aggregation run wrote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregateSummary {
    pub tasks: usize,
    pub rows: usize,
    pub csv: PathBuf,
    pub json: PathBuf,
}

/// Writes `all_results.csv` and `all_results.json` to `output_dir` from `outputs`.
///
/// The outputs are concatenated in stem order, so the result does not depend on the order in
/// which the tasks were converted. Running the aggregation twice over the same inputs produces
/// identical files. Both files are staged first, so a failure leaves the previous aggregate
/// untouched.
pub fn aggregate(
    output_dir: &Path,
    outputs: &[TaskOutput],
) -> Result<AggregateSummary, OutputError> {
    let mut outputs = outputs.to_vec();
    outputs.sort();
    outputs.dedup_by(|lhs, rhs| lhs.stem == rhs.stem);

    let csv_path = output_dir.join(format!("{ALL_RESULTS_STEM}.csv"));
    let (csv, rows) = StagedFile::write(&csv_path, |writer| concatenate_csv(writer, &outputs))?;

    let benchmarks = outputs
        .iter()
        .map(|output| read_task_json(BufReader::new(File::open(&output.json)?)))
        .collect::<Result<Vec<_>, _>>()?;
    let json_path = output_dir.join(format!("{ALL_RESULTS_STEM}.json"));
    let (json, ()) = StagedFile::write(&json_path, |writer| {
        write_pretty_json(writer, serde_json::to_value(BenchmarkList { benchmarks })?)
    })?;

    csv.commit()?;
    json.commit()?;

    info!(
        tasks = outputs.len(),
        rows,
        dir = %output_dir.display(),
        "Aggregated results"
    );
    Ok(AggregateSummary {
        tasks: outputs.len(),
        rows,
        csv: csv_path,
        json: json_path,
    })
}

/// Writes one header followed by the rows of every input file and returns the number of rows.
fn concatenate_csv(target: impl Write, outputs: &[TaskOutput]) -> Result<usize, OutputError> {
    let mut writer = csv_writer(target);
    writer.write_record(CSV_HEADER)?;

    let mut rows = 0;
    for output in outputs {
        let mut reader = csv::Reader::from_path(&output.csv)?;
        let header = reader.headers()?.clone();
        if !header.iter().eq(CSV_HEADER) {
            return Err(OutputError::SchemaDrift {
                file: output.csv.clone(),
                expected: CSV_HEADER.join(","),
                found: header.iter().collect::<Vec<_>>().join(","),
            });
        }
        for record in reader.records() {
            writer.write_record(&record?)?;
            rows += 1;
        }
    }
    writer.flush()?;
    Ok(rows)
}

#[derive(Serialize, Deserialize)]
struct BenchmarkList {
    benchmarks: Vec<BenchmarkTask>,
}

/// The content of `all_results.csv` and `all_results.json`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AggregatedResults {
    pub benchmarks: Vec<BenchmarkTask>,
    pub queries: Vec<QueryExecutionRecord>,
}

impl AggregatedResults {
    /// Loads the aggregated files of `output_dir`.
    pub fn load(output_dir: &Path) -> Result<Self, OutputError> {
        let json = File::open(output_dir.join(format!("{ALL_RESULTS_STEM}.json")))?;
        let BenchmarkList { benchmarks } = serde_json::from_reader(BufReader::new(json))?;
        let csv = File::open(output_dir.join(format!("{ALL_RESULTS_STEM}.csv")))?;
        let queries = read_task_csv(BufReader::new(csv))?;
        Ok(Self {
            benchmarks,
            queries,
        })
    }
}
