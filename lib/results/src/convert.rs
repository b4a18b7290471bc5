use crate::aggregate::TaskOutput;
use crate::config::ConversionConfig;
use crate::error::{ConversionError, ExtractionError};
use crate::extract::{extract_tasks, TaskResults};
use crate::graph::ResultGraph;
use crate::output::write_task;
use rayon::prelude::*;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Extensions of the result files that are converted.
pub const INPUT_EXTENSIONS: [&str; 2] = ["nt", "ttl"];

/// Prefix of intermediate files written by earlier conversion tools.
const INTERMEDIATE_PREFIX: &str = "cleaned_";

/// Lists the result files in `input_dir`, sorted by path.
pub fn discover_input_files(input_dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(input_dir)? {
        let path = entry?.path();
        let is_result_file = path
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|extension| INPUT_EXTENSIONS.contains(&extension));
        let is_intermediate = path
            .file_name()
            .and_then(OsStr::to_str)
            .is_some_and(|name| name.starts_with(INTERMEDIATE_PREFIX));
        if path.is_file() && is_result_file && !is_intermediate {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Extracts all tasks of a parsed result graph.
pub fn convert_graph(
    graph: &ResultGraph,
    config: &ConversionConfig,
) -> Result<Vec<TaskResults>, ExtractionError> {
    let schema = config.schema.resolve(graph);
    debug!(schema = schema.name(), "Resolved result schema");
    extract_tasks(graph, schema, config.penalty, config.query_ordering)
}

/// Parses the result file at `path` and extracts its tasks without writing anything.
pub fn extract_file(
    path: &Path,
    config: &ConversionConfig,
) -> Result<Vec<TaskResults>, ConversionError> {
    let graph = ResultGraph::parse(path, &config.parse)?;
    Ok(convert_graph(&graph, config)?)
}

/// Converts the result file at `path` and writes the artifacts of its tasks to `output_dir`.
pub fn convert_file(
    path: &Path,
    output_dir: &Path,
    config: &ConversionConfig,
) -> Result<Vec<TaskOutput>, ConversionError> {
    let tasks = extract_file(path, config)?;
    let mut outputs = Vec::with_capacity(tasks.len());
    for task in &tasks {
        let stem = write_task(output_dir, task)?;
        outputs.push(TaskOutput::new(output_dir, stem));
    }
    Ok(outputs)
}

/// A result file that could not be converted.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: ConversionError,
}

/// The outcome of converting a directory of result files.
#[derive(Debug, Default)]
pub struct ConversionSummary {
    /// The written per-task artifacts, sorted by stem.
    pub outputs: Vec<TaskOutput>,
    /// The files that were skipped, in path order.
    pub failures: Vec<FileFailure>,
}

impl ConversionSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Converts every result file of `input_dir` into per-task artifacts in `output_dir`.
///
/// Files are parsed and extracted in parallel. The artifacts are written afterward in input file
/// order, so if two tasks share a stem, the task of the later file wins. A file that fails is
/// logged and recorded in the summary; the remaining files are still converted.
pub fn convert_directory(
    input_dir: &Path,
    output_dir: &Path,
    config: &ConversionConfig,
) -> io::Result<ConversionSummary> {
    let files = discover_input_files(input_dir)?;
    info!(
        files = files.len(),
        dir = %input_dir.display(),
        "Converting result files"
    );

    let extracted: Vec<(PathBuf, Result<Vec<TaskResults>, ConversionError>)> = files
        .into_par_iter()
        .map(|path| {
            let tasks = extract_file(&path, config);
            (path, tasks)
        })
        .collect();

    let mut summary = ConversionSummary::default();
    let mut stems = HashSet::new();
    for (path, tasks) in extracted {
        let written = tasks.and_then(|tasks| {
            tasks
                .iter()
                .map(|task| Ok(write_task(output_dir, task)?))
                .collect::<Result<Vec<_>, ConversionError>>()
        });
        match written {
            Ok(written) => {
                debug!(file = %path.display(), tasks = written.len(), "Converted result file");
                for stem in written {
                    if !stems.insert(stem.clone()) {
                        warn!(
                            file = %path.display(),
                            stem = %stem,
                            "Task overwrites the artifacts of an earlier task"
                        );
                        continue;
                    }
                    summary.outputs.push(TaskOutput::new(output_dir, stem));
                }
            }
            Err(e) => {
                error!(file = %path.display(), "Cannot convert result file: {e}");
                summary.failures.push(FileFailure { path, error: e });
            }
        }
    }

    summary.outputs.sort();
    info!(
        tasks = summary.outputs.len(),
        failed = summary.failures.len(),
        "Finished conversion"
    );
    Ok(summary)
}
