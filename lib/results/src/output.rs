//! The per-task CSV and JSON artifacts.

use crate::error::OutputError;
use crate::extract::TaskResults;
use crate::model::{BenchmarkTask, QueryExecutionRecord};
use csv::QuoteStyle;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The columns of every per-task and aggregated CSV file.
pub const CSV_HEADER: [&str; 17] = [
    "starttime",
    "benchmarkID",
    "format",
    "dataset",
    "triplestore",
    "noclients",
    "queryID",
    "qps",
    "penalizedQps",
    "succeeded",
    "failed",
    "timeouts",
    "unknownExceptions",
    "wrongCodes",
    "totaltime",
    "resultsize",
    "penalizedtime",
];

/// Creates a CSV writer that quotes every non-numeric field.
///
/// Numeric columns stay machine-readable after concatenation because every file uses the same
/// quoting.
pub(crate) fn csv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(writer)
}

/// Writes the CSV and JSON files of a task to `output_dir` and returns their common stem.
///
/// Existing files are only replaced once both have been written.
pub fn write_task(output_dir: &Path, results: &TaskResults) -> Result<String, OutputError> {
    let stem = results.task.file_stem();

    let (csv, ()) = StagedFile::write(&output_dir.join(format!("{stem}.csv")), |writer| {
        write_task_csv(writer, &results.queries)
    })?;
    let (json, ()) = StagedFile::write(&output_dir.join(format!("{stem}.json")), |writer| {
        write_task_json(writer, &results.task)
    })?;
    csv.commit()?;
    json.commit()?;

    Ok(stem)
}

/// A file written next to its target that replaces the target on [`commit`](Self::commit).
///
/// The staged file is removed if it is dropped before being committed, so a failed write never
/// leaves a truncated target behind.
#[must_use]
pub(crate) struct StagedFile {
    staging: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedFile {
    /// Stages the content produced by `write` for `target`.
    pub(crate) fn write<T>(
        target: &Path,
        write: impl FnOnce(&mut dyn Write) -> Result<T, OutputError>,
    ) -> Result<(Self, T), OutputError> {
        let file_name = target
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let staged = Self {
            staging: target.with_file_name(format!(".{file_name}.partial")),
            target: target.to_owned(),
            committed: false,
        };
        let mut writer = BufWriter::new(File::create(&staged.staging)?);
        let value = write(&mut writer)?;
        writer.flush()?;
        drop(writer);
        Ok((staged, value))
    }

    /// Moves the staged file over the target.
    pub(crate) fn commit(mut self) -> Result<(), OutputError> {
        fs::rename(&self.staging, &self.target)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(error) = fs::remove_file(&self.staging) {
            debug!(file = %self.staging.display(), %error, "Cannot remove staged file");
        }
    }
}

/// Writes the header and one row per query execution.
pub fn write_task_csv<W: Write>(
    writer: W,
    rows: &[QueryExecutionRecord],
) -> Result<(), OutputError> {
    let mut writer = csv_writer(writer);
    writer.write_record(CSV_HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads the rows of a per-task or aggregated CSV file.
pub fn read_task_csv<R: Read>(reader: R) -> Result<Vec<QueryExecutionRecord>, OutputError> {
    let mut reader = csv::Reader::from_reader(reader);
    let rows = reader
        .deserialize::<QueryExecutionRecord>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Writes the metadata record of a task.
pub fn write_task_json<W: Write>(writer: W, task: &BenchmarkTask) -> Result<(), OutputError> {
    write_pretty_json(writer, serde_json::to_value(task)?)
}

pub fn read_task_json<R: Read>(reader: R) -> Result<BenchmarkTask, OutputError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Writes `value` with sorted keys and four-space indentation.
pub(crate) fn write_pretty_json<W: Write>(writer: W, value: Value) -> Result<(), OutputError> {
    let mut serializer =
        serde_json::Serializer::with_formatter(writer, PrettyFormatter::with_indent(b"    "));
    sort_keys(value).serialize(&mut serializer)?;
    Ok(())
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sort_keys(value)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(values) => Value::Array(values.into_iter().map(sort_keys).collect()),
        value => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QueryId, RawQueryExecution, StartTime, TaskFormat, TaskMetadata};
    use crate::penalty::PenaltyPolicy;

    fn metadata() -> TaskMetadata {
        TaskMetadata {
            benchmark_id: "1606/1/1".to_owned(),
            format: TaskFormat::Http,
            dataset: "swdf".to_owned(),
            triplestore: "tentris".to_owned(),
            no_clients: 8,
            start_time: "2020-11-03T10:15:00".parse::<StartTime>().unwrap(),
            runtime: 3_600_000.0,
            queries_per_hour: Some(1234.5),
            average_qps: Some(10.0),
            query_count: Some(2),
            queries_per_hour_normalized: None,
        }
    }

    fn raw(query_id: u64, failed: u64, result_size: Option<u64>) -> RawQueryExecution {
        RawQueryExecution {
            query_id: QueryId::Numeric(query_id),
            qps: 2.5,
            penalized_qps: Some(0.5),
            succeeded: 10,
            failed,
            timeouts: 0,
            unknown_exceptions: failed,
            wrong_codes: 0,
            total_time: 1000.0,
            result_size,
        }
    }

    fn rows() -> Vec<QueryExecutionRecord> {
        let metadata = metadata();
        vec![
            QueryExecutionRecord::new(&metadata, raw(1, 2, Some(42)), PenaltyPolicy::default()),
            QueryExecutionRecord::new(&metadata, raw(2, 0, None), PenaltyPolicy::default()),
        ]
    }

    #[test]
    fn stem_follows_naming_scheme() {
        let task = BenchmarkTask::new(metadata(), 0.5);

        assert_eq!(
            task.file_stem(),
            "HTTP_swdf_08-clients_tentris_2020-11-03_10-15-00"
        );
    }

    #[test]
    fn csv_quotes_non_numeric_fields() {
        let mut buffer = Vec::new();
        write_task_csv(&mut buffer, &rows()[..1]).unwrap();

        insta::assert_snapshot!(String::from_utf8(buffer).unwrap(), @r#"
        "starttime","benchmarkID","format","dataset","triplestore","noclients","queryID","qps","penalizedQps","succeeded","failed","timeouts","unknownExceptions","wrongCodes","totaltime","resultsize","penalizedtime"
        "2020-11-03 10:15:00","1606/1/1","HTTP","swdf","tentris",8,1,2.5,0.5,10,2,0,2,0,1000.0,42,361000.0
        "#);
    }

    #[test]
    fn csv_round_trip() {
        let rows = rows();
        let mut buffer = Vec::new();
        write_task_csv(&mut buffer, &rows).unwrap();

        let read = read_task_csv(buffer.as_slice()).unwrap();

        assert_eq!(read, rows);
        assert_eq!(read[1].result_size, None);
    }

    #[test]
    fn csv_round_trip_keeps_textual_query_ids() {
        let metadata = metadata();
        let ids = ["q-1", "-1", "1.5", "true", "18446744073709551616"];
        let rows: Vec<_> = ids
            .iter()
            .map(|id| {
                let mut raw = raw(0, 0, None);
                raw.query_id = QueryId::Text((*id).to_owned());
                QueryExecutionRecord::new(&metadata, raw, PenaltyPolicy::default())
            })
            .collect();
        let mut buffer = Vec::new();
        write_task_csv(&mut buffer, &rows).unwrap();

        let read = read_task_csv(buffer.as_slice()).unwrap();

        assert_eq!(read, rows);
    }

    #[test]
    fn failed_staged_write_keeps_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("task.csv");
        fs::write(&target, "previous").unwrap();

        let result = StagedFile::write(&target, |writer| {
            writer.write_all(b"partial")?;
            Err::<(), _>(OutputError::SchemaDrift {
                file: target.clone(),
                expected: String::new(),
                found: String::new(),
            })
        });

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&target).unwrap(), "previous");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn json_has_sorted_keys() {
        let mut buffer = Vec::new();
        write_task_json(&mut buffer, &BenchmarkTask::new(metadata(), 0.5)).unwrap();

        insta::assert_snapshot!(String::from_utf8(buffer).unwrap(), @r#"
        {
            "AvgQPS": 10.0,
            "NoQ": 2,
            "NoQPH": null,
            "PenalizedAvgQPS": 0.5,
            "QMPH": 1234.5,
            "benchmarkID": "1606/1/1",
            "dataset": "swdf",
            "format": "HTTP",
            "noclients": 8,
            "runtime": 3600000.0,
            "starttime": "2020-11-03 10:15:00",
            "triplestore": "tentris"
        }
        "#);
    }

    #[test]
    fn json_round_trip() {
        let task = BenchmarkTask::new(metadata(), 0.5);
        let mut buffer = Vec::new();
        write_task_json(&mut buffer, &task).unwrap();

        assert_eq!(read_task_json(buffer.as_slice()).unwrap(), task);
    }
}
