use crate::error::ExtractionError;
use crate::penalty::PenaltyPolicy;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Layouts of timestamps without a UTC offset that are accepted as start times.
const NAIVE_LAYOUTS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
/// Layouts of timestamps with a UTC offset that are accepted as start times.
const OFFSET_LAYOUTS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

/// The start time of a task as written in the result file.
///
/// The wall-clock time is kept as written; the UTC offset is kept if the source had one. The
/// textual form is `YYYY-MM-DD HH:MM:SS[.fraction][+HH:MM]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StartTime {
    local: NaiveDateTime,
    offset: Option<FixedOffset>,
}

impl StartTime {
    pub fn new(local: NaiveDateTime, offset: Option<FixedOffset>) -> Self {
        Self { local, offset }
    }

    /// The wall-clock time as written in the source.
    pub fn local(&self) -> NaiveDateTime {
        self.local
    }

    pub fn offset(&self) -> Option<FixedOffset> {
        self.offset
    }

    /// Formats the start time for use in file names.
    pub fn file_name_component(&self) -> String {
        self.local.format("%Y-%m-%d_%H-%M-%S").to_string()
    }
}

impl FromStr for StartTime {
    type Err = ExtractionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if let Ok(time) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self::new(time.naive_local(), Some(*time.offset())));
        }
        for layout in OFFSET_LAYOUTS {
            if let Ok(time) = DateTime::parse_from_str(trimmed, layout) {
                return Ok(Self::new(time.naive_local(), Some(*time.offset())));
            }
        }
        for layout in NAIVE_LAYOUTS {
            if let Ok(time) = NaiveDateTime::parse_from_str(trimmed, layout) {
                return Ok(Self::new(time, None));
            }
        }
        Err(ExtractionError::MalformedTimestamp {
            value: value.to_owned(),
        })
    }
}

impl Display for StartTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.local.format("%Y-%m-%d %H:%M:%S%.f"))?;
        if let Some(offset) = self.offset {
            write!(f, "{offset}")?;
        }
        Ok(())
    }
}

impl Serialize for StartTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StartTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(de::Error::custom)
    }
}

/// The identifier of a query within a task.
///
/// Depending on the result schema, query identifiers are numbers (`sparql12` becomes `12`) or
/// arbitrary strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum QueryId {
    Numeric(u64),
    Text(String),
}

impl QueryId {
    /// Derives a query id from the raw identifier found in the graph.
    ///
    /// Only the last path segment is considered, and within it everything up to and including the
    /// last `sparql` marker is stripped.
    pub fn from_raw(raw: &str) -> Self {
        let segment = raw.rsplit('/').next().unwrap_or(raw);
        let id = match segment.rfind("sparql") {
            Some(index) if index + "sparql".len() < segment.len() => {
                &segment[index + "sparql".len()..]
            }
            _ => segment,
        };
        QueryId::parse_or_text(id.to_owned())
    }

    /// Ids that are not a `u64` are kept as text.
    fn parse_or_text(id: String) -> Self {
        id.parse()
            .map_or_else(|_| QueryId::Text(id), QueryId::Numeric)
    }
}

impl Display for QueryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryId::Numeric(id) => write!(f, "{id}"),
            QueryId::Text(id) => f.write_str(id),
        }
    }
}

impl Serialize for QueryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            QueryId::Numeric(id) => serializer.serialize_u64(*id),
            QueryId::Text(id) => serializer.serialize_str(id),
        }
    }
}

impl<'de> Deserialize<'de> for QueryId {
    /// Reads the id from its textual form, whatever type the format infers for it.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = String::deserialize(deserializer)?;
        Ok(QueryId::parse_or_text(id))
    }
}

/// How query executions are ordered within a task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QueryOrdering {
    /// Numeric ids in numeric order, followed by textual ids in lexicographic order.
    #[default]
    Natural,
    /// All ids compared by their textual representation.
    Lexicographic,
}

impl QueryOrdering {
    pub fn compare(self, lhs: &QueryId, rhs: &QueryId) -> Ordering {
        match self {
            QueryOrdering::Natural => match (lhs, rhs) {
                (QueryId::Numeric(lhs), QueryId::Numeric(rhs)) => lhs.cmp(rhs),
                (QueryId::Numeric(_), QueryId::Text(_)) => Ordering::Less,
                (QueryId::Text(_), QueryId::Numeric(_)) => Ordering::Greater,
                (QueryId::Text(lhs), QueryId::Text(rhs)) => lhs.cmp(rhs),
            },
            QueryOrdering::Lexicographic => lhs.to_string().cmp(&rhs.to_string()),
        }
    }
}

/// The execution mode of the workers of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskFormat {
    #[serde(rename = "HTTP")]
    Http,
    #[serde(rename = "CLI")]
    Cli,
}

impl TaskFormat {
    /// Derives the format from an IGUANA worker class name.
    pub fn from_worker_type(worker_type: &str) -> Self {
        if worker_type.to_ascii_uppercase().contains("CLI") {
            TaskFormat::Cli
        } else {
            TaskFormat::Http
        }
    }
}

impl Display for TaskFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskFormat::Http => f.write_str("HTTP"),
            TaskFormat::Cli => f.write_str("CLI"),
        }
    }
}

/// The descriptive attributes of a task as they are found in the result graph.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskMetadata {
    pub benchmark_id: String,
    pub format: TaskFormat,
    pub dataset: String,
    pub triplestore: String,
    pub no_clients: u32,
    pub start_time: StartTime,
    pub runtime: f64,
    pub queries_per_hour: Option<f64>,
    pub average_qps: Option<f64>,
    pub query_count: Option<u64>,
    pub queries_per_hour_normalized: Option<f64>,
}

/// One benchmark task with its finalized penalized average.
///
/// The serialized form is the per-task JSON record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkTask {
    #[serde(rename = "benchmarkID")]
    pub benchmark_id: String,
    pub format: TaskFormat,
    pub dataset: String,
    pub triplestore: String,
    #[serde(rename = "noclients")]
    pub no_clients: u32,
    #[serde(rename = "starttime")]
    pub start_time: StartTime,
    pub runtime: f64,
    #[serde(rename = "QMPH")]
    pub queries_per_hour: Option<f64>,
    #[serde(rename = "AvgQPS")]
    pub average_qps: Option<f64>,
    #[serde(rename = "PenalizedAvgQPS")]
    pub penalized_average_qps: f64,
    #[serde(rename = "NoQ")]
    pub query_count: Option<u64>,
    #[serde(rename = "NoQPH")]
    pub queries_per_hour_normalized: Option<f64>,
}

impl BenchmarkTask {
    pub fn new(metadata: TaskMetadata, penalized_average_qps: f64) -> Self {
        Self {
            benchmark_id: metadata.benchmark_id,
            format: metadata.format,
            dataset: metadata.dataset,
            triplestore: metadata.triplestore,
            no_clients: metadata.no_clients,
            start_time: metadata.start_time,
            runtime: metadata.runtime,
            queries_per_hour: metadata.queries_per_hour,
            average_qps: metadata.average_qps,
            penalized_average_qps,
            query_count: metadata.query_count,
            queries_per_hour_normalized: metadata.queries_per_hour_normalized,
        }
    }

    /// Returns the file name stem of the task's output files.
    ///
    /// Two tasks that agree on format, dataset, client count, triplestore and start time (to the
    /// second) share a stem.
    pub fn file_stem(&self) -> String {
        format!(
            "{}_{}_{:02}-clients_{}_{}",
            self.format,
            self.dataset,
            self.no_clients,
            self.triplestore,
            self.start_time.file_name_component()
        )
    }
}

/// The metrics of one query as found in the result graph.
#[derive(Clone, Debug, PartialEq)]
pub struct RawQueryExecution {
    pub query_id: QueryId,
    pub qps: f64,
    /// Missing in schemas that do not record penalized metrics.
    pub penalized_qps: Option<f64>,
    pub succeeded: u64,
    pub failed: u64,
    pub timeouts: u64,
    pub unknown_exceptions: u64,
    pub wrong_codes: u64,
    pub total_time: f64,
    pub result_size: Option<u64>,
}

/// One row of the per-task CSV file.
///
/// The field order is the column order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryExecutionRecord {
    #[serde(rename = "starttime")]
    pub start_time: StartTime,
    #[serde(rename = "benchmarkID")]
    pub benchmark_id: String,
    pub format: TaskFormat,
    pub dataset: String,
    pub triplestore: String,
    #[serde(rename = "noclients")]
    pub no_clients: u32,
    #[serde(rename = "queryID")]
    pub query_id: QueryId,
    pub qps: f64,
    #[serde(rename = "penalizedQps")]
    pub penalized_qps: f64,
    pub succeeded: u64,
    pub failed: u64,
    pub timeouts: u64,
    #[serde(rename = "unknownExceptions")]
    pub unknown_exceptions: u64,
    #[serde(rename = "wrongCodes")]
    pub wrong_codes: u64,
    #[serde(rename = "totaltime")]
    pub total_time: f64,
    #[serde(rename = "resultsize")]
    pub result_size: Option<u64>,
    #[serde(rename = "penalizedtime")]
    pub penalized_time: f64,
}

impl QueryExecutionRecord {
    /// Creates the record of `raw` within `task`, applying the penalty `policy`.
    ///
    /// If the schema does not provide a penalized QPS, it is derived from the penalized time as
    /// `(succeeded + failed) / penalized seconds`.
    #[allow(clippy::cast_precision_loss, reason = "Execution counts are far below 2^53")]
    pub fn new(task: &TaskMetadata, raw: RawQueryExecution, policy: PenaltyPolicy) -> Self {
        let penalized_time = policy.penalized_time(raw.total_time, raw.failed);
        let penalized_qps = raw.penalized_qps.unwrap_or_else(|| {
            if penalized_time > 0.0 {
                (raw.succeeded + raw.failed) as f64 / (penalized_time / 1000.0)
            } else {
                0.0
            }
        });

        Self {
            start_time: task.start_time,
            benchmark_id: task.benchmark_id.clone(),
            format: task.format,
            dataset: task.dataset.clone(),
            triplestore: task.triplestore.clone(),
            no_clients: task.no_clients,
            query_id: raw.query_id,
            qps: raw.qps,
            penalized_qps,
            succeeded: raw.succeeded,
            failed: raw.failed,
            timeouts: raw.timeouts,
            unknown_exceptions: raw.unknown_exceptions,
            wrong_codes: raw.wrong_codes,
            total_time: raw.total_time,
            result_size: raw.result_size,
            penalized_time,
        }
    }

    /// Returns whether the denormalized task fields agree with `task`.
    pub fn belongs_to(&self, task: &BenchmarkTask) -> bool {
        self.start_time == task.start_time
            && self.benchmark_id == task.benchmark_id
            && self.format == task.format
            && self.dataset == task.dataset
            && self.triplestore == task.triplestore
            && self.no_clients == task.no_clients
    }
}
