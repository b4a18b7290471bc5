use crate::error::ExtractionError;
use crate::graph::ResultGraph;
use crate::model::{QueryId, RawQueryExecution, TaskFormat, TaskMetadata};
use crate::pattern::{var, GraphPattern, Solution};
use crate::schema::{
    benchmark_id, bound, client_count, count, distinct_values, lexical, number,
    optional_count, optional_number, optional_value, result_size, single_value, ResultSchema,
};
use crate::vocab::{iont, iprop, rdfs};
use itertools::Itertools;
use oxrdf::vocab::rdf;
use oxrdf::{NamedNodeRef, Term};
use std::collections::HashSet;

/// The shape of result files written by IGUANA 3.x.
///
/// A file may hold several tasks, each typed as `iont:Task`. Every attribute is reachable from the
/// task node: the dataset through the experiment that links the task, the workers through
/// `iprop:workerResult`, and the aggregated per-query statistics through `iprop:query`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TaskGraphSchema;

impl TaskGraphSchema {
    fn tasks_pattern() -> GraphPattern {
        GraphPattern::new("task").triple(var("task"), rdf::TYPE, iont::TASK)
    }

    fn start_time_pattern() -> GraphPattern {
        GraphPattern::new("task start time").triple(
            var("task"),
            iprop::START_DATE,
            var("starttime"),
        )
    }

    fn time_limit_pattern() -> GraphPattern {
        GraphPattern::new("task time limit").triple(
            var("task"),
            iprop::TIME_LIMIT,
            var("runtime"),
        )
    }

    fn clients_pattern() -> GraphPattern {
        GraphPattern::new("task client count").triple(
            var("task"),
            iprop::NO_OF_WORKERS,
            var("clients"),
        )
    }

    fn dataset_pattern() -> GraphPattern {
        GraphPattern::new("task dataset")
            .triple(var("experiment"), iprop::TASK, var("task"))
            .triple(var("experiment"), iprop::DATASET, var("ds"))
            .triple(var("ds"), rdfs::LABEL, var("dataset"))
    }

    fn triplestore_pattern() -> GraphPattern {
        GraphPattern::new("task triplestore")
            .triple(var("task"), iprop::CONNECTION, var("ts"))
            .triple(var("ts"), rdfs::LABEL, var("triplestore"))
    }

    fn worker_type_pattern() -> GraphPattern {
        GraphPattern::new("task worker type")
            .triple(var("task"), iprop::WORKER_RESULT, var("worker"))
            .triple(var("worker"), iprop::WORKER_TYPE, var("type"))
    }

    fn metric_pattern(
        name: &'static str,
        predicate: NamedNodeRef<'static>,
    ) -> GraphPattern {
        GraphPattern::new(name).triple(var("task"), predicate, var("value"))
    }

    fn query_pattern() -> GraphPattern {
        GraphPattern::new("task query statistics")
            .triple(var("task"), iprop::QUERY, var("query"))
            .triple(var("query"), iprop::QUERY_ID, var("queryID"))
            .triple(var("query"), iprop::QPS, var("qps"))
            .triple(var("query"), iprop::SUCCEEDED, var("succeeded"))
            .triple(var("query"), iprop::FAILED, var("failed"))
            .triple(var("query"), iprop::TOTAL_TIME, var("totaltime"))
            .optional(var("query"), iprop::PENALIZED_QPS, var("penalizedqps"))
            .optional(var("query"), iprop::TIMEOUTS, var("timeouts"))
            .optional(var("query"), iprop::UNKNOWN_EXCEPTION, var("unknownexceptions"))
            .optional(var("query"), iprop::WRONG_CODES, var("wrongcodes"))
            .optional(var("query"), iprop::RESULT_SIZE, var("resultsize"))
    }

    /// Resolves the format of a task from the types of its workers.
    ///
    /// Tasks without worker results are HTTP tasks. Tasks that mix HTTP and CLI workers have no
    /// single format.
    fn format(graph: &ResultGraph, task: &Term) -> Result<TaskFormat, ExtractionError> {
        let pattern = Self::worker_type_pattern();
        let solutions = graph.query_bound(&pattern, Solution::with("task", task.clone()));
        let formats: Vec<TaskFormat> = distinct_values(&solutions, "type")
            .iter()
            .map(|worker_type| TaskFormat::from_worker_type(lexical(worker_type)))
            .unique()
            .collect();
        match formats.as_slice() {
            [] => Ok(TaskFormat::Http),
            [format] => Ok(*format),
            _ => Err(ExtractionError::AmbiguousMatch {
                pattern: pattern.name(),
                variable: "type",
                count: formats.len(),
            }),
        }
    }

    fn metric(
        graph: &ResultGraph,
        task: &Term,
        name: &'static str,
        predicate: NamedNodeRef<'static>,
    ) -> Result<Option<Term>, ExtractionError> {
        optional_value(
            graph,
            &Self::metric_pattern(name, predicate),
            Solution::with("task", task.clone()),
            "value",
        )
    }
}

impl ResultSchema for TaskGraphSchema {
    fn name(&self) -> &'static str {
        "task-graph"
    }

    fn tasks(&self, graph: &ResultGraph) -> Result<Vec<Term>, ExtractionError> {
        let pattern = Self::tasks_pattern();
        let mut tasks = distinct_values(&graph.query(&pattern), "task");
        if tasks.is_empty() {
            return Err(ExtractionError::SchemaMismatch {
                pattern: pattern.name(),
            });
        }
        tasks.sort_by(|lhs, rhs| lexical(lhs).cmp(lexical(rhs)));
        Ok(tasks)
    }

    fn metadata(
        &self,
        graph: &ResultGraph,
        task: &Term,
    ) -> Result<TaskMetadata, ExtractionError> {
        let bound_task = || Solution::with("task", task.clone());
        let start_time =
            single_value(graph, &Self::start_time_pattern(), bound_task(), "starttime")?;
        let runtime = single_value(graph, &Self::time_limit_pattern(), bound_task(), "runtime")?;
        let clients = single_value(graph, &Self::clients_pattern(), bound_task(), "clients")?;
        let dataset = single_value(graph, &Self::dataset_pattern(), bound_task(), "dataset")?;
        let triplestore =
            single_value(graph, &Self::triplestore_pattern(), bound_task(), "triplestore")?;

        let qmph = Self::metric(graph, task, "task QMPH", iprop::QMPH)?;
        let avg_qps = Self::metric(graph, task, "task AvgQPS", iprop::AVG_QPS)?;
        let noq = Self::metric(graph, task, "task NoQ", iprop::NOQ)?;
        let noqph = Self::metric(graph, task, "task NoQPH", iprop::NOQPH)?;

        Ok(TaskMetadata {
            benchmark_id: benchmark_id(task),
            format: Self::format(graph, task)?,
            dataset: lexical(&dataset).to_owned(),
            triplestore: lexical(&triplestore).to_owned(),
            no_clients: client_count(&clients)?,
            start_time: lexical(&start_time).parse()?,
            runtime: number("runtime", &runtime)?,
            queries_per_hour: optional_number("QMPH", qmph.as_ref())?,
            average_qps: optional_number("AvgQPS", avg_qps.as_ref())?,
            query_count: noq.as_ref().map(|noq| count("NoQ", noq)).transpose()?,
            queries_per_hour_normalized: optional_number("NoQPH", noqph.as_ref())?,
        })
    }

    fn query_executions(
        &self,
        graph: &ResultGraph,
        task: &Term,
    ) -> Result<Vec<RawQueryExecution>, ExtractionError> {
        let pattern = Self::query_pattern();
        let solutions = graph.query_bound(&pattern, Solution::with("task", task.clone()));
        if solutions.is_empty() {
            return Err(ExtractionError::SchemaMismatch {
                pattern: pattern.name(),
            });
        }

        // Each query node must contribute exactly one row.
        let mut seen = HashSet::new();
        for solution in &solutions {
            let query = bound(solution, &pattern, "query")?;
            if !seen.insert(query) {
                return Err(ExtractionError::AmbiguousMatch {
                    pattern: pattern.name(),
                    variable: "query",
                    count: solutions.iter().filter(|s| s.get("query") == Some(query)).count(),
                });
            }
        }

        solutions
            .iter()
            .map(|solution| {
                Ok(RawQueryExecution {
                    query_id: QueryId::from_raw(lexical(bound(solution, &pattern, "queryID")?)),
                    qps: number("qps", bound(solution, &pattern, "qps")?)?,
                    penalized_qps: optional_number(
                        "penalizedQps",
                        solution.get("penalizedqps"),
                    )?,
                    succeeded: count("succeeded", bound(solution, &pattern, "succeeded")?)?,
                    failed: count("failed", bound(solution, &pattern, "failed")?)?,
                    timeouts: optional_count("timeouts", solution.get("timeouts"))?,
                    unknown_exceptions: optional_count(
                        "unknownExceptions",
                        solution.get("unknownexceptions"),
                    )?,
                    wrong_codes: optional_count("wrongCodes", solution.get("wrongcodes"))?,
                    total_time: number("totaltime", bound(solution, &pattern, "totaltime")?)?,
                    result_size: result_size(solution.get("resultsize")),
                })
            })
            .collect()
    }
}
