use crate::error::ExtractionError;
use crate::graph::ResultGraph;
use crate::model::{QueryId, RawQueryExecution, TaskFormat, TaskMetadata};
use crate::pattern::{var, GraphPattern, Solution};
use crate::schema::{
    benchmark_id, bound, client_count, count, distinct_values, lexical, number, result_size,
    single_value, ResultSchema,
};
use crate::vocab::{iprop, rdfs};
use oxrdf::Term;

/// The shape of result files written by IGUANA 2.x.
///
/// A file holds exactly one task. Start time, time limit, dataset and connection are attached to
/// anonymous experiment nodes and are looked up graph-wide. Query statistics are not linked to the
/// task, use the misspelled `iprop:succeded` counter, and carry no penalized metrics. All workers
/// are HTTP workers.
#[derive(Clone, Copy, Debug, Default)]
pub struct LegacySchema;

impl LegacySchema {
    fn tasks_pattern() -> GraphPattern {
        GraphPattern::new("legacy task")
            .triple(var("experiment"), iprop::TASK, var("task"))
            .triple(var("task"), iprop::NO_OF_WORKERS, var("clients"))
    }

    fn clients_pattern() -> GraphPattern {
        GraphPattern::new("legacy client count").triple(
            var("task"),
            iprop::NO_OF_WORKERS,
            var("clients"),
        )
    }

    fn start_time_pattern() -> GraphPattern {
        GraphPattern::new("legacy start time").triple(
            var("experiment"),
            rdfs::START_DATE,
            var("starttime"),
        )
    }

    fn time_limit_pattern() -> GraphPattern {
        GraphPattern::new("legacy time limit").triple(
            var("experiment"),
            iprop::TIME_LIMIT,
            var("runtime"),
        )
    }

    fn dataset_pattern() -> GraphPattern {
        GraphPattern::new("legacy dataset")
            .triple(var("experiment"), iprop::DATASET, var("ds"))
            .triple(var("ds"), rdfs::LABEL, var("dataset"))
    }

    fn triplestore_pattern() -> GraphPattern {
        GraphPattern::new("legacy triplestore")
            .triple(var("experiment"), iprop::CONNECTION, var("ts"))
            .triple(var("ts"), rdfs::LABEL, var("triplestore"))
    }

    fn query_pattern() -> GraphPattern {
        GraphPattern::new("legacy query statistics")
            .triple(var("query"), iprop::QUERIES_PER_SECOND, var("qps"))
            .triple(var("query"), iprop::ID, var("queryID"))
            .triple(var("query"), iprop::FAILED, var("failed"))
            .triple(var("query"), iprop::SUCCEDED, var("succeeded"))
            .triple(var("query"), iprop::TOTAL_TIME, var("totaltime"))
            .optional(var("query"), iprop::RESULT_SIZE, var("resultsize"))
    }
}

impl ResultSchema for LegacySchema {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn tasks(&self, graph: &ResultGraph) -> Result<Vec<Term>, ExtractionError> {
        let pattern = Self::tasks_pattern();
        let tasks = distinct_values(&graph.query(&pattern), "task");
        if tasks.is_empty() {
            return Err(ExtractionError::SchemaMismatch {
                pattern: pattern.name(),
            });
        }
        Ok(tasks)
    }

    fn metadata(
        &self,
        graph: &ResultGraph,
        task: &Term,
    ) -> Result<TaskMetadata, ExtractionError> {
        let start_time = single_value(
            graph,
            &Self::start_time_pattern(),
            Solution::default(),
            "starttime",
        )?;
        let runtime = single_value(
            graph,
            &Self::time_limit_pattern(),
            Solution::default(),
            "runtime",
        )?;
        let dataset =
            single_value(graph, &Self::dataset_pattern(), Solution::default(), "dataset")?;
        let triplestore = single_value(
            graph,
            &Self::triplestore_pattern(),
            Solution::default(),
            "triplestore",
        )?;
        let clients = single_value(
            graph,
            &Self::clients_pattern(),
            Solution::with("task", task.clone()),
            "clients",
        )?;

        Ok(TaskMetadata {
            benchmark_id: benchmark_id(task),
            format: TaskFormat::Http,
            dataset: lexical(&dataset).to_owned(),
            triplestore: lexical(&triplestore).to_owned(),
            no_clients: client_count(&clients)?,
            start_time: lexical(&start_time).parse()?,
            runtime: number("runtime", &runtime)?,
            queries_per_hour: None,
            average_qps: None,
            query_count: None,
            queries_per_hour_normalized: None,
        })
    }

    fn query_executions(
        &self,
        graph: &ResultGraph,
        _task: &Term,
    ) -> Result<Vec<RawQueryExecution>, ExtractionError> {
        let pattern = Self::query_pattern();
        let solutions = graph.query(&pattern);
        if solutions.is_empty() {
            return Err(ExtractionError::SchemaMismatch {
                pattern: pattern.name(),
            });
        }

        solutions
            .iter()
            .map(|solution| {
                Ok(RawQueryExecution {
                    query_id: QueryId::from_raw(lexical(bound(solution, &pattern, "queryID")?)),
                    qps: number("qps", bound(solution, &pattern, "qps")?)?,
                    penalized_qps: None,
                    succeeded: count("succeeded", bound(solution, &pattern, "succeeded")?)?,
                    failed: count("failed", bound(solution, &pattern, "failed")?)?,
                    timeouts: 0,
                    unknown_exceptions: 0,
                    wrong_codes: 0,
                    total_time: number("totaltime", bound(solution, &pattern, "totaltime")?)?,
                    result_size: result_size(solution.get("resultsize")),
                })
            })
            .collect()
    }
}
