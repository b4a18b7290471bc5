use crate::error::ExtractionError;
use crate::graph::ResultGraph;
use crate::model::{BenchmarkTask, QueryExecutionRecord, QueryOrdering};
use crate::penalty::{PenalizedAverage, PenaltyPolicy};
use crate::schema::ResultSchema;
use tracing::debug;

/// A task together with its query executions, ordered by query id.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskResults {
    pub task: BenchmarkTask,
    pub queries: Vec<QueryExecutionRecord>,
}

/// Extracts every task of `graph` using `schema`.
///
/// Any missing or ambiguous attribute aborts the extraction of the whole graph.
pub fn extract_tasks(
    graph: &ResultGraph,
    schema: &dyn ResultSchema,
    penalty: PenaltyPolicy,
    ordering: QueryOrdering,
) -> Result<Vec<TaskResults>, ExtractionError> {
    schema
        .tasks(graph)?
        .iter()
        .map(|task| {
            let metadata = schema.metadata(graph, task)?;
            let mut raw = schema.query_executions(graph, task)?;
            raw.sort_by(|lhs, rhs| ordering.compare(&lhs.query_id, &rhs.query_id));

            let mut average = PenalizedAverage::default();
            let queries: Vec<QueryExecutionRecord> = raw
                .into_iter()
                .map(|raw| {
                    let record = QueryExecutionRecord::new(&metadata, raw, penalty);
                    average.add(record.penalized_qps);
                    record
                })
                .collect();

            debug!(
                schema = schema.name(),
                benchmark = %metadata.benchmark_id,
                queries = queries.len(),
                "Extracted task"
            );
            Ok(TaskResults {
                task: BenchmarkTask::new(metadata, average.finish()),
                queries,
            })
        })
        .collect()
}
