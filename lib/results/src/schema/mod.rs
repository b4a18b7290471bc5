//! Adapters for the different shapes of IGUANA result graphs.
//!
//! Property names, spellings and the placement of attributes changed between IGUANA releases. Each
//! release family is described by one [ResultSchema] implementation so that the extraction
//! pipeline does not depend on any particular shape.

mod legacy;
mod task_graph;

use crate::error::ExtractionError;
use crate::graph::ResultGraph;
use crate::model::{RawQueryExecution, TaskMetadata};
use crate::pattern::{GraphPattern, Solution};
use crate::vocab::iont;
use itertools::Itertools;
pub use legacy::LegacySchema;
use oxrdf::Term;
use std::fmt::{Display, Formatter};
pub use task_graph::TaskGraphSchema;

/// A set of graph patterns that locate tasks and their metrics in a result graph.
pub trait ResultSchema: Send + Sync {
    /// Returns the name of the schema.
    fn name(&self) -> &'static str;

    /// Returns the nodes of all tasks in `graph`.
    fn tasks(&self, graph: &ResultGraph) -> Result<Vec<Term>, ExtractionError>;

    /// Resolves the descriptive attributes of `task`.
    fn metadata(&self, graph: &ResultGraph, task: &Term)
        -> Result<TaskMetadata, ExtractionError>;

    /// Resolves the per-query metrics of `task`.
    ///
    /// The result is never empty and in no particular order.
    fn query_executions(
        &self,
        graph: &ResultGraph,
        task: &Term,
    ) -> Result<Vec<RawQueryExecution>, ExtractionError>;
}

/// Selects the [ResultSchema] used for a result graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SchemaVersion {
    /// Uses [TaskGraphSchema] if the graph contains typed task nodes, [LegacySchema] otherwise.
    #[default]
    Auto,
    Legacy,
    TaskGraph,
}

impl SchemaVersion {
    /// Returns the schema for `graph`.
    pub fn resolve(self, graph: &ResultGraph) -> &'static dyn ResultSchema {
        static LEGACY: LegacySchema = LegacySchema;
        static TASK_GRAPH: TaskGraphSchema = TaskGraphSchema;

        match self {
            SchemaVersion::Legacy => &LEGACY,
            SchemaVersion::TaskGraph => &TASK_GRAPH,
            SchemaVersion::Auto if graph.has_instance_of(iont::TASK) => &TASK_GRAPH,
            SchemaVersion::Auto => &LEGACY,
        }
    }
}

impl Display for SchemaVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaVersion::Auto => f.write_str("auto"),
            SchemaVersion::Legacy => f.write_str("legacy"),
            SchemaVersion::TaskGraph => f.write_str("task-graph"),
        }
    }
}

/// Returns the distinct values bound to `variable`, in order of first appearance.
fn distinct_values(solutions: &[Solution], variable: &str) -> Vec<Term> {
    solutions
        .iter()
        .filter_map(|s| s.get(variable))
        .unique()
        .cloned()
        .collect()
}

/// Returns the value of `variable` that must be bound exactly once.
fn single_value(
    graph: &ResultGraph,
    pattern: &GraphPattern,
    initial: Solution,
    variable: &'static str,
) -> Result<Term, ExtractionError> {
    optional_value(graph, pattern, initial, variable)?.ok_or(
        ExtractionError::SchemaMismatch {
            pattern: pattern.name(),
        },
    )
}

/// Returns the value of `variable` that may be bound at most once.
fn optional_value(
    graph: &ResultGraph,
    pattern: &GraphPattern,
    initial: Solution,
    variable: &'static str,
) -> Result<Option<Term>, ExtractionError> {
    let mut values = distinct_values(&graph.query_bound(pattern, initial), variable);
    if values.len() > 1 {
        return Err(ExtractionError::AmbiguousMatch {
            pattern: pattern.name(),
            variable,
            count: values.len(),
        });
    }
    Ok(values.pop())
}

/// Returns the lexical form of a term: the value of a literal, the IRI of a named node or the
/// identifier of a blank node.
fn lexical(term: &Term) -> &str {
    match term {
        Term::NamedNode(node) => node.as_str(),
        Term::BlankNode(node) => node.as_str(),
        Term::Literal(literal) => literal.value(),
        #[allow(
            unreachable_patterns,
            reason = "Term has a triple variant with the rdf-star feature"
        )]
        _ => "",
    }
}

/// Returns the variable of `solution` that a required pattern must have bound.
fn bound<'a>(
    solution: &'a Solution,
    pattern: &GraphPattern,
    variable: &str,
) -> Result<&'a Term, ExtractionError> {
    solution
        .get(variable)
        .ok_or(ExtractionError::SchemaMismatch {
            pattern: pattern.name(),
        })
}

/// Parses a finite number. `NaN` and infinities have no JSON representation.
fn number(attribute: &'static str, term: &Term) -> Result<f64, ExtractionError> {
    let value = lexical(term).trim();
    value
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| ExtractionError::MalformedNumber {
            attribute,
            value: value.to_owned(),
        })
}

fn count(attribute: &'static str, term: &Term) -> Result<u64, ExtractionError> {
    let value = lexical(term).trim();
    value
        .parse::<u64>()
        .map_err(|_| ExtractionError::MalformedNumber {
            attribute,
            value: value.to_owned(),
        })
}

fn optional_number(
    attribute: &'static str,
    term: Option<&Term>,
) -> Result<Option<f64>, ExtractionError> {
    term.map(|term| number(attribute, term)).transpose()
}

fn optional_count(
    attribute: &'static str,
    term: Option<&Term>,
) -> Result<u64, ExtractionError> {
    term.map_or(Ok(0), |term| count(attribute, term))
}

/// Reads a client count, which must be positive.
fn client_count(term: &Term) -> Result<u32, ExtractionError> {
    let clients = count("noclients", term)?;
    u32::try_from(clients)
        .ok()
        .filter(|clients| *clients > 0)
        .ok_or_else(|| ExtractionError::MalformedNumber {
            attribute: "noclients",
            value: clients.to_string(),
        })
}

/// Reads a result size. Values that are not counts (e.g., a placeholder written for queries whose
/// result size could not be determined) are treated as unknown.
fn result_size(term: Option<&Term>) -> Option<u64> {
    term.and_then(|term| lexical(term).trim().parse().ok())
}

/// Derives the benchmark identifier of a task node: the last three path segments of its IRI.
fn benchmark_id(task: &Term) -> String {
    let value = lexical(task);
    let segments: Vec<&str> = value.rsplit('/').take(3).collect();
    segments.into_iter().rev().join("/")
}
