use crate::config::ParseOptions;
use crate::error::GraphError;
use crate::pattern::{GraphPattern, Solution};
use oxrdf::vocab::rdf;
use oxrdf::{Graph, NamedNodeRef, TermRef, Triple};
use oxrdfio::{RdfFormat, RdfParseError, RdfParser};
use std::ffi::OsStr;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Line marker of `rdfs:label` statements in N-Triples.
const LABEL_MARKER: &str = "<http://www.w3.org/2000/01/rdf-schema#label>";

/// A parsed IGUANA result file held in an indexed in-memory graph.
#[derive(Debug, Default)]
pub struct ResultGraph {
    graph: Graph,
}

impl ResultGraph {
    /// Parses the result file at `path`, guessing the serialization from the file extension.
    pub fn parse(path: &Path, options: &ParseOptions) -> Result<Self, GraphError> {
        let format = path
            .extension()
            .and_then(OsStr::to_str)
            .and_then(RdfFormat::from_extension)
            .ok_or_else(|| GraphError::UnknownFormat {
                path: path.to_owned(),
            })?;
        let data = fs::read(path)?;
        let graph = Self::parse_slice(format, &data, options)?;
        debug!(
            file = %path.display(),
            triples = graph.len(),
            "Parsed result graph"
        );
        Ok(graph)
    }

    /// Parses an in-memory serialization.
    pub fn parse_slice(
        format: RdfFormat,
        data: &[u8],
        options: &ParseOptions,
    ) -> Result<Self, GraphError> {
        if format == RdfFormat::NTriples && options.drop_query_labels {
            let cleaned = drop_query_labels(data);
            Self::parse_reader(format, cleaned.as_slice(), options)
        } else {
            Self::parse_reader(format, data, options)
        }
    }

    fn parse_reader<R: Read>(
        format: RdfFormat,
        reader: R,
        options: &ParseOptions,
    ) -> Result<Self, GraphError> {
        let mut graph = Graph::new();
        for quad in RdfParser::from_format(format).for_reader(reader) {
            match quad {
                Ok(quad) => {
                    graph.insert(&Triple::from(quad));
                }
                Err(RdfParseError::Syntax(e)) if options.lenient => {
                    warn!("Skipping invalid statement: {e}");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(Self { graph })
    }

    /// Returns all solutions of `pattern`.
    pub fn query(&self, pattern: &GraphPattern) -> Vec<Solution> {
        self.query_bound(pattern, Solution::default())
    }

    /// Returns all solutions of `pattern` that are compatible with the bindings of `initial`.
    pub fn query_bound(&self, pattern: &GraphPattern, initial: Solution) -> Vec<Solution> {
        pattern.evaluate(&self.graph, initial)
    }

    /// Returns whether any node is typed with `class`.
    pub fn has_instance_of(&self, class: NamedNodeRef<'_>) -> bool {
        self.graph
            .triples_for_predicate(rdf::TYPE)
            .any(|t| t.object == TermRef::from(class))
    }

    /// Returns the number of triples.
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }
}

impl From<Graph> for ResultGraph {
    fn from(graph: Graph) -> Self {
        Self { graph }
    }
}

/// Removes the `rdfs:label` statements that carry raw query text.
///
/// Older IGUANA versions wrote the SPARQL query as a label without escaping it properly, which
/// breaks N-Triples parsers.
fn drop_query_labels(data: &[u8]) -> Vec<u8> {
    let mut cleaned = Vec::with_capacity(data.len());
    let mut dropped = 0_usize;
    for line in data.split_inclusive(|b| *b == b'\n') {
        let text = String::from_utf8_lossy(line);
        if text.contains(LABEL_MARKER) && text.contains("sparql") {
            dropped += 1;
        } else {
            cleaned.extend_from_slice(line);
        }
    }
    if dropped > 0 {
        debug!(dropped, "Dropped query label statements");
    }
    cleaned
}
