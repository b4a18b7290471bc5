use oxrdfio::RdfParseError;
use std::io;
use std::path::PathBuf;

/// An error raised while resolving a task or its query executions from a result graph.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ExtractionError {
    /// A pattern that must match did not match at all.
    #[error("Pattern '{pattern}' has no match in the result graph")]
    SchemaMismatch { pattern: &'static str },
    /// A pattern that must match exactly once produced several distinct values.
    #[error("Pattern '{pattern}' is ambiguous: expected one value for ?{variable}, found {count}")]
    AmbiguousMatch {
        pattern: &'static str,
        variable: &'static str,
        count: usize,
    },
    /// The start time of a task is not a recognizable timestamp.
    #[error("Cannot parse start time '{value}'")]
    MalformedTimestamp { value: String },
    /// A required numeric attribute holds something other than a number.
    #[error("Attribute '{attribute}' is not a number: '{value}'")]
    MalformedNumber {
        attribute: &'static str,
        value: String,
    },
}

/// An error raised while loading a result file into memory.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GraphError {
    /// Error from the OS I/O layer.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The serialization is invalid.
    #[error(transparent)]
    Parse(#[from] RdfParseError),
    /// The file extension does not map to a known RDF serialization.
    #[error("Cannot guess the RDF serialization of '{}'", path.display())]
    UnknownFormat { path: PathBuf },
}

/// An error raised while writing or reading the tabular artifacts.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum OutputError {
    /// Error from the OS I/O layer.
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Two per-task CSV files that should be concatenated have different headers.
    #[error("Header of '{}' differs from the first file: expected [{expected}], found [{found}]", file.display())]
    SchemaDrift {
        file: PathBuf,
        expected: String,
        found: String,
    },
}

/// Any failure of converting a single result file.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConversionError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Output(#[from] OutputError),
}
