use clap::{Parser, ValueEnum, ValueHint};
use iguana_results::{
    ConversionConfig, ParseOptions, PenaltyPolicy, QueryOrdering, SchemaVersion,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "iguana-results")]
/// Converts IGUANA benchmark results from RDF into CSV and JSON tables
pub struct Args {
    /// Directory the CSV, JSON and chart files are written to
    #[arg(default_value = ".", value_hint = ValueHint::DirPath)]
    pub output_dir: PathBuf,
    /// Directory containing the IGUANA result files
    ///
    /// Every `.nt` and `.ttl` file is converted, except files whose name starts with `cleaned_`.
    #[arg(default_value = ".", value_hint = ValueHint::DirPath)]
    pub input_dir: PathBuf,
    /// Time in milliseconds that is added to a query for each of its failures
    ///
    /// Only queries whose total time is below this penalty times their failures are penalized.
    #[arg(long, env = "IGUANA_PENALTY_MS", default_value_t = PenaltyPolicy::DEFAULT_PENALTY_MS)]
    pub penalty: u64,
    /// The shape of the result graphs
    ///
    /// By default, it is guessed for each file.
    #[arg(long, value_enum, default_value_t = Schema::Auto)]
    pub schema: Schema,
    /// How the query executions of a task are ordered
    #[arg(long, value_enum, default_value_t = QueryOrder::Natural)]
    pub query_order: QueryOrder,
    /// Attempt to keep converting even if a result file is invalid
    #[arg(long)]
    pub lenient: bool,
    /// Also draw charts from the aggregated results
    #[arg(long)]
    pub charts: bool,
    /// Only aggregate the CSV and JSON files that already are in the output directory
    #[arg(long)]
    pub aggregate_only: bool,
}

impl Args {
    pub fn conversion_config(&self) -> ConversionConfig {
        ConversionConfig {
            penalty: PenaltyPolicy::new(self.penalty),
            schema: self.schema.into(),
            query_ordering: self.query_order.into(),
            parse: ParseOptions {
                lenient: self.lenient,
                ..ParseOptions::default()
            },
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Schema {
    /// Detect the shape from the content of each file
    Auto,
    /// Single-task files of IGUANA 2.x
    Legacy,
    /// Files with typed task nodes of IGUANA 3.x
    TaskGraph,
}

impl From<Schema> for SchemaVersion {
    fn from(schema: Schema) -> Self {
        match schema {
            Schema::Auto => SchemaVersion::Auto,
            Schema::Legacy => SchemaVersion::Legacy,
            Schema::TaskGraph => SchemaVersion::TaskGraph,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum QueryOrder {
    /// Numeric query ids in numeric order, then textual ids
    Natural,
    /// Query ids compared as strings
    Lexicographic,
}

impl From<QueryOrder> for QueryOrdering {
    fn from(order: QueryOrder) -> Self {
        match order {
            QueryOrder::Natural => QueryOrdering::Natural,
            QueryOrder::Lexicographic => QueryOrdering::Lexicographic,
        }
    }
}
