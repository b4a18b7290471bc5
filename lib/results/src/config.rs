use crate::model::QueryOrdering;
use crate::penalty::PenaltyPolicy;
use crate::schema::SchemaVersion;

/// Options for loading result files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Skip invalid statements instead of failing the whole file.
    pub lenient: bool,
    /// Drop the raw query text labels from N-Triples files before parsing them.
    pub drop_query_labels: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            lenient: false,
            drop_query_labels: true,
        }
    }
}

/// Provides options for converting result files.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ConversionConfig {
    pub penalty: PenaltyPolicy,
    pub schema: SchemaVersion,
    pub query_ordering: QueryOrdering,
    pub parse: ParseOptions,
}
