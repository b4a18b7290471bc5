//! IRIs of the IGUANA result vocabulary.

/// Properties (`iprop:`).
pub mod iprop {
    use oxrdf::NamedNodeRef;

    pub const AVG_QPS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/AvgQPS");
    pub const CONNECTION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/connection");
    pub const DATASET: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/dataset");
    pub const FAILED: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/failed");
    pub const ID: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/id");
    pub const NO_OF_WORKERS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/noOfWorkers");
    pub const NOQ: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/NoQ");
    pub const NOQPH: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/NoQPH");
    pub const PENALIZED_QPS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/penalizedQPS");
    pub const QMPH: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/QMPH");
    pub const QPS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/QPS");
    pub const QUERIES_PER_SECOND: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/queriesPerSecond");
    pub const QUERY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/query");
    pub const QUERY_ID: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/queryID");
    pub const RESULT_SIZE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/resultSize");
    pub const START_DATE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/startDate");
    /// Misspelled success counter of older result files.
    pub const SUCCEDED: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/succeded");
    pub const SUCCEEDED: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/succeeded");
    pub const TASK: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/task");
    pub const TIME_LIMIT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/timeLimit");
    pub const TIMEOUTS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/timeOuts");
    pub const TOTAL_TIME: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/totalTime");
    pub const UNKNOWN_EXCEPTION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/unknownException");
    pub const WORKER_RESULT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/workerResult");
    pub const WORKER_TYPE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/workerType");
    pub const WRONG_CODES: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/properties/wrongCodes");
}

/// Classes (`iont:`).
pub mod iont {
    use oxrdf::NamedNodeRef;

    pub const TASK: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://iguana-benchmark.eu/class/Task");
}

/// RDF Schema terms, including the non-standard `rdfs:startDate` written by older IGUANA versions.
pub mod rdfs {
    use oxrdf::NamedNodeRef;

    pub use oxrdf::vocab::rdfs::LABEL;

    pub const START_DATE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2000/01/rdf-schema#startDate");
}
