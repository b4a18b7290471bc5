#![cfg(test)]

use anyhow::Result;
use iguana_results::chart::{ChartRenderer, VegaLiteRenderer};
use iguana_results::error::{ConversionError, ExtractionError};
use iguana_results::output::{read_task_csv, read_task_json};
use iguana_results::{
    aggregate, convert_directory, discover_task_outputs, AggregatedResults, ConversionConfig,
    PenaltyPolicy, QueryId, QueryOrdering, TaskFormat,
};
use std::fs::{self, File};
use std::path::Path;
use tempfile::TempDir;

const PREFIXES: &str = r#"
@prefix iprop: <http://iguana-benchmark.eu/properties/> .
@prefix iont: <http://iguana-benchmark.eu/class/> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
"#;

/// A task graph with three queries (ids 10, 2 and 1), one of which failed twice.
fn task_graph(task: &str, clients: u32, worker_type: &str) -> String {
    format!(
        r#"{PREFIXES}
<http://iguana-benchmark.eu/resource/1606> iprop:task <{task}> ;
    iprop:dataset <http://iguana-benchmark.eu/resource/swdf> .
<http://iguana-benchmark.eu/resource/swdf> rdfs:label "swdf" .
<http://iguana-benchmark.eu/resource/tentris> rdfs:label "tentris" .

<{task}> a iont:Task ;
    iprop:startDate "2020-11-03T10:15:00"^^xsd:dateTime ;
    iprop:timeLimit 3600000 ;
    iprop:noOfWorkers {clients} ;
    iprop:connection <http://iguana-benchmark.eu/resource/tentris> ;
    iprop:QMPH 12.5 ;
    iprop:AvgQPS 2.0 ;
    iprop:NoQ 12 ;
    iprop:workerResult <{task}/worker0> ;
    iprop:query <{task}/q10>, <{task}/q2>, <{task}/q1> .

<{task}/worker0> iprop:workerType "{worker_type}" .

<{task}/q10> iprop:queryID "sparql10" ;
    iprop:QPS 1.5 ; iprop:penalizedQPS 1.5 ;
    iprop:succeeded 3 ; iprop:failed 0 ; iprop:totalTime 2000 .
<{task}/q2> iprop:queryID "sparql2" ;
    iprop:QPS 0.0 ; iprop:penalizedQPS 0.005 ;
    iprop:succeeded 0 ; iprop:failed 2 ; iprop:timeOuts 0 ; iprop:unknownException 2 ;
    iprop:wrongCodes 0 ; iprop:totalTime 1000 ; iprop:resultSize "?" .
<{task}/q1> iprop:queryID "sparql1" ;
    iprop:QPS 4.5 ; iprop:penalizedQPS 4.5 ;
    iprop:succeeded 9 ; iprop:failed 0 ; iprop:timeOuts 0 ; iprop:unknownException 0 ;
    iprop:wrongCodes 0 ; iprop:totalTime 2000 ; iprop:resultSize 100 .
"#
    )
}

/// A single-task result file of the legacy shape, including a raw query label that is not valid
/// N-Triples.
const LEGACY: &str = r#"_:exp <http://www.w3.org/2000/01/rdf-schema#startDate> "2020-11-03T10:15:00" .
_:exp <http://iguana-benchmark.eu/properties/timeLimit> "3600000" .
_:exp <http://iguana-benchmark.eu/properties/dataset> <http://iguana-benchmark.eu/resource/swdf> .
_:exp <http://iguana-benchmark.eu/properties/connection> <http://iguana-benchmark.eu/resource/fuseki> .
_:exp <http://iguana-benchmark.eu/properties/task> <http://iguana-benchmark.eu/resource/1/1/1> .
<http://iguana-benchmark.eu/resource/swdf> <http://www.w3.org/2000/01/rdf-schema#label> "swdf" .
<http://iguana-benchmark.eu/resource/fuseki> <http://www.w3.org/2000/01/rdf-schema#label> "fuseki" .
<http://iguana-benchmark.eu/resource/1/1/1> <http://iguana-benchmark.eu/properties/noOfWorkers> "1" .
_:q2 <http://iguana-benchmark.eu/properties/queriesPerSecond> "2.0" .
_:q2 <http://iguana-benchmark.eu/properties/id> "sparql2" .
_:q2 <http://iguana-benchmark.eu/properties/failed> "0" .
_:q2 <http://iguana-benchmark.eu/properties/succeded> "10" .
_:q2 <http://iguana-benchmark.eu/properties/totalTime> "5000" .
_:q2 <http://iguana-benchmark.eu/properties/resultSize> "7" .
_:q10 <http://iguana-benchmark.eu/properties/queriesPerSecond> "0" .
_:q10 <http://iguana-benchmark.eu/properties/id> "sparql10" .
_:q10 <http://iguana-benchmark.eu/properties/failed> "2" .
_:q10 <http://iguana-benchmark.eu/properties/succeded> "0" .
_:q10 <http://iguana-benchmark.eu/properties/totalTime> "1000" .
<http://iguana-benchmark.eu/resource/sparql2> <http://www.w3.org/2000/01/rdf-schema#label> "SELECT * WHERE { ?s ?p "o" }" .
"#;

const TASK: &str = "http://iguana-benchmark.eu/resource/1606/1/1";
const STEM: &str = "HTTP_swdf_08-clients_tentris_2020-11-03_10-15-00";

fn directories() -> Result<(TempDir, TempDir)> {
    Ok((tempfile::tempdir()?, tempfile::tempdir()?))
}

fn read_csv(dir: &Path, stem: &str) -> Result<String> {
    Ok(fs::read_to_string(dir.join(format!("{stem}.csv")))?)
}

#[test]
fn converts_task_graph() -> Result<()> {
    let (input, output) = directories()?;
    fs::write(input.path().join("results.ttl"), task_graph(TASK, 8, "SPARQLWorker"))?;

    let summary = convert_directory(input.path(), output.path(), &ConversionConfig::default())?;

    assert!(summary.is_success());
    assert_eq!(summary.outputs.len(), 1);
    assert_eq!(summary.outputs[0].stem, STEM);
    insta::assert_snapshot!(read_csv(output.path(), STEM)?, @r#"
    "starttime","benchmarkID","format","dataset","triplestore","noclients","queryID","qps","penalizedQps","succeeded","failed","timeouts","unknownExceptions","wrongCodes","totaltime","resultsize","penalizedtime"
    "2020-11-03 10:15:00","1606/1/1","HTTP","swdf","tentris",8,1,4.5,4.5,9,0,0,0,0,2000.0,100,2000.0
    "2020-11-03 10:15:00","1606/1/1","HTTP","swdf","tentris",8,2,0.0,0.005,0,2,0,2,0,1000.0,"",361000.0
    "2020-11-03 10:15:00","1606/1/1","HTTP","swdf","tentris",8,10,1.5,1.5,3,0,0,0,0,2000.0,"",2000.0
    "#);

    let task = read_task_json(File::open(output.path().join(format!("{STEM}.json")))?)?;
    assert_eq!(task.benchmark_id, "1606/1/1");
    assert_eq!(task.no_clients, 8);
    assert_eq!(task.runtime, 3_600_000.0);
    assert_eq!(task.queries_per_hour, Some(12.5));
    assert_eq!(task.query_count, Some(12));
    assert_eq!(task.queries_per_hour_normalized, None);
    assert!((task.penalized_average_qps - 6.005 / 3.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn converts_legacy_results() -> Result<()> {
    let (input, output) = directories()?;
    fs::write(input.path().join("legacy.nt"), LEGACY)?;

    let summary = convert_directory(input.path(), output.path(), &ConversionConfig::default())?;

    assert!(summary.is_success());
    let stem = "HTTP_swdf_01-clients_fuseki_2020-11-03_10-15-00";
    assert_eq!(summary.outputs[0].stem, stem);
    let rows = read_task_csv(File::open(output.path().join(format!("{stem}.csv")))?)?;
    assert_eq!(
        rows.iter().map(|row| row.query_id.clone()).collect::<Vec<_>>(),
        [QueryId::Numeric(2), QueryId::Numeric(10)]
    );
    assert_eq!(rows[0].result_size, Some(7));
    assert_eq!(rows[0].penalized_time, 5000.0);
    assert_eq!(rows[0].penalized_qps, 2.0);
    assert_eq!(rows[1].result_size, None);
    assert_eq!(rows[1].penalized_time, 361_000.0);
    assert!((rows[1].penalized_qps - 2.0 / 361.0).abs() < 1e-12);
    Ok(())
}

#[test]
fn failing_file_does_not_stop_the_others() -> Result<()> {
    let (input, output) = directories()?;
    fs::write(input.path().join("a.ttl"), task_graph(TASK, 8, "SPARQLWorker"))?;
    let broken = task_graph("http://iguana-benchmark.eu/resource/1606/2/1", 4, "SPARQLWorker")
        .replace("iprop:noOfWorkers 4 ;", "");
    fs::write(input.path().join("b.ttl"), broken)?;

    let summary = convert_directory(input.path(), output.path(), &ConversionConfig::default())?;

    assert_eq!(summary.outputs.len(), 1);
    assert_eq!(summary.failures.len(), 1);
    assert!(summary.failures[0].path.ends_with("b.ttl"));
    assert!(matches!(
        summary.failures[0].error,
        ConversionError::Extraction(ExtractionError::SchemaMismatch { .. })
    ));
    Ok(())
}

/// Converts a directory holding only `document` and returns why it failed.
fn single_failure(file_name: &str, document: &str) -> Result<ConversionError> {
    let (input, output) = directories()?;
    fs::write(input.path().join(file_name), document)?;

    let mut summary = convert_directory(input.path(), output.path(), &ConversionConfig::default())?;

    assert!(summary.outputs.is_empty());
    assert_eq!(summary.failures.len(), 1);
    Ok(summary.failures.remove(0).error)
}

#[test]
fn task_with_two_start_dates_is_ambiguous() -> Result<()> {
    let document = format!(
        "{}\n<{TASK}> iprop:startDate \"2021-01-01T00:00:00\" .\n",
        task_graph(TASK, 8, "SPARQLWorker")
    );

    let error = single_failure("results.ttl", &document)?;

    assert!(matches!(
        error,
        ConversionError::Extraction(ExtractionError::AmbiguousMatch {
            variable: "starttime",
            count: 2,
            ..
        })
    ));
    Ok(())
}

#[test]
fn mixed_worker_types_are_ambiguous() -> Result<()> {
    let document = format!(
        "{}\n<{TASK}> iprop:workerResult <{TASK}/worker1> .\n\
         <{TASK}/worker1> iprop:workerType \"CLIInputWorker\" .\n",
        task_graph(TASK, 8, "SPARQLWorker")
    );

    let error = single_failure("results.ttl", &document)?;

    assert!(matches!(
        error,
        ConversionError::Extraction(ExtractionError::AmbiguousMatch {
            variable: "type",
            count: 2,
            ..
        })
    ));
    Ok(())
}

#[test]
fn query_with_two_qps_values_is_ambiguous() -> Result<()> {
    let document = format!(
        "{}\n<{TASK}/q1> iprop:QPS 9.0 .\n",
        task_graph(TASK, 8, "SPARQLWorker")
    );

    let error = single_failure("results.ttl", &document)?;

    assert!(matches!(
        error,
        ConversionError::Extraction(ExtractionError::AmbiguousMatch {
            variable: "query",
            count: 2,
            ..
        })
    ));
    Ok(())
}

#[test]
fn task_without_queries_is_a_schema_mismatch() -> Result<()> {
    let document =
        task_graph(TASK, 8, "SPARQLWorker").replace("iprop:query <", "iprop:queryList <");

    let error = single_failure("results.ttl", &document)?;

    assert!(matches!(
        error,
        ConversionError::Extraction(ExtractionError::SchemaMismatch {
            pattern: "task query statistics",
            ..
        })
    ));
    Ok(())
}

#[test]
fn legacy_file_without_queries_is_a_schema_mismatch() -> Result<()> {
    let document = LEGACY
        .lines()
        .filter(|line| !line.contains("queriesPerSecond"))
        .collect::<Vec<_>>()
        .join("\n");

    let error = single_failure("legacy.nt", &document)?;

    assert!(matches!(
        error,
        ConversionError::Extraction(ExtractionError::SchemaMismatch {
            pattern: "legacy query statistics",
            ..
        })
    ));
    Ok(())
}

#[test]
fn one_file_may_hold_several_tasks() -> Result<()> {
    let (input, output) = directories()?;
    let document = task_graph(TASK, 8, "SPARQLWorker")
        + &task_graph("http://iguana-benchmark.eu/resource/1606/2/1", 16, "CLIInputWorker");
    fs::write(input.path().join("results.ttl"), document)?;

    let summary = convert_directory(input.path(), output.path(), &ConversionConfig::default())?;

    let stems: Vec<&str> = summary.outputs.iter().map(|o| o.stem.as_str()).collect();
    assert_eq!(
        stems,
        [
            "CLI_swdf_16-clients_tentris_2020-11-03_10-15-00",
            STEM,
        ]
    );
    let task = read_task_json(File::open(&summary.outputs[0].json)?)?;
    assert_eq!(task.format, TaskFormat::Cli);
    assert_eq!(task.benchmark_id, "1606/2/1");
    Ok(())
}

#[test]
fn penalty_and_ordering_are_configurable() -> Result<()> {
    let (input, output) = directories()?;
    fs::write(input.path().join("results.ttl"), task_graph(TASK, 8, "SPARQLWorker"))?;
    let config = ConversionConfig {
        penalty: PenaltyPolicy::new(100),
        query_ordering: QueryOrdering::Lexicographic,
        ..ConversionConfig::default()
    };

    convert_directory(input.path(), output.path(), &config)?;

    let rows = read_task_csv(File::open(output.path().join(format!("{STEM}.csv")))?)?;
    assert_eq!(
        rows.iter().map(|row| row.query_id.to_string()).collect::<Vec<_>>(),
        ["1", "10", "2"]
    );
    // 1000 ms is not below 2 * 100 ms, so the failed query keeps its time.
    assert_eq!(rows[2].penalized_time, 1000.0);
    Ok(())
}

#[test]
fn conversion_is_deterministic() -> Result<()> {
    let (input, output) = directories()?;
    fs::write(input.path().join("results.ttl"), task_graph(TASK, 8, "SPARQLWorker"))?;
    fs::write(input.path().join("legacy.nt"), LEGACY)?;

    convert_directory(input.path(), output.path(), &ConversionConfig::default())?;
    aggregate(output.path(), &discover_task_outputs(output.path())?)?;
    let first_csv = fs::read(output.path().join("all_results.csv"))?;
    let first_json = fs::read(output.path().join("all_results.json"))?;

    convert_directory(input.path(), output.path(), &ConversionConfig::default())?;
    aggregate(output.path(), &discover_task_outputs(output.path())?)?;

    assert_eq!(fs::read(output.path().join("all_results.csv"))?, first_csv);
    assert_eq!(fs::read(output.path().join("all_results.json"))?, first_json);
    Ok(())
}

#[test]
fn aggregate_feeds_the_charts() -> Result<()> {
    let (input, output) = directories()?;
    fs::write(input.path().join("results.ttl"), task_graph(TASK, 8, "SPARQLWorker"))?;
    fs::write(input.path().join("legacy.nt"), LEGACY)?;

    let summary = convert_directory(input.path(), output.path(), &ConversionConfig::default())?;
    let aggregated = aggregate(output.path(), &summary.outputs)?;
    assert_eq!(aggregated.tasks, 2);
    assert_eq!(aggregated.rows, 5);

    let results = AggregatedResults::load(output.path())?;
    assert_eq!(results.benchmarks.len(), 2);
    assert!(results
        .queries
        .iter()
        .all(|row| results.benchmarks.iter().any(|task| row.belongs_to(task))));

    let charts = VegaLiteRenderer.render(&results.benchmarks, &results.queries, output.path())?;
    let names: Vec<String> = charts
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        [
            "swdf_01-clients_PenalizedAvgQPS.vl.json",
            "swdf_01-clients_QMPH.vl.json",
            "swdf_01-clients_qps.vl.json",
            "swdf_08-clients_PenalizedAvgQPS.vl.json",
            "swdf_08-clients_QMPH.vl.json",
            "swdf_08-clients_qps.vl.json",
        ]
    );
    Ok(())
}
