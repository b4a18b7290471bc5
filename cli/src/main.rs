use crate::cli::Args;
use anyhow::{bail, Context};
use clap::Parser;
use iguana_results::chart::{ChartRenderer, VegaLiteRenderer};
use iguana_results::{aggregate, convert_directory, discover_task_outputs, AggregatedResults};
use std::fs;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

pub fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = args.conversion_config();

    fs::create_dir_all(&args.output_dir).with_context(|| {
        format!(
            "Cannot create the output directory {}",
            args.output_dir.display()
        )
    })?;

    let (outputs, failed) = if args.aggregate_only {
        let outputs = discover_task_outputs(&args.output_dir).with_context(|| {
            format!(
                "Cannot list the output directory {}",
                args.output_dir.display()
            )
        })?;
        (outputs, 0)
    } else {
        let summary = convert_directory(&args.input_dir, &args.output_dir, &config)
            .with_context(|| {
                format!(
                    "Cannot read the input directory {}",
                    args.input_dir.display()
                )
            })?;
        let failed = summary.failures.len();
        (summary.outputs, failed)
    };

    let aggregated = aggregate(&args.output_dir, &outputs).context("Cannot aggregate the results");
    if let Err(error) = aggregated {
        return Err(if failed > 0 {
            error.context(failed_files(failed))
        } else {
            error
        });
    }

    if args.charts {
        render_charts(&args.output_dir)?;
    }

    if failed > 0 {
        bail!(failed_files(failed))
    }
    Ok(())
}

fn failed_files(failed: usize) -> String {
    format!("{failed} result file(s) could not be converted")
}

fn render_charts(output_dir: &Path) -> anyhow::Result<()> {
    let results = AggregatedResults::load(output_dir).context("Cannot load the aggregated results")?;
    let charts = VegaLiteRenderer
        .render(&results.benchmarks, &results.queries, output_dir)
        .context("Cannot render the charts")?;
    info!(charts = charts.len(), "Rendered charts");
    Ok(())
}

/// Logs to stderr. The level is read from `RUST_LOG` and defaults to `info`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use iguana_results::{QueryOrdering, SchemaVersion};

    #[test]
    fn clap_debug() {
        use clap::CommandFactory;

        Args::command().debug_assert()
    }

    #[test]
    fn arguments_map_to_config() {
        let args = Args::parse_from([
            "iguana-results",
            "out",
            "in",
            "--penalty",
            "1000",
            "--schema",
            "task-graph",
            "--query-order",
            "lexicographic",
            "--lenient",
        ]);

        let config = args.conversion_config();

        assert_eq!(args.output_dir, Path::new("out"));
        assert_eq!(args.input_dir, Path::new("in"));
        assert_eq!(config.penalty.per_failure(), 1000.0);
        assert_eq!(config.schema, SchemaVersion::TaskGraph);
        assert_eq!(config.query_ordering, QueryOrdering::Lexicographic);
        assert!(config.parse.lenient);
        assert!(config.parse.drop_query_labels);
    }
}
