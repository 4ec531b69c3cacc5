mod config;
mod filename;
mod metrics;
mod summary;

use clap::Parser;
use config::{SummaryConfig, DEFAULT_CONFIG_FILE};
use std::path::PathBuf;
use std::process::ExitCode;

/// Collect inference-server benchmark run logs (`bm_log_*.txt`) from a
/// directory into a single CSV summary written next to them.
#[derive(Parser, Debug)]
#[command(name = "bench-summary", version, about, after_help = EXIT_STATUS_HELP)]
pub struct Cli {
    /// The directory containing the benchmark log files
    #[arg(value_name = "LOG_DIRECTORY")]
    log_directory: PathBuf,

    /// Config file path (default: bench-summary.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log file glob, matched inside LOG_DIRECTORY (overrides config)
    #[arg(long)]
    pattern: Option<String>,

    /// Summary file name, written into LOG_DIRECTORY (overrides config)
    #[arg(short, long)]
    output_file: Option<String>,

    /// Parse and print the summary to stdout, don't write the file
    #[arg(long)]
    dry_run: bool,

    /// Extra logging (per-file parse results)
    #[arg(short, long)]
    verbose: bool,

    /// Only warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

const EXIT_STATUS_HELP: &str = "\
Exit status:
  0  summary written, or nothing to write (missing directory, no log files,
     no parseable logs); the reason is printed
  1  invalid config file, invalid --pattern, or the summary could not be written";

fn default_filter(cli: &Cli) -> &'static str {
    if cli.verbose {
        "bench_summary=debug"
    } else if cli.quiet {
        "bench_summary=warn"
    } else {
        "bench_summary=info"
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter(&cli))),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(?cli, "parsed CLI arguments");

    let config = match &cli.config {
        Some(path) => SummaryConfig::load(path, true),
        None => SummaryConfig::load(&PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    let config = match config {
        Ok(c) => c.with_overrides(cli.pattern.clone(), cli.output_file.clone()),
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let result = if cli.dry_run {
        summary::collect(&cli.log_directory, &config).map(|(table, report)| summary::Aggregation {
            table,
            report,
            output_path: None,
        })
    } else {
        summary::aggregate(&cli.log_directory, &config)
    };

    match result {
        Ok(agg) => {
            for row in agg.table.rows() {
                tracing::debug!(file = %row.source.display(), "included in summary");
            }
            if agg.report.skipped() > 0 {
                tracing::warn!(
                    unrecognized = agg.report.unrecognized.len(),
                    unreadable = agg.report.unreadable.len(),
                    "some log files were skipped"
                );
            }
            match agg.output_path {
                Some(path) => {
                    println!("Successfully created summary file: {}", path.display());
                }
                None => {
                    if let Err(e) = agg.table.write_to(std::io::stdout().lock()) {
                        tracing::error!(error = %e, "failed to print summary");
                        return ExitCode::FAILURE;
                    }
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) if e.is_fatal() => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
        Err(e) => {
            println!("Error: {e}");
            ExitCode::SUCCESS
        }
    }
}
