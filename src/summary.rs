//! Summary table assembly and CSV output.
//!
//! Discovers run logs in a single directory, merges the run configuration
//! from each file name with the metrics from its content, and writes one
//! fixed-schema CSV next to the logs.

use crate::config::SummaryConfig;
use crate::filename::{self, RunConfig};
use crate::metrics::{self, Metric, RunMetrics};
use std::path::{Path, PathBuf};

/// Cell written for a metric that was not found in the log.
pub const NOT_AVAILABLE: &str = "N/A";

/// Columns taken from the file name, ahead of the metric columns.
const CONFIG_COLUMNS: [&str; 5] = [
    "max_num_seqs",
    "max_num_batched_tokens",
    "request_rate",
    "gpu_memory_utilization",
    "min_cache_hit_pct",
];

/// Metrics in the order they follow the five config columns.
const METRIC_COLUMNS: [Metric; 8] = [
    Metric::RequestThroughput,
    Metric::OutputTokenThroughput,
    Metric::P99E2el,
    Metric::MedianE2el,
    Metric::P99Ttft,
    Metric::MedianTtft,
    Metric::P99Tpot,
    Metric::MedianTpot,
];

/// Column order of the summary file: five config columns, then eight metrics.
pub fn header() -> Vec<&'static str> {
    CONFIG_COLUMNS
        .into_iter()
        .chain(METRIC_COLUMNS.map(Metric::column))
        .collect()
}

/// One parsed log file.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub source: PathBuf,
    pub config: RunConfig,
    pub metrics: RunMetrics,
}

impl ResultRow {
    /// Serialize into the cells of a summary record, in `header()` order.
    pub fn to_record(&self) -> Vec<String> {
        let c = &self.config;
        let mut record = vec![
            c.max_num_seqs.to_string(),
            c.max_num_batched_tokens.to_string(),
            c.request_rate.clone(),
            format_float(c.gpu_memory_utilization),
            c.min_cache_hit_pct.to_string(),
        ];
        record.extend(
            METRIC_COLUMNS
                .iter()
                .map(|m| format_metric(self.metrics.get(*m))),
        );
        record
    }
}

/// Shortest round-trip decimal, keeping a `.0` on integral values (100 -> "100.0").
pub fn format_float(v: f64) -> String {
    let s = v.to_string();
    if v.is_finite() && !s.contains('.') {
        format!("{s}.0")
    } else {
        s
    }
}

fn format_metric(v: Option<f64>) -> String {
    match v {
        Some(v) => format_float(v),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// All rows of one invocation, in discovery order.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTable {
    rows: Vec<ResultRow>,
}

impl SummaryTable {
    pub fn new(rows: Vec<ResultRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write header and rows as CSV to any writer.
    pub fn write_to<W: std::io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut w = csv_writer().from_writer(writer);
        self.write_records(&mut w)
    }

    /// Create (or truncate) `path` and write the table to it.
    pub fn write_csv(&self, path: &Path) -> Result<(), SummaryError> {
        let to_write_error = |e| SummaryError::Write {
            path: path.to_path_buf(),
            source: e,
        };
        let mut w = csv_writer().from_path(path).map_err(to_write_error)?;
        self.write_records(&mut w).map_err(to_write_error)
    }

    fn write_records<W: std::io::Write>(&self, w: &mut csv::Writer<W>) -> Result<(), csv::Error> {
        w.write_record(header())?;
        for row in &self.rows {
            w.write_record(row.to_record())?;
        }
        w.flush()?;
        Ok(())
    }
}

fn csv_writer() -> csv::WriterBuilder {
    let mut builder = csv::WriterBuilder::new();
    builder.terminator(csv::Terminator::CRLF);
    builder
}

/// What happened to each discovered file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationReport {
    pub discovered: usize,
    pub unrecognized: Vec<PathBuf>,
    pub unreadable: Vec<PathBuf>,
}

impl AggregationReport {
    pub fn skipped(&self) -> usize {
        self.unrecognized.len() + self.unreadable.len()
    }
}

/// Result of a successful aggregation.
#[derive(Debug)]
pub struct Aggregation {
    pub table: SummaryTable,
    pub report: AggregationReport,
    /// Where the table was written; `None` for a dry run.
    pub output_path: Option<PathBuf>,
}

/// Errors that end an aggregation without a summary file.
#[derive(Debug)]
pub enum SummaryError {
    DirectoryNotFound {
        path: PathBuf,
    },
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
    NoLogFiles {
        directory: PathBuf,
        pattern: String,
    },
    NoValidData {
        report: AggregationReport,
    },
    Write {
        path: PathBuf,
        source: csv::Error,
    },
}

impl SummaryError {
    /// Fatal errors mean the invocation failed; the others are reported and
    /// leave nothing to write.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SummaryError::DirectoryNotFound { .. }
                | SummaryError::NoLogFiles { .. }
                | SummaryError::NoValidData { .. }
        )
    }
}

impl std::fmt::Display for SummaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryError::DirectoryNotFound { path } => {
                write!(f, "directory not found at '{}'", path.display())
            }
            SummaryError::Pattern { pattern, source } => {
                write!(f, "invalid log file pattern '{pattern}': {source}")
            }
            SummaryError::NoLogFiles { directory, pattern } => write!(
                f,
                "no benchmark log files matching '{pattern}' found in '{}'",
                directory.display()
            ),
            SummaryError::NoValidData { report } => write!(
                f,
                "no valid data was parsed ({} files discovered, {} skipped)",
                report.discovered,
                report.skipped()
            ),
            SummaryError::Write { path, source } => {
                write!(f, "failed to write summary {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for SummaryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SummaryError::Pattern { source, .. } => Some(source),
            SummaryError::Write { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// List files matching `pattern` directly inside `directory`, sorted by name.
pub fn discover(directory: &Path, pattern: &str) -> Result<Vec<PathBuf>, SummaryError> {
    let escaped = glob::Pattern::escape(&directory.to_string_lossy());
    let full = Path::new(&escaped).join(pattern);
    let full = full.to_string_lossy();

    let paths = glob::glob(&full).map_err(|e| SummaryError::Pattern {
        pattern: pattern.to_string(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => files.push(path),
            Err(e) => {
                tracing::warn!(error = %e, "failed to inspect candidate log file");
            }
        }
    }
    Ok(files)
}

/// Build the summary table for `directory` without writing anything.
pub fn collect(
    directory: &Path,
    config: &SummaryConfig,
) -> Result<(SummaryTable, AggregationReport), SummaryError> {
    if !directory.is_dir() {
        return Err(SummaryError::DirectoryNotFound {
            path: directory.to_path_buf(),
        });
    }

    let pattern = &config.discovery.pattern;
    let files = discover(directory, pattern)?;
    if files.is_empty() {
        return Err(SummaryError::NoLogFiles {
            directory: directory.to_path_buf(),
            pattern: pattern.clone(),
        });
    }

    tracing::info!(count = files.len(), "found log files to process");

    let mut report = AggregationReport {
        discovered: files.len(),
        ..Default::default()
    };
    let mut rows = Vec::with_capacity(files.len());

    for path in files {
        let Some(run) = filename::classify_path(&path) else {
            tracing::warn!(
                file = %path.display(),
                "skipping file with unexpected name format"
            );
            report.unrecognized.push(path);
            continue;
        };

        let metrics = match metrics::read_metrics(&path) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable log file");
                report.unreadable.push(path);
                continue;
            }
        };

        tracing::debug!(
            file = %path.display(),
            format = ?run.format,
            found = metrics.found_count(),
            "parsed run log"
        );

        rows.push(ResultRow {
            source: path,
            config: run,
            metrics,
        });
    }

    let table = SummaryTable::new(rows);
    if table.is_empty() {
        return Err(SummaryError::NoValidData { report });
    }

    Ok((table, report))
}

/// Build the summary table for `directory` and write it to
/// `<directory>/<output.file_name>`.
pub fn aggregate(directory: &Path, config: &SummaryConfig) -> Result<Aggregation, SummaryError> {
    let (table, report) = collect(directory, config)?;
    let output_path = directory.join(&config.output.file_name);
    table.write_csv(&output_path)?;
    tracing::info!(
        path = %output_path.display(),
        rows = table.len(),
        "wrote summary file"
    );
    Ok(Aggregation {
        table,
        report,
        output_path: Some(output_path),
    })
}
