/// Metric extraction from benchmark run logs.
///
/// Benchmark clients print a result block of `<Label> (<unit>): <value>`
/// lines. Each metric is searched for independently over the whole file, so
/// logs from versions that omit a section still yield the metrics they do
/// print. A missing metric is `None`, never an error.
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// The eight metrics collected per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    RequestThroughput,
    OutputTokenThroughput,
    P99Ttft,
    MedianTtft,
    P99Tpot,
    MedianTpot,
    P99E2el,
    MedianE2el,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::RequestThroughput,
        Metric::OutputTokenThroughput,
        Metric::P99Ttft,
        Metric::MedianTtft,
        Metric::P99Tpot,
        Metric::MedianTpot,
        Metric::P99E2el,
        Metric::MedianE2el,
    ];

    /// Label as printed in the log, including the unit.
    pub fn label(self) -> &'static str {
        match self {
            Metric::RequestThroughput => "Request throughput (req/s)",
            Metric::OutputTokenThroughput => "Output token throughput (tok/s)",
            Metric::P99Ttft => "P99 TTFT (ms)",
            Metric::MedianTtft => "Median TTFT (ms)",
            Metric::P99Tpot => "P99 TPOT (ms)",
            Metric::MedianTpot => "Median TPOT (ms)",
            Metric::P99E2el => "P99 E2EL (ms)",
            Metric::MedianE2el => "Median E2EL (ms)",
        }
    }

    /// Summary column name.
    pub fn column(self) -> &'static str {
        match self {
            Metric::RequestThroughput => "request_throughput_req_s",
            Metric::OutputTokenThroughput => "output_token_throughput_tok_s",
            Metric::P99Ttft => "p99_ttft_ms",
            Metric::MedianTtft => "median_ttft_ms",
            Metric::P99Tpot => "p99_tpot_ms",
            Metric::MedianTpot => "median_tpot_ms",
            Metric::P99E2el => "p99_e2el_ms",
            Metric::MedianE2el => "median_e2el_ms",
        }
    }

    fn pattern(self) -> &'static Regex {
        &METRIC_PATTERNS[self as usize]
    }
}

/// One compiled pattern per metric, indexed by discriminant.
static METRIC_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    Metric::ALL
        .iter()
        .map(|m| Regex::new(&format!(r"{}:\s*([0-9.]+)", regex::escape(m.label()))).unwrap())
        .collect()
});

/// Measured outcomes of one run. `None` means the metric was not found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunMetrics {
    pub request_throughput_req_s: Option<f64>,
    pub output_token_throughput_tok_s: Option<f64>,
    pub p99_ttft_ms: Option<f64>,
    pub median_ttft_ms: Option<f64>,
    pub p99_tpot_ms: Option<f64>,
    pub median_tpot_ms: Option<f64>,
    pub p99_e2el_ms: Option<f64>,
    pub median_e2el_ms: Option<f64>,
}

impl RunMetrics {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::RequestThroughput => self.request_throughput_req_s,
            Metric::OutputTokenThroughput => self.output_token_throughput_tok_s,
            Metric::P99Ttft => self.p99_ttft_ms,
            Metric::MedianTtft => self.median_ttft_ms,
            Metric::P99Tpot => self.p99_tpot_ms,
            Metric::MedianTpot => self.median_tpot_ms,
            Metric::P99E2el => self.p99_e2el_ms,
            Metric::MedianE2el => self.median_e2el_ms,
        }
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        let slot = match metric {
            Metric::RequestThroughput => &mut self.request_throughput_req_s,
            Metric::OutputTokenThroughput => &mut self.output_token_throughput_tok_s,
            Metric::P99Ttft => &mut self.p99_ttft_ms,
            Metric::MedianTtft => &mut self.median_ttft_ms,
            Metric::P99Tpot => &mut self.p99_tpot_ms,
            Metric::MedianTpot => &mut self.median_tpot_ms,
            Metric::P99E2el => &mut self.p99_e2el_ms,
            Metric::MedianE2el => &mut self.median_e2el_ms,
        };
        *slot = value;
    }

    /// Number of metrics that were found.
    pub fn found_count(&self) -> usize {
        Metric::ALL
            .iter()
            .filter(|m| self.get(**m).is_some())
            .count()
    }
}

/// Errors produced while reading a log file.
#[derive(Debug)]
pub enum ExtractError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Read { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractError::Read { source, .. } => Some(source),
        }
    }
}

/// Extract all metrics from log text. The first occurrence of each label wins.
pub fn extract(content: &str) -> RunMetrics {
    let mut metrics = RunMetrics::default();
    for metric in Metric::ALL {
        metrics.set(metric, find_metric(content, metric));
    }
    metrics
}

fn find_metric(content: &str, metric: Metric) -> Option<f64> {
    let caps = metric.pattern().captures(content)?;
    let raw = &caps[1];
    match raw.parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::debug!(metric = metric.label(), value = raw, "unparseable metric value");
            None
        }
    }
}

/// Read a log file and extract its metrics.
///
/// Fails only when the file cannot be read as UTF-8 text; the caller skips
/// the whole file in that case.
pub fn read_metrics(path: &Path) -> Result<RunMetrics, ExtractError> {
    let content = std::fs::read_to_string(path).map_err(|e| ExtractError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(extract(&content))
}
