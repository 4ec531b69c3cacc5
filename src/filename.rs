/// Run-configuration recovery from benchmark log file names.
///
/// Two naming conventions coexist in older log directories:
///
/// - detailed: `bm_log_<seqs>_<tokens>_<rate>_<gpu_util>_<cache_hit>.txt`
/// - legacy:   `bm_log_<seqs>_<tokens>_<rate>.txt`
///
/// The detailed form is tried first; a legacy name never carries the GPU
/// memory or cache-hit fields, so those fall back to fixed defaults.
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::LazyLock;

/// GPU memory utilization assumed for legacy file names.
pub const DEFAULT_GPU_MEMORY_UTILIZATION: f64 = 0.90;

/// Minimum cache-hit percentage assumed for legacy file names.
pub const DEFAULT_MIN_CACHE_HIT_PCT: u32 = 0;

static DETAILED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^bm_log_([0-9]+)_([0-9]+)_([[:alnum:]]+)_([0-9.]+)_([0-9.]+)\.txt$").unwrap()
});

static LEGACY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^bm_log_([0-9]+)_([0-9]+)_([[:alnum:]]+)\.txt$").unwrap());

/// Which naming convention a file name followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenameFormat {
    Detailed,
    Legacy,
}

/// Configuration of one benchmark run, as encoded in its log file name.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub format: FilenameFormat,
    pub max_num_seqs: u64,
    pub max_num_batched_tokens: u64,
    /// Kept verbatim: either a decimal rate or the unbounded token (`inf`).
    pub request_rate: String,
    pub gpu_memory_utilization: f64,
    pub min_cache_hit_pct: u32,
}

/// Classify a bare file name. Returns `None` when neither convention matches.
pub fn classify(file_name: &str) -> Option<RunConfig> {
    if let Some(caps) = DETAILED_PATTERN.captures(file_name) {
        return parse_detailed(&caps);
    }
    if let Some(caps) = LEGACY_PATTERN.captures(file_name) {
        return parse_legacy(&caps);
    }
    None
}

/// Classify the file name component of `path`.
pub fn classify_path(path: &Path) -> Option<RunConfig> {
    let name = path.file_name()?.to_str()?;
    classify(name)
}

fn parse_detailed(caps: &Captures<'_>) -> Option<RunConfig> {
    let gpu_memory_utilization: f64 = caps[4].parse().ok()?;
    let cache_hit_fraction: f64 = caps[5].parse().ok()?;
    Some(RunConfig {
        format: FilenameFormat::Detailed,
        max_num_seqs: caps[1].parse().ok()?,
        max_num_batched_tokens: caps[2].parse().ok()?,
        request_rate: caps[3].to_string(),
        gpu_memory_utilization,
        min_cache_hit_pct: fraction_to_pct(cache_hit_fraction)?,
    })
}

fn parse_legacy(caps: &Captures<'_>) -> Option<RunConfig> {
    Some(RunConfig {
        format: FilenameFormat::Legacy,
        max_num_seqs: caps[1].parse().ok()?,
        max_num_batched_tokens: caps[2].parse().ok()?,
        request_rate: caps[3].to_string(),
        gpu_memory_utilization: DEFAULT_GPU_MEMORY_UTILIZATION,
        min_cache_hit_pct: DEFAULT_MIN_CACHE_HIT_PCT,
    })
}

/// Fraction to whole percent, truncating toward zero (0.10 -> 10, 0.255 -> 25).
fn fraction_to_pct(fraction: f64) -> Option<u32> {
    let pct = (fraction * 100.0).trunc();
    if !pct.is_finite() || pct < 0.0 || pct > u32::MAX as f64 {
        return None;
    }
    Some(pct as u32)
}
