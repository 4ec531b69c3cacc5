use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default config file looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "bench-summary.toml";

/// Top-level configuration loaded from bench-summary.toml.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
#[derive(Default)]
pub struct SummaryConfig {
    pub discovery: DiscoveryConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Glob matched against file names directly inside the log directory.
    pub pattern: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// Summary file name, written into the log directory.
    pub file_name: String,
}

// --- Default implementations ---

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            pattern: "bm_log_*.txt".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file_name: "benchmark_summary.csv".to_string(),
        }
    }
}

/// Errors from loading an explicitly requested config file.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

impl SummaryConfig {
    /// Parse config from TOML text.
    pub fn from_toml(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load config from `path`.
    ///
    /// When `required` is false a missing file yields the defaults; an
    /// explicitly passed `--config` is required and must exist.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents, path),
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Apply CLI overrides on top of the file config.
    pub fn with_overrides(mut self, pattern: Option<String>, file_name: Option<String>) -> Self {
        if let Some(pattern) = pattern {
            self.discovery.pattern = pattern;
        }
        if let Some(file_name) = file_name {
            self.output.file_name = file_name;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_historical_layout() {
        let cfg = SummaryConfig::default();
        assert_eq!(cfg.discovery.pattern, "bm_log_*.txt");
        assert_eq!(cfg.output.file_name, "benchmark_summary.csv");
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let cfg = SummaryConfig::from_toml(
            "[output]\nfile_name = \"runs.csv\"\n",
            Path::new("bench-summary.toml"),
        )
        .unwrap();
        assert_eq!(cfg.output.file_name, "runs.csv");
        assert_eq!(cfg.discovery.pattern, "bm_log_*.txt");
    }

    #[test]
    fn test_empty_toml_is_default() {
        let cfg = SummaryConfig::from_toml("", Path::new("x.toml")).unwrap();
        assert_eq!(cfg, SummaryConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = SummaryConfig::from_toml("[discovery\npattern = 3", Path::new("bad.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_missing_optional_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let cfg = SummaryConfig::load(&dir.path().join(DEFAULT_CONFIG_FILE), false).unwrap();
        assert_eq!(cfg, SummaryConfig::default());
    }

    #[test]
    fn test_missing_required_file_is_read_error() {
        let dir = tempdir().unwrap();
        let err = SummaryConfig::load(&dir.path().join("nope.toml"), true).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[discovery]\npattern = \"run_*.log\"\n").unwrap();
        let cfg = SummaryConfig::load(&path, true).unwrap();
        assert_eq!(cfg.discovery.pattern, "run_*.log");
    }

    #[test]
    fn test_cli_overrides_win() {
        let cfg = SummaryConfig::default()
            .with_overrides(Some("a_*.txt".to_string()), Some("out.csv".to_string()));
        assert_eq!(cfg.discovery.pattern, "a_*.txt");
        assert_eq!(cfg.output.file_name, "out.csv");

        let untouched = SummaryConfig::default().with_overrides(None, None);
        assert_eq!(untouched, SummaryConfig::default());
    }
}
