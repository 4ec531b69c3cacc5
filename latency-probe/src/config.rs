use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct ProbeConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub request: RequestConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Completions endpoint of the inference server.
    #[serde(default = "default_url")]
    pub url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { url: default_url() }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RequestConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub temperature: f64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: 0.0,
        }
    }
}

fn default_url() -> String {
    "http://127.0.0.1:8004/v1/completions".to_string()
}
fn default_max_tokens() -> u32 {
    2048
}

impl ProbeConfig {
    pub fn with_overrides(mut self, url: Option<String>, max_tokens: Option<u32>) -> Self {
        if let Some(url) = url {
            self.server.url = url;
        }
        if let Some(max_tokens) = max_tokens {
            self.request.max_tokens = max_tokens;
        }
        self
    }
}

/// Load config from `path`, or defaults when it is missing or invalid.
pub fn load_config(path: &Path) -> ProbeConfig {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("failed to parse {}: {e}", path.display());
                ProbeConfig::default()
            }
        },
        Err(_) => ProbeConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ProbeConfig::default();
        assert_eq!(cfg.server.url, "http://127.0.0.1:8004/v1/completions");
        assert_eq!(cfg.request.max_tokens, 2048);
        assert_eq!(cfg.request.temperature, 0.0);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latency-probe.toml");
        std::fs::write(&path, "[server]\nurl = \"http://gpu-1:8000/v1/completions\"\n").unwrap();

        let cfg = load_config(&path);
        assert_eq!(cfg.server.url, "http://gpu-1:8000/v1/completions");
        assert_eq!(cfg.request.max_tokens, 2048);
    }

    #[test]
    fn test_invalid_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latency-probe.toml");
        std::fs::write(&path, "[request]\nmax_tokens = \"many\"\n").unwrap();
        assert_eq!(load_config(&path), ProbeConfig::default());
    }

    #[test]
    fn test_missing_file_is_default() {
        let cfg = load_config(Path::new("/nonexistent/latency-probe.toml"));
        assert_eq!(cfg, ProbeConfig::default());
    }

    #[test]
    fn test_overrides() {
        let cfg = ProbeConfig::default().with_overrides(Some("http://x/v1".into()), Some(16));
        assert_eq!(cfg.server.url, "http://x/v1");
        assert_eq!(cfg.request.max_tokens, 16);
    }
}
