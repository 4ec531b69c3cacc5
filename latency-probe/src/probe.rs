/// One non-streaming completion request, timed from send until the full
/// response body has arrived.
use crate::config::ProbeConfig;
use reqwest::StatusCode;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Printed in place of a latency when the probe fails for any reason.
pub const FAILURE_SENTINEL: &str = "-1.00";

#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub prompt: &'a str,
    pub max_tokens: u32,
    pub temperature: f64,
    pub stream: bool,
}

impl<'a> CompletionRequest<'a> {
    pub fn new(prompt: &'a str, config: &ProbeConfig) -> Self {
        Self {
            prompt,
            max_tokens: config.request.max_tokens,
            temperature: config.request.temperature,
            stream: false,
        }
    }
}

#[derive(Debug)]
pub enum ProbeError {
    Http(reqwest::Error),
    Status(StatusCode),
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeError::Http(e) => write!(f, "request failed: {e}"),
            ProbeError::Status(status) => write!(f, "server returned {status}"),
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProbeError::Http(e) => Some(e),
            ProbeError::Status(_) => None,
        }
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(e: reqwest::Error) -> Self {
        ProbeError::Http(e)
    }
}

/// Send one completion request and time it. Only `200 OK` counts as success.
pub async fn measure(
    client: &reqwest::Client,
    url: &str,
    request: &CompletionRequest<'_>,
) -> Result<Duration, ProbeError> {
    let start = Instant::now();
    let resp = client.post(url).json(request).send().await?;
    let status = resp.status();
    if status != StatusCode::OK {
        return Err(ProbeError::Status(status));
    }
    resp.bytes().await?;
    Ok(start.elapsed())
}

/// Build a client (no timeout) and run a single probe against the configured server.
pub async fn run(config: &ProbeConfig, prompt: &str) -> Result<Duration, ProbeError> {
    let client = reqwest::Client::builder().build()?;
    let request = CompletionRequest::new(prompt, config);
    tracing::debug!(url = %config.server.url, max_tokens = request.max_tokens, "sending probe");
    measure(&client, &config.server.url, &request).await
}

/// Milliseconds with two decimals, or the failure sentinel.
pub fn format_latency(result: &Result<Duration, ProbeError>) -> String {
    match result {
        Ok(elapsed) => format!("{:.2}", elapsed.as_secs_f64() * 1000.0),
        Err(_) => FAILURE_SENTINEL.to_string(),
    }
}
