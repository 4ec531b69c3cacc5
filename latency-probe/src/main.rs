mod config;
mod probe;

use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

/// Time a single completion request against an inference server and print
/// the latency in milliseconds, or -1.00 on any failure.
#[derive(Parser, Debug)]
#[command(name = "latency-probe", version, about)]
struct Cli {
    /// Prompt text sent to the completions endpoint (may start with '-')
    #[arg(value_name = "PROMPT", allow_hyphen_values = true)]
    prompt: Option<String>,

    /// Completions endpoint URL (overrides config)
    #[arg(long)]
    url: Option<String>,

    /// Maximum tokens to generate (overrides config)
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Config file path
    #[arg(short, long, default_value = "latency-probe.toml")]
    config: PathBuf,
}

/// Help and version output are not failures; every other argument error is.
fn is_usage_failure(e: &clap::Error) -> bool {
    !matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if is_usage_failure(&e) => {
            let _ = e.print();
            println!("{}", probe::FAILURE_SENTINEL);
            return ExitCode::FAILURE;
        }
        Err(e) => e.exit(),
    };

    // stdout carries only the measurement.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("latency_probe=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(prompt) = cli.prompt else {
        tracing::error!("missing prompt argument");
        println!("{}", probe::FAILURE_SENTINEL);
        return ExitCode::FAILURE;
    };

    let cfg = config::load_config(&cli.config).with_overrides(cli.url, cli.max_tokens);
    let result = probe::run(&cfg, &prompt).await;
    if let Err(e) = &result {
        tracing::warn!(url = %cfg.server.url, "{e}");
    }
    println!("{}", probe::format_latency(&result));
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_prompt_is_optional_for_sentinel_output() {
        let cli = Cli::try_parse_from(["latency-probe"]).unwrap();
        assert!(cli.prompt.is_none());
        assert_eq!(cli.config, PathBuf::from("latency-probe.toml"));
    }

    #[test]
    fn test_hyphen_leading_prompts_are_prompts() {
        for prompt in ["- list three colors", "-5 reasons"] {
            let cli = Cli::try_parse_from(["latency-probe", prompt]).unwrap();
            assert_eq!(cli.prompt.as_deref(), Some(prompt));
        }
    }

    #[test]
    fn test_hyphen_prompt_with_flags() {
        let cli = Cli::try_parse_from([
            "latency-probe",
            "--max-tokens",
            "32",
            "-5 reasons to test",
        ])
        .unwrap();
        assert_eq!(cli.prompt.as_deref(), Some("-5 reasons to test"));
        assert_eq!(cli.max_tokens, Some(32));
    }

    #[test]
    fn test_argument_errors_are_usage_failures() {
        let err = Cli::try_parse_from(["latency-probe", "hi", "--max-tokens", "lots"]).unwrap_err();
        assert!(is_usage_failure(&err));

        let help = Cli::try_parse_from(["latency-probe", "--help"]).unwrap_err();
        assert!(!is_usage_failure(&help));
        let version = Cli::try_parse_from(["latency-probe", "--version"]).unwrap_err();
        assert!(!is_usage_failure(&version));
    }

    #[test]
    fn test_prompt_and_overrides() {
        let cli = Cli::try_parse_from([
            "latency-probe",
            "Write a haiku",
            "--url",
            "http://10.0.0.2:8000/v1/completions",
            "--max-tokens",
            "64",
        ])
        .unwrap();
        assert_eq!(cli.prompt.as_deref(), Some("Write a haiku"));
        assert_eq!(cli.url.as_deref(), Some("http://10.0.0.2:8000/v1/completions"));
        assert_eq!(cli.max_tokens, Some(64));
    }
}
