//! meek-client-wrapper
//!
//! Starts a browser helper, reads the listen address it prints on stdout,
//! then runs meek-client with `--helper <address>` appended and mediates
//! shutdown of both.
//!
//! Sample usage in torrc (exact paths depend on platform):
//!
//! ```text
//! ClientTransportPlugin meek exec ./meek-client-wrapper --log meek-client-wrapper.log --helper ./tbb-helper -- ./meek-client --url=https://meek.example/ --front=www.example.com --log meek-client.log
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use meekwrap_core::config::DEFAULT_GRACE_PERIOD;
use meekwrap_core::tracing_init::{init_tracing, open_log_file};
use meekwrap_core::{HelperFormat, WrapperConfig};
use meekwrap_supervisor::{RunOutcome, SignalHub, Supervisor, WrapperError};

#[derive(Parser, Debug)]
#[command(name = "meek-client-wrapper")]
#[command(
    version,
    about = "Connects meek-client to meek-http-helper running in a browser",
    override_usage = "meek-client-wrapper [OPTIONS] --helper <PATH> -- <MEEK_CLIENT>..."
)]
struct Args {
    /// Name of log file (appended to)
    #[arg(long, env = "MEEKWRAP_LOG")]
    log: Option<PathBuf>,

    /// Path to the browser helper executable, or to its descriptor file
    #[arg(long, value_name = "PATH")]
    helper: Option<PathBuf>,

    /// How to interpret --helper: auto (descriptor on Windows), exec or descriptor
    #[arg(long, default_value_t = HelperFormat::Auto, env = "MEEKWRAP_HELPER_FORMAT")]
    helper_format: HelperFormat,

    /// Seconds to wait for the browser helper to exit before killing it.
    #[arg(long, default_value_t = DEFAULT_GRACE_PERIOD.as_secs(), env = "MEEKWRAP_GRACE_PERIOD")]
    grace_period: u64,

    /// Log level filter (e.g. "info", "debug", "warn").
    #[arg(long, default_value = "info", env = "MEEKWRAP_LOG_LEVEL")]
    log_level: String,

    /// Output logs as JSON.
    #[arg(long, env = "MEEKWRAP_LOG_JSON")]
    log_json: bool,

    /// meek-client command line, after `--`
    #[arg(last = true, value_name = "MEEK_CLIENT")]
    client_command: Vec<String>,
}

impl Args {
    fn config(&self) -> WrapperConfig {
        let mut config = WrapperConfig {
            log_file: self.log.clone(),
            log_level: self.log_level.clone(),
            log_json: self.log_json,
            helper_format: self.helper_format,
            helper_grace: Duration::from_secs(self.grace_period),
            ..WrapperConfig::default()
        };
        config.apply_env();
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config = args.config();

    let log_filter = format!(
        "meekwrap_supervisor={level},meekwrap_core={level}",
        level = config.log_level
    );
    let log_file = match config.log_file.as_deref().map(open_log_file).transpose() {
        Ok(file) => file,
        Err(e) => {
            init_tracing(&log_filter, config.log_json, None);
            error!(path = ?config.log_file, error = %e, "Failed to open log file");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&log_filter, config.log_json, log_file);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        helper = ?args.helper,
        helper_format = %config.helper_format,
        grace_secs = config.helper_grace.as_secs(),
        exit_on_stdin_close = config.exit_on_stdin_close,
        "Starting meek-client-wrapper"
    );

    match run(args, config).await {
        Ok(outcome) => {
            info!(?outcome, "meek-client-wrapper exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "meek-client-wrapper failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, config: WrapperConfig) -> anyhow::Result<RunOutcome> {
    let helper = args.helper.ok_or(WrapperError::MissingHelper)?;
    // Registered before any child starts so an early signal is not lost.
    let mut signals = SignalHub::install()?;
    let supervisor = Supervisor::new(config, helper, args.client_command)?;
    Ok(supervisor.run(&mut signals).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_arguments_are_the_client_command() {
        let args = Args::parse_from([
            "meek-client-wrapper",
            "--log",
            "w.log",
            "--helper",
            "./helper",
            "--",
            "./meek-client",
            "--url=https://meek.example/",
            "--log",
            "c.log",
        ]);
        assert_eq!(args.helper.as_deref(), Some(std::path::Path::new("./helper")));
        assert_eq!(args.log.as_deref(), Some(std::path::Path::new("w.log")));
        assert_eq!(
            args.client_command,
            ["./meek-client", "--url=https://meek.example/", "--log", "c.log"]
        );
    }

    #[test]
    fn defaults() {
        let args = Args::parse_from(["meek-client-wrapper", "--helper", "h", "--", "c"]);
        let config = args.config();
        assert_eq!(config.helper_grace, DEFAULT_GRACE_PERIOD);
        assert_eq!(config.helper_format, HelperFormat::Auto);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn helper_format_is_parsed() {
        let args = Args::parse_from([
            "meek-client-wrapper",
            "--helper-format",
            "descriptor",
            "--helper",
            "h.txt",
            "--",
            "c",
        ]);
        assert_eq!(args.helper_format, HelperFormat::Descriptor);
        assert!(Args::try_parse_from(["w", "--helper-format", "bogus", "--", "c"]).is_err());
    }

    #[test]
    fn missing_helper_is_reported_at_runtime() {
        let args = Args::parse_from(["meek-client-wrapper", "--", "c"]);
        assert!(args.helper.is_none());
        assert_eq!(
            WrapperError::MissingHelper.to_string(),
            "either specify a --helper, or run meek-client directly."
        );
    }
}
