//! yarn-stream
//!
//! Relays a connector's output file to stdout while its YARN application
//! runs. Started by the orchestrator once the service has been submitted.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use yarn_lib::observability::{init_tracing, LogFormat, RunLogger};
use yarn_lib::shutdown::cancel_on_signal;
use yarn_lib::stream::OutputStreamer;
use yarn_lib::{PollOptions, StatusPoller, StreamSummary, YarnConfig, YarnError, YarnSession};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Stream an Airbyte output file until the YARN application is finished
///
/// Exit status: 0 when the application succeeded, 1 when it failed,
/// 2 for any other error (bad arguments, unreachable cluster, signals).
#[derive(Parser, Debug)]
#[command(name = "yarn-stream")]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Path to the file to stream
    pub file_path: PathBuf,

    /// YARN config as JSON (base_url, username, password, extra_headers, queue)
    #[arg(long = "yarn_config")]
    pub yarn_config: String,

    /// YARN application id to wait for
    #[arg(long = "app_id")]
    pub app_id: String,

    /// Seconds between application status polls
    #[arg(long = "poll_interval_secs", default_value_t = 1)]
    pub poll_interval_secs: u64,

    /// Seconds to wait before the final read once the application finished
    #[arg(long = "drain_grace_secs", default_value_t = 2)]
    pub drain_grace_secs: u64,

    /// Emit logs on stderr as JSON
    #[arg(long = "log_json")]
    pub log_json: bool,
}

impl Cli {
    fn poll_options(&self) -> PollOptions {
        PollOptions {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            drain_grace: Duration::from_secs(self.drain_grace_secs),
            ..PollOptions::default()
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    });

    match run(&cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{:#}", err), "yarn-stream failed");
            ExitCode::from(exit_code(&err))
        }
    }
}

async fn run(cli: &Cli) -> Result<StreamSummary> {
    let logger = RunLogger::new(&cli.app_id);
    logger.log_startup("yarn-stream", VERSION);

    let config = YarnConfig::from_json(&cli.yarn_config).context("Invalid --yarn_config")?;
    let session = YarnSession::new(&config).context("Cannot build YARN session")?;
    let options = cli.poll_options();
    info!(base_url = %session.base_url(), app_id = %cli.app_id, "Watching application");

    let cancel = cancel_on_signal();
    let poller = StatusPoller::new(session, &options);
    let mut streamer = OutputStreamer::new(poller, cli.app_id.clone(), &cli.file_path, &options);

    let mut stdout = tokio::io::stdout();
    let outcome = streamer.run(&mut stdout, &cancel).await;
    logger.log_outcome(&outcome);

    Ok(outcome?)
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<YarnError>() {
        Some(err) if err.is_application_failure() => 1,
        _ => 2,
    }
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
    fn test_parse_streaming_arguments() {
        let cli = Cli::try_parse_from([
            "yarn-stream",
            "/tmp/stdout",
            "--yarn_config",
            r#"{"base_url": "http://rm:8088", "username": "u", "password": "p"}"#,
            "--app_id",
            "application_1_0001",
        ])
        .unwrap();

        assert_eq!(cli.file_path, PathBuf::from("/tmp/stdout"));
        assert_eq!(cli.app_id, "application_1_0001");
        let options = cli.poll_options();
        assert_eq!(options.poll_interval, Duration::from_secs(1));
        assert_eq!(options.drain_grace, Duration::from_secs(2));
        assert_eq!(options.retry_deadline, Duration::from_secs(60));
    }

    #[test]
    fn test_app_id_is_required() {
        let result = Cli::try_parse_from(["yarn-stream", "/tmp/stdout", "--yarn_config", "{}"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_exit_codes() {
        let failure = anyhow::Error::new(YarnError::ApplicationFailure {
            app_id: "application_1".to_string(),
            final_status: "KILLED".to_string(),
        });
        assert_eq!(exit_code(&failure), 1);

        let config = anyhow::Error::new(YarnError::Configuration("missing".to_string()))
            .context("Invalid --yarn_config");
        assert_eq!(exit_code(&config), 2);
    }
}
