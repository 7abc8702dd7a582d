//! yarn-launch - Run a connector on YARN as if it were a local process
//!
//! Submits the connector as a YARN service, waits for its application,
//! relays the connector's output file to stdout and deletes the service
//! when the run ends.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use yarn_lib::observability::{init_tracing, LogFormat, RunLogger};
use yarn_lib::shutdown::cancel_on_signal;
use yarn_lib::{Launcher, StreamSummary, YarnError, YarnSession};

mod config;

const LAUNCHER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Launch an Airbyte connector on YARN and stream its output
///
/// Exit status: 0 when the application succeeded, 1 when it failed or
/// stopped during startup, 2 for any other error.
#[derive(Parser, Debug)]
#[command(name = "yarn-launch")]
#[command(author, version, long_about = None)]
struct Cli {
    /// Path to the JSON launch configuration
    #[arg(long, env = "YARN_LAUNCH_CONFIG")]
    config: PathBuf,

    /// Extra disambiguator for the service name (e.g. a temp directory name)
    #[arg(long = "name_suffix")]
    name_suffix: Option<String>,

    /// Connector command and arguments, e.g. `read --config /tmp/config.json`
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(LogFormat::Json);
    info!("Starting yarn-launch");

    match run(cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{:#}", err), "yarn-launch failed");
            ExitCode::from(exit_code(&err))
        }
    }
}

async fn run(cli: Cli) -> Result<StreamSummary> {
    let config = config::LaunchConfig::load(&cli.config)?;
    let command = cli.command.join(" ");
    let request = config.launch_request(&command, cli.name_suffix)?;
    info!(
        image = %request.image,
        tag = %request.tag,
        command = %command,
        queue = %request.queue,
        "Launch configured"
    );

    let session = YarnSession::new(&config.yarn_config).context("Cannot build YARN session")?;
    let launcher = Launcher::new(session, config.timing.poll_options());

    let logger = RunLogger::new(request.image_slug());
    logger.log_startup("yarn-launch", LAUNCHER_VERSION);

    let cancel = cancel_on_signal();
    let mut stdout = tokio::io::stdout();
    let outcome = launcher
        .run(&request, config.host_output_path(), &mut stdout, &cancel)
        .await;
    logger.log_outcome(&outcome);

    Ok(outcome?)
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<YarnError>() {
        Some(err) if err.is_application_failure() => 1,
        _ => 2,
    }
}
