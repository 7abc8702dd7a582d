//! Logging setup shared by the binaries
//!
//! Provides:
//! - Tracing subscriber initialization (stderr only, stdout carries
//!   connector output)
//! - Structured lifecycle events for one connector run

use crate::error::YarnError;
use crate::stream::StreamSummary;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log line format on stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Install the global subscriber, filtered by `RUST_LOG` (default `info`)
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init(),
    }
}

/// Structured lifecycle events tagged with the run they belong to
#[derive(Debug, Clone)]
pub struct RunLogger {
    run: String,
}

impl RunLogger {
    pub fn new(run: impl Into<String>) -> Self {
        Self { run: run.into() }
    }

    /// Log process startup
    pub fn log_startup(&self, binary: &str, version: &str) {
        info!(
            event = "startup",
            run = %self.run,
            binary = %binary,
            version = %version,
            "Starting"
        );
    }

    /// Log the outcome of a run
    pub fn log_outcome(&self, outcome: &Result<StreamSummary, YarnError>) {
        match outcome {
            Ok(summary) => info!(
                event = "run_succeeded",
                run = %self.run,
                bytes_relayed = summary.bytes_relayed,
                polls = summary.polls,
                "Connector run succeeded"
            ),
            Err(YarnError::Cancelled) => warn!(
                event = "run_cancelled",
                run = %self.run,
                "Connector run cancelled"
            ),
            Err(err) => error!(
                event = "run_failed",
                run = %self.run,
                application_failure = err.is_application_failure(),
                error = %err,
                "Connector run failed"
            ),
        }
    }
}
