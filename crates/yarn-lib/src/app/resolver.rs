//! Resolves a submitted service to its application id

use crate::config::PollOptions;
use crate::error::{Result, YarnError};
use crate::session::YarnSession;
use crate::wait::pause;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Service state reported before YARN launches the application
const NOT_STARTED_STATE: &str = "ACCEPTED";

/// Service states that end the startup wait with a failure
const STARTUP_FAILED_STATES: &[&str] = &["STOPPED", "FAILED"];

/// The subset of the service status we care about
#[derive(Debug, Default, Deserialize)]
struct ServiceStatus {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

/// Polls `/app/{uri}` until the service reports a started application
#[derive(Debug, Clone)]
pub struct ApplicationResolver {
    session: YarnSession,
    interval: Duration,
    timeout: Duration,
}

impl ApplicationResolver {
    pub fn new(session: YarnSession, options: &PollOptions) -> Self {
        Self {
            session,
            interval: options.resolve_interval,
            timeout: options.resolve_timeout,
        }
    }

    /// Wait for the application id behind `service_uri`
    pub async fn resolve(&self, service_uri: &str, cancel: &CancellationToken) -> Result<String> {
        let path = format!("app/{}", service_uri.trim_start_matches('/'));
        let started = Instant::now();

        loop {
            match self.lookup(&path).await {
                Ok((status, body)) => {
                    let state = status.state.as_deref().unwrap_or_default();
                    if STARTUP_FAILED_STATES.contains(&state) {
                        return Err(YarnError::StartupFailure { body });
                    }

                    let started_state = !state.is_empty() && state != NOT_STARTED_STATE;
                    match status.id.as_deref() {
                        Some(id) if !id.is_empty() && started_state => {
                            info!(service_uri, app_id = id, state, "Resolved YARN application");
                            return Ok(id.to_string());
                        }
                        id => debug!(service_uri, ?id, state, "Service not started yet"),
                    }
                }
                Err(err) => warn!(service_uri, error = %err, "Service lookup failed"),
            }

            if started.elapsed() >= self.timeout {
                return Err(YarnError::ResolveTimeout {
                    uri: service_uri.to_string(),
                    timeout_secs: self.timeout.as_secs(),
                });
            }
            pause(self.interval, cancel).await?;
        }
    }

    async fn lookup(&self, path: &str) -> Result<(ServiceStatus, String)> {
        let response = self.session.get(path).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(YarnError::UnexpectedStatus { status, body });
        }

        let parsed = serde_json::from_str(&body)?;
        Ok((parsed, body))
    }
}
