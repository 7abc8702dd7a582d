//! Application status polling with bounded retry

use super::info::ApplicationInfo;
use crate::config::PollOptions;
use crate::error::{Result, YarnError};
use crate::session::YarnSession;
use crate::wait::pause;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Anything that can report the current state of an application
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch a fresh snapshot for `app_id`
    async fn application_info(
        &self,
        app_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ApplicationInfo>;
}

/// Polls `/ws/v1/cluster/apps/{id}`, absorbing transient failures
#[derive(Debug, Clone)]
pub struct StatusPoller {
    session: YarnSession,
    retry_interval: Duration,
    retry_deadline: Duration,
}

impl StatusPoller {
    pub fn new(session: YarnSession, options: &PollOptions) -> Self {
        Self {
            session,
            retry_interval: options.retry_interval,
            retry_deadline: options.retry_deadline,
        }
    }

    /// Single request with no retry
    pub async fn fetch_once(&self, app_id: &str) -> Result<ApplicationInfo> {
        let path = format!("ws/v1/cluster/apps/{}", app_id);
        let response = self.session.get(&path).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(YarnError::UnexpectedStatus { status, body });
        }

        Ok(ApplicationInfo::from_response(&body)?)
    }
}

#[async_trait]
impl StatusSource for StatusPoller {
    /// Retries every `retry_interval` until `retry_deadline` has passed
    /// since the first attempt, then gives up with the last error.
    async fn application_info(
        &self,
        app_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ApplicationInfo> {
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match self.fetch_once(app_id).await {
                Ok(info) => {
                    debug!(
                        app_id,
                        state = ?info.state,
                        final_status = %info.final_status,
                        "Polled application"
                    );
                    return Ok(info);
                }
                Err(err) => {
                    if started.elapsed() >= self.retry_deadline {
                        return Err(YarnError::PollFailure {
                            app_id: app_id.to_string(),
                            attempts,
                            last_error: err.to_string(),
                        });
                    }
                    warn!(app_id, attempts, error = %err, "Status poll failed, retrying");
                    pause(self.retry_interval, cancel).await?;
                }
            }
        }
    }
}
