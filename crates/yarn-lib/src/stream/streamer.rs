//! Streaming state machine
//!
//! Relays the output file while the application runs, then drains it once
//! the application has terminated successfully.

use super::reader::read_new_lines;
use crate::app::{failed, terminated, FinalStatus, StatusSource};
use crate::config::PollOptions;
use crate::error::{Result, YarnError};
use crate::wait::pause;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Where the streamer is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Polling the application and relaying new lines
    WaitingForApp,
    /// Application succeeded, one last read pending
    Draining,
    Done,
    /// Application terminated without succeeding
    Failed(FinalStatus),
}

/// Totals reported once streaming completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    pub bytes_relayed: u64,
    pub polls: u32,
}

/// Tails an output file until the application behind it terminates
pub struct OutputStreamer<S> {
    source: S,
    app_id: String,
    path: PathBuf,
    poll_interval: Duration,
    drain_grace: Duration,
    cursor: u64,
}

impl<S: StatusSource> OutputStreamer<S> {
    pub fn new(
        source: S,
        app_id: impl Into<String>,
        path: impl Into<PathBuf>,
        options: &PollOptions,
    ) -> Self {
        Self {
            source,
            app_id: app_id.into(),
            path: path.into(),
            poll_interval: options.poll_interval,
            drain_grace: options.drain_grace,
            cursor: 0,
        }
    }

    /// Bytes of the output file already relayed
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drive the state machine to completion
    ///
    /// Returns `ApplicationFailure` when the application ends without
    /// succeeding; nothing more is read from the file in that case.
    pub async fn run<W>(&mut self, out: &mut W, cancel: &CancellationToken) -> Result<StreamSummary>
    where
        W: AsyncWrite + Unpin,
    {
        info!(app_id = %self.app_id, path = %self.path.display(), "Streaming application output");

        let start = self.cursor;
        let mut polls = 0u32;
        let mut state = StreamState::WaitingForApp;

        loop {
            state = match state {
                StreamState::WaitingForApp => {
                    let app = self.source.application_info(&self.app_id, cancel).await?;
                    polls += 1;

                    if terminated(Some(&app)) {
                        if failed(&app) {
                            StreamState::Failed(app.final_status)
                        } else {
                            StreamState::Draining
                        }
                    } else {
                        self.cursor = read_new_lines(&self.path, self.cursor, out, false).await?;
                        pause(self.poll_interval, cancel).await?;
                        StreamState::WaitingForApp
                    }
                }
                StreamState::Draining => {
                    // Give the mount a moment to surface the last writes
                    pause(self.drain_grace, cancel).await?;
                    self.cursor = read_new_lines(&self.path, self.cursor, out, true).await?;
                    StreamState::Done
                }
                StreamState::Done => {
                    let summary = StreamSummary {
                        bytes_relayed: self.cursor - start,
                        polls,
                    };
                    info!(
                        app_id = %self.app_id,
                        bytes = summary.bytes_relayed,
                        polls,
                        "Application finished successfully"
                    );
                    return Ok(summary);
                }
                StreamState::Failed(final_status) => {
                    error!(app_id = %self.app_id, %final_status, "Application failed");
                    return Err(YarnError::ApplicationFailure {
                        app_id: self.app_id.clone(),
                        final_status: final_status.to_string(),
                    });
                }
            };
        }
    }
}
