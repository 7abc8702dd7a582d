//! End-to-end connector run: submit, resolve, stream, clean up

use crate::app::{ApplicationResolver, StatusPoller};
use crate::config::PollOptions;
use crate::error::Result;
use crate::service::{LaunchRequest, ServiceRef, ServiceSubmitter};
use crate::session::YarnSession;
use crate::stream::{wait_for_file, OutputStreamer, StreamSummary};
use std::path::PathBuf;
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Runs one connector on the cluster and relays its output
#[derive(Debug)]
pub struct Launcher {
    submitter: ServiceSubmitter,
    resolver: ApplicationResolver,
    poller: StatusPoller,
    options: PollOptions,
}

impl Launcher {
    pub fn new(session: YarnSession, options: PollOptions) -> Self {
        Self {
            submitter: ServiceSubmitter::new(session.clone()),
            resolver: ApplicationResolver::new(session.clone(), &options),
            poller: StatusPoller::new(session, &options),
            options,
        }
    }

    /// Launch `request` and stream `output_file` (the host-side view of
    /// `request.output_path`) into `out`
    ///
    /// Once the service is created it is deleted again however the run
    /// ends, including cancellation. A failed deletion is logged and never
    /// replaces the outcome of the run.
    pub async fn run<W>(
        &self,
        request: &LaunchRequest,
        output_file: impl Into<PathBuf>,
        out: &mut W,
        cancel: &CancellationToken,
    ) -> Result<StreamSummary>
    where
        W: AsyncWrite + Unpin,
    {
        let service = match self.submitter.submit(request).await {
            Ok(service) => service,
            Err(err) => {
                if let Some(name) = err.created_service() {
                    self.cleanup(name).await;
                }
                return Err(err);
            }
        };
        let outcome = self.watch(&service, output_file.into(), out, cancel).await;

        self.cleanup(&service.name).await;
        outcome
    }

    async fn cleanup(&self, name: &str) {
        if let Err(err) = self.submitter.delete_named(name).await {
            warn!(service = %name, error = %err, "Failed to delete YARN service");
        }
    }

    async fn watch<W>(
        &self,
        service: &ServiceRef,
        output_file: PathBuf,
        out: &mut W,
        cancel: &CancellationToken,
    ) -> Result<StreamSummary>
    where
        W: AsyncWrite + Unpin,
    {
        let app_id = self.resolver.resolve(&service.uri, cancel).await?;
        info!(service = %service.name, app_id = %app_id, "Service running");

        if let Some(timeout) = self.options.file_wait_timeout {
            wait_for_file(&output_file, timeout, self.options.poll_interval, cancel).await?;
        }

        let mut streamer =
            OutputStreamer::new(self.poller.clone(), app_id, output_file, &self.options);
        streamer.run(out, cancel).await
    }
}
