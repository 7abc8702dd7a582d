//! Error taxonomy for launching and watching YARN services

use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, YarnError>;

/// Errors raised while submitting, resolving or streaming a YARN service
#[derive(Debug, Error)]
pub enum YarnError {
    /// Missing or invalid credentials/configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The service-creation endpoint rejected the definition
    #[error("service submission failed ({status}): {body}")]
    Submission { status: StatusCode, body: String },

    /// The service was created but the response carried no usable uri
    #[error("service {name} accepted ({status}) without a usable uri: {body}")]
    MalformedSubmission {
        name: String,
        status: StatusCode,
        body: String,
    },

    /// The service stopped before yielding a running application
    #[error("YARN service stopped before starting the application: {body}")]
    StartupFailure { body: String },

    /// The service never reported an application id within the deadline
    #[error("service {uri} did not start an application within {timeout_secs}s")]
    ResolveTimeout { uri: String, timeout_secs: u64 },

    /// Status polling kept failing for the whole retry window
    #[error("failed to poll application {app_id} after {attempts} attempts: {last_error}")]
    PollFailure {
        app_id: String,
        attempts: u32,
        last_error: String,
    },

    /// The application terminated without succeeding
    #[error("YARN application {app_id} failed (final status {final_status})")]
    ApplicationFailure { app_id: String, final_status: String },

    /// The output file never appeared
    #[error("File not created after {timeout_secs}: {}", .path.display())]
    Timeout { timeout_secs: u64, path: PathBuf },

    /// Service deletion was rejected by the cluster
    #[error("failed to delete service {name} ({status}): {body}")]
    Cleanup {
        name: String,
        status: StatusCode,
        body: String,
    },

    /// A cluster endpoint answered with a non-2xx status
    #[error("unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    /// The cancellation token fired while waiting
    #[error("operation cancelled")]
    Cancelled,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl YarnError {
    /// Whether the error came from the application itself rather than
    /// from this process or the network
    pub fn is_application_failure(&self) -> bool {
        matches!(
            self,
            YarnError::ApplicationFailure { .. } | YarnError::StartupFailure { .. }
        )
    }

    /// Name of a service left live on the cluster by a failed submission
    pub fn created_service(&self) -> Option<&str> {
        match self {
            YarnError::MalformedSubmission { name, .. } => Some(name),
            _ => None,
        }
    }
}
