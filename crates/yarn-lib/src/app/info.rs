//! Application snapshots and termination classification

use serde::Deserialize;
use std::fmt;

/// YARN ResourceManager application state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationState {
    New,
    NewSaving,
    Submitted,
    Accepted,
    Running,
    Finished,
    Failed,
    Killed,
    #[serde(other)]
    Unknown,
}

impl ApplicationState {
    /// FINISHED, FAILED or KILLED
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationState::Finished | ApplicationState::Failed | ApplicationState::Killed
        )
    }
}

/// Outcome YARN assigns once an application terminates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalStatus {
    #[default]
    Undefined,
    Succeeded,
    Failed,
    Killed,
    Ended,
    #[serde(other)]
    Unknown,
}

impl FinalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FinalStatus::Undefined => "UNDEFINED",
            FinalStatus::Succeeded => "SUCCEEDED",
            FinalStatus::Failed => "FAILED",
            FinalStatus::Killed => "KILLED",
            FinalStatus::Ended => "ENDED",
            FinalStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for FinalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One poll result for an application
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApplicationInfo {
    pub id: String,
    pub state: ApplicationState,
    #[serde(rename = "finalStatus", default)]
    pub final_status: FinalStatus,
}

/// The cluster answers either `{"app": {...}}` or the bare object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AppEnvelope {
    Wrapped { app: ApplicationInfo },
    Bare(ApplicationInfo),
}

impl ApplicationInfo {
    /// Decode a `/ws/v1/cluster/apps/{id}` body in either shape
    pub fn from_response(body: &str) -> serde_json::Result<Self> {
        Ok(match serde_json::from_str(body)? {
            AppEnvelope::Wrapped { app } => app,
            AppEnvelope::Bare(app) => app,
        })
    }
}

/// True iff `info` is present and its state is FINISHED, FAILED or KILLED
pub fn terminated(info: Option<&ApplicationInfo>) -> bool {
    info.is_some_and(|info| info.state.is_terminal())
}

/// True iff the final status is anything but SUCCEEDED
///
/// Only meaningful once [`terminated`] holds: a running application
/// reports UNDEFINED and would be classified as failed.
pub fn failed(info: &ApplicationInfo) -> bool {
    info.final_status != FinalStatus::Succeeded
}
