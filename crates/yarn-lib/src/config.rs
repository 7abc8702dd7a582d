//! Cluster and timing configuration

use crate::error::{Result, YarnError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Environment variable naming the container-side mount directory
pub const MOUNT_DIR_ENV: &str = "AIRBYTE_MOUNT_DIR";

/// Mount directory used when `AIRBYTE_MOUNT_DIR` is unset
pub const DEFAULT_MOUNT_DIR: &str = "/tmp";

/// Connection settings for the YARN cluster, supplied by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YarnConfig {
    /// Cluster REST endpoint (e.g. "https://rm.example.com:8090")
    pub base_url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Headers merged over the defaults, these win on conflict
    #[serde(default)]
    pub extra_headers: HashMap<String, String>,

    /// Target scheduling queue
    #[serde(default = "default_queue")]
    pub queue: String,
}

fn default_queue() -> String {
    "default".to_string()
}

impl YarnConfig {
    /// Parse a config serialized as JSON (the `--yarn_config` argument)
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| YarnError::Configuration(format!("invalid yarn_config JSON: {}", e)))
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Container-side mount directory, honoring `AIRBYTE_MOUNT_DIR`
pub fn mount_dir() -> String {
    std::env::var(MOUNT_DIR_ENV).unwrap_or_else(|_| DEFAULT_MOUNT_DIR.to_string())
}

/// Timing knobs for the polling loops
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Delay between service lookups while resolving the application id
    pub resolve_interval: Duration,
    /// Overall deadline for resolving the application id
    pub resolve_timeout: Duration,
    /// Delay between status retries after a transient failure
    pub retry_interval: Duration,
    /// Window after which status polling failures become fatal
    pub retry_deadline: Duration,
    /// Delay between status polls while streaming
    pub poll_interval: Duration,
    /// Grace delay before the final drain read
    pub drain_grace: Duration,
    /// Optional bound on waiting for the output file to appear
    pub file_wait_timeout: Option<Duration>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            resolve_interval: Duration::from_secs(1),
            resolve_timeout: Duration::from_secs(600),
            retry_interval: Duration::from_secs(3),
            retry_deadline: Duration::from_secs(60),
            poll_interval: Duration::from_secs(1),
            drain_grace: Duration::from_secs(2),
            file_wait_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_applies_defaults() {
        let config = YarnConfig::from_json(
            r#"{"base_url": "http://rm:8088/", "username": "u", "password": "p"}"#,
        )
        .unwrap();

        assert_eq!(config.queue, "default");
        assert!(config.extra_headers.is_empty());
        assert_eq!(config.base_url(), "http://rm:8088");
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = YarnConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, YarnError::Configuration(_)));
    }

    #[test]
    fn test_default_poll_options() {
        let options = PollOptions::default();
        assert_eq!(options.poll_interval, Duration::from_secs(1));
        assert_eq!(options.retry_interval, Duration::from_secs(3));
        assert_eq!(options.retry_deadline, Duration::from_secs(60));
        assert_eq!(options.drain_grace, Duration::from_secs(2));
        assert!(options.file_wait_timeout.is_none());
    }
}
