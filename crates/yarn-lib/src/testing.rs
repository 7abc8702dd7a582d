//! Shared helpers for unit tests

use crate::config::{PollOptions, YarnConfig};
use crate::session::YarnSession;
use std::collections::HashMap;
use std::time::Duration;

/// `Authorization` header for the test credentials
pub const BASIC_AUTH: &str = "Basic YWlyYnl0ZTpzZWNyZXQ=";

pub fn test_config(base_url: &str) -> YarnConfig {
    YarnConfig {
        base_url: base_url.to_string(),
        username: "airbyte".to_string(),
        password: "secret".to_string(),
        extra_headers: HashMap::new(),
        queue: "default".to_string(),
    }
}

pub fn test_session(base_url: &str) -> YarnSession {
    YarnSession::new(&test_config(base_url)).unwrap()
}

/// Millisecond-scale timings so loops finish quickly
pub fn fast_options() -> PollOptions {
    PollOptions {
        resolve_interval: Duration::from_millis(10),
        resolve_timeout: Duration::from_secs(2),
        retry_interval: Duration::from_millis(10),
        retry_deadline: Duration::from_millis(200),
        poll_interval: Duration::from_millis(10),
        drain_grace: Duration::from_millis(10),
        file_wait_timeout: None,
    }
}
