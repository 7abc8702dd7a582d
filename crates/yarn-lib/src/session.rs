//! Authenticated HTTP session for the YARN REST API
//!
//! One session is built per invocation and handed to every component that
//! talks to the cluster. The underlying `reqwest::Client` pools connections,
//! so cloning a session is cheap and shares that pool.

use crate::config::YarnConfig;
use crate::error::{Result, YarnError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Per-request timeout for cluster calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client bound to one cluster and one set of credentials
#[derive(Clone)]
pub struct YarnSession {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl YarnSession {
    /// Build a session from a config
    pub fn new(config: &YarnConfig) -> Result<Self> {
        Self::from_config(Some(config))
    }

    /// Build a session from a config that may be absent
    ///
    /// No request is sent here; credentials are only checked for presence.
    pub fn from_config(config: Option<&YarnConfig>) -> Result<Self> {
        let config = config.ok_or_else(|| {
            YarnError::Configuration("missing required 'yarn_config'".to_string())
        })?;

        if config.username.is_empty() || config.password.is_empty() {
            return Err(YarnError::Configuration(
                "yarn_config requires both 'username' and 'password'".to_string(),
            ));
        }

        let base_url = config.base_url();
        if base_url.is_empty() {
            return Err(YarnError::Configuration(
                "yarn_config requires 'base_url'".to_string(),
            ));
        }
        Url::parse(base_url).map_err(|e| {
            YarnError::Configuration(format!("invalid base_url '{}': {}", base_url, e))
        })?;

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(default_headers(config)?)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Cluster base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path relative to the base URL
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Authenticated GET request
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.authed(self.client.get(self.url(path)))
    }

    /// Authenticated POST request
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.authed(self.client.post(self.url(path)))
    }

    /// Authenticated DELETE request
    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.authed(self.client.delete(self.url(path)))
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, Some(&self.password))
    }
}

impl fmt::Debug for YarnSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YarnSession")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `Content-Type: application/json` overlaid with the configured extras
fn default_headers(config: &YarnConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (name, value) in &config.extra_headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            YarnError::Configuration(format!("invalid header name '{}': {}", name, e))
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            YarnError::Configuration(format!("invalid value for header '{}': {}", name, e))
        })?;
        headers.insert(name, value);
    }

    Ok(headers)
}
