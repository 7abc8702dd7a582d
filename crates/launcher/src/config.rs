//! Launch configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use yarn_lib::config::mount_dir;
use yarn_lib::{LaunchRequest, PollOptions, YarnConfig};

/// Environment prefix for overrides, e.g. `YARN_LAUNCH__YARN_CONFIG__PASSWORD`
const ENV_PREFIX: &str = "YARN_LAUNCH";

/// Everything `yarn-launch` needs besides the connector command
#[derive(Debug, Clone, Deserialize)]
pub struct LaunchConfig {
    pub yarn_config: YarnConfig,

    pub airbyte_spec: ConnectorSpec,

    pub docker_mount: MountConfig,

    /// Connector config JSON shipped into the container
    #[serde(default)]
    pub connector_config_file: Option<PathBuf>,

    /// Configured catalog JSON shipped into the container
    #[serde(default)]
    pub catalog_file: Option<PathBuf>,

    /// Output file name inside the mount
    #[serde(default = "default_output_file")]
    pub output_file: String,

    #[serde(default)]
    pub resources: ResourceConfig,

    #[serde(default)]
    pub timing: TimingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectorSpec {
    pub image: String,

    #[serde(default = "default_tag")]
    pub tag: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MountConfig {
    /// Host directory, also read by this process
    pub source: String,

    /// Container directory, `AIRBYTE_MOUNT_DIR` or `/tmp` when unset
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default = "default_cpus")]
    pub cpus: u32,

    #[serde(default = "default_memory_mb")]
    pub memory_mb: u32,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            cpus: default_cpus(),
            memory_mb: default_memory_mb(),
        }
    }
}

/// Polling knobs in whole seconds
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_resolve_timeout")]
    pub resolve_timeout_secs: u64,

    #[serde(default = "default_retry_interval")]
    pub retry_interval_secs: u64,

    #[serde(default = "default_retry_deadline")]
    pub retry_deadline_secs: u64,

    #[serde(default = "default_drain_grace")]
    pub drain_grace_secs: u64,

    #[serde(default)]
    pub file_wait_timeout_secs: Option<u64>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            resolve_timeout_secs: default_resolve_timeout(),
            retry_interval_secs: default_retry_interval(),
            retry_deadline_secs: default_retry_deadline(),
            drain_grace_secs: default_drain_grace(),
            file_wait_timeout_secs: None,
        }
    }
}

fn default_tag() -> String {
    "latest".to_string()
}

fn default_output_file() -> String {
    "stdout".to_string()
}

fn default_cpus() -> u32 {
    2
}

fn default_memory_mb() -> u32 {
    1024
}

fn default_poll_interval() -> u64 {
    1
}

fn default_resolve_timeout() -> u64 {
    600
}

fn default_retry_interval() -> u64 {
    3
}

fn default_retry_deadline() -> u64 {
    60
}

fn default_drain_grace() -> u64 {
    2
}

impl TimingConfig {
    pub fn poll_options(&self) -> PollOptions {
        PollOptions {
            resolve_interval: Duration::from_secs(self.poll_interval_secs),
            resolve_timeout: Duration::from_secs(self.resolve_timeout_secs),
            retry_interval: Duration::from_secs(self.retry_interval_secs),
            retry_deadline: Duration::from_secs(self.retry_deadline_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            drain_grace: Duration::from_secs(self.drain_grace_secs),
            file_wait_timeout: self.file_wait_timeout_secs.map(Duration::from_secs),
        }
    }
}

impl LaunchConfig {
    /// Load the JSON file at `path`, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Json))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| format!("Failed to read launch config {}", path.display()))?;

        config
            .try_deserialize()
            .with_context(|| format!("Invalid launch config {}", path.display()))
    }

    /// Container-side mount directory
    pub fn mount_target(&self) -> String {
        self.docker_mount.target.clone().unwrap_or_else(mount_dir)
    }

    /// Where this process reads the connector output
    pub fn host_output_path(&self) -> PathBuf {
        Path::new(&self.docker_mount.source).join(&self.output_file)
    }

    /// Build the launch request for `command`
    pub fn launch_request(&self, command: &str, name_suffix: Option<String>) -> Result<LaunchRequest> {
        let target = self.mount_target();
        let mut request = LaunchRequest::new(
            self.airbyte_spec.image.as_str(),
            command,
            self.docker_mount.source.as_str(),
            target.as_str(),
        );
        request.tag = self.airbyte_spec.tag.clone();
        request.output_path = format!("{}/{}", target.trim_end_matches('/'), self.output_file);
        request.queue = self.yarn_config.queue.clone();
        request.name_suffix = name_suffix;
        request.cpus = self.resources.cpus;
        request.memory_mb = self.resources.memory_mb;
        request.connector_config = self
            .connector_config_file
            .as_deref()
            .map(read_json)
            .transpose()?;
        request.catalog = self.catalog_file.as_deref().map(read_json).transpose()?;
        Ok(request)
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}
