//! Service definition document for the YARN services API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// YARN caps service names at a DNS label
const MAX_SERVICE_NAME_LEN: usize = 63;

const NAME_PREFIX: &str = "airbyte";

/// Everything needed to launch one connector run
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    /// Docker image (e.g. "airbyte/source-postgres")
    pub image: String,
    pub tag: String,
    /// Connector command with its arguments (e.g. "read --config ...")
    pub command: String,
    /// Program prefixed to the command inside the container
    pub entrypoint: String,
    /// Host path bound into the container
    pub mount_source: String,
    /// Container path the host path is bound to
    pub mount_target: String,
    /// Container path receiving the connector's stdout
    pub output_path: String,
    pub queue: String,
    /// Extra disambiguator appended to the service name
    pub name_suffix: Option<String>,
    /// Connector config shipped as `{mount_target}/config.json`
    pub connector_config: Option<Value>,
    /// Configured catalog shipped as `{mount_target}/catalog.json`
    pub catalog: Option<Value>,
    pub cpus: u32,
    pub memory_mb: u32,
}

impl LaunchRequest {
    /// Request with default tag, entrypoint, queue and resources
    pub fn new(
        image: impl Into<String>,
        command: impl Into<String>,
        mount_source: impl Into<String>,
        mount_target: impl Into<String>,
    ) -> Self {
        let mount_target = mount_target.into();
        let output_path = format!("{}/stdout", mount_target.trim_end_matches('/'));
        Self {
            image: image.into(),
            tag: "latest".to_string(),
            command: command.into(),
            entrypoint: "python main.py".to_string(),
            mount_source: mount_source.into(),
            mount_target,
            output_path,
            queue: "default".to_string(),
            name_suffix: None,
            connector_config: None,
            catalog: None,
            cpus: 2,
            memory_mb: 1024,
        }
    }

    /// Last path segment of the image (e.g. "source-postgres")
    pub fn image_slug(&self) -> &str {
        self.image.rsplit('/').next().unwrap_or(self.image.as_str())
    }

    /// First word of the command (e.g. "read")
    pub fn command_keyword(&self) -> &str {
        self.command.split_whitespace().next().unwrap_or("run")
    }
}

/// Top-level service document posted to `/app/v1/services`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub name: String,
    pub version: String,
    pub components: Vec<Component>,
    pub configuration: ServiceConfiguration,
    pub queue: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub number_of_containers: u32,
    pub restart_policy: String,
    pub artifact: Artifact,
    pub launch_command: String,
    pub resource: Resource,
    pub configuration: ComponentConfiguration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub cpus: u32,
    /// Memory in MB, a string in the YARN API
    pub memory: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentConfiguration {
    pub env: BTreeMap<String, String>,
    pub properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<ConfigFile>,
}

/// A file YARN materializes inside the container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(rename = "type")]
    pub kind: String,
    pub dest_file: String,
    pub properties: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfiguration {
    pub properties: BTreeMap<String, Value>,
}

impl ServiceDefinition {
    /// Compose the definition for one connector run
    pub fn build(request: &LaunchRequest, now: DateTime<Utc>) -> Self {
        let slug = request.image_slug();
        let mount_target = request.mount_target.trim_end_matches('/');

        let mut env = BTreeMap::new();
        env.insert(
            "YARN_CONTAINER_RUNTIME_DOCKER_RUN_OVERRIDE_DISABLE".to_string(),
            "true".to_string(),
        );
        env.insert(
            "YARN_CONTAINER_RUNTIME_DOCKER_MOUNTS".to_string(),
            format!("{}:{}:rw", request.mount_source, mount_target),
        );

        // The connector has no readiness semantics YARN could probe
        let mut properties = BTreeMap::new();
        for (key, value) in [
            ("yarn.service.default-readiness-check.enabled", "false"),
            ("yarn.service.container-state-report-as-service-state", "true"),
            ("dns.check.enabled", "false"),
            ("docker.network", "bridge"),
        ] {
            properties.insert(key.to_string(), value.to_string());
        }

        let mut files = Vec::new();
        if let Some(config) = &request.connector_config {
            files.push(json_file(format!("{}/config.json", mount_target), config));
        }
        if let Some(catalog) = &request.catalog {
            files.push(json_file(format!("{}/catalog.json", mount_target), catalog));
        }

        // Retries belong to the orchestrator, not to YARN
        let mut service_properties = BTreeMap::new();
        service_properties.insert(
            "yarn.service.am-restart.max-attempts".to_string(),
            Value::from(1),
        );
        service_properties.insert(
            "yarn.dispatcher.drain-events.timeout".to_string(),
            Value::from(0),
        );

        Self {
            name: service_name(request, now),
            version: "1.0".to_string(),
            components: vec![Component {
                name: sanitize_name(&format!("airbyte-container-{}", slug)),
                number_of_containers: 1,
                restart_policy: "NEVER".to_string(),
                artifact: Artifact {
                    id: format!("{}:{}", request.image, request.tag),
                    kind: "DOCKER".to_string(),
                },
                launch_command: format!(
                    "\"{} {} > {}\"",
                    request.entrypoint, request.command, request.output_path
                ),
                resource: Resource {
                    cpus: request.cpus,
                    memory: request.memory_mb.to_string(),
                },
                configuration: ComponentConfiguration {
                    env,
                    properties,
                    files,
                },
            }],
            configuration: ServiceConfiguration {
                properties: service_properties,
            },
            queue: request.queue.clone(),
        }
    }
}

fn json_file(dest_file: String, properties: &Value) -> ConfigFile {
    ConfigFile {
        kind: "JSON".to_string(),
        dest_file,
        properties: properties.clone(),
    }
}

/// `airbyte-{slug}-{keyword}-{timestamp}[-{suffix}]`, DNS-safe
///
/// When the name would exceed a DNS label, the slug and keyword are
/// shortened first so the timestamp and suffix survive intact.
pub fn service_name(request: &LaunchRequest, now: DateTime<Utc>) -> String {
    let mut tail = now.format("%Y%m%d%H%M%S").to_string();
    if let Some(suffix) = &request.name_suffix {
        tail.push('-');
        tail.push_str(suffix);
    }
    let mut tail = sanitize_name(&tail);
    truncate_label(&mut tail, MAX_SERVICE_NAME_LEN - NAME_PREFIX.len() - 1);

    let mut head = sanitize_name(&format!(
        "{}-{}-{}",
        NAME_PREFIX,
        request.image_slug(),
        request.command_keyword()
    ));
    truncate_label(&mut head, MAX_SERVICE_NAME_LEN - tail.len() - 1);

    format!("{}-{}", head, tail)
}

fn truncate_label(label: &mut String, max_len: usize) {
    label.truncate(max_len);
    while label.ends_with('-') {
        label.pop();
    }
}

/// Lowercase, `[a-z0-9-]` only, no repeated or trailing dashes, max 63 chars
fn sanitize_name(raw: &str) -> String {
    let mut name = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = c.to_ascii_lowercase();
        let c = if c.is_ascii_alphanumeric() { c } else { '-' };
        if c == '-' && (name.is_empty() || name.ends_with('-')) {
            continue;
        }
        name.push(c);
    }
    truncate_label(&mut name, MAX_SERVICE_NAME_LEN);
    name
}
