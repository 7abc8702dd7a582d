//! Posts service definitions and removes finished services

use super::definition::{LaunchRequest, ServiceDefinition};
use crate::error::{Result, YarnError};
use crate::session::YarnSession;
use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Path of the service-creation endpoint
pub const SERVICES_PATH: &str = "app/v1/services";

/// A live service created on the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRef {
    /// Service name, used for deletion
    pub name: String,
    /// Service URI returned by the cluster, used for resolution
    pub uri: String,
}

#[derive(Debug, Deserialize)]
struct CreateServiceResponse {
    uri: Option<String>,
}

/// Submits connector services through the YARN services API
#[derive(Debug, Clone)]
pub struct ServiceSubmitter {
    session: YarnSession,
}

impl ServiceSubmitter {
    pub fn new(session: YarnSession) -> Self {
        Self { session }
    }

    /// Build a definition for `request` and post it
    pub async fn submit(&self, request: &LaunchRequest) -> Result<ServiceRef> {
        let definition = ServiceDefinition::build(request, Utc::now());
        self.submit_definition(&definition).await
    }

    /// Post an already-built definition
    ///
    /// On success a live service exists on the cluster and the caller owns
    /// its deletion.
    pub async fn submit_definition(&self, definition: &ServiceDefinition) -> Result<ServiceRef> {
        let image = definition
            .components
            .first()
            .map(|c| c.artifact.id.as_str())
            .unwrap_or_default();
        info!(
            service = %definition.name,
            image = %image,
            queue = %definition.queue,
            "Submitting YARN service"
        );

        let response = self.session.post(SERVICES_PATH).json(definition).send().await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(YarnError::Submission { status, body });
        }

        // A 2xx means the service exists even when the body is unusable
        let uri = serde_json::from_str::<CreateServiceResponse>(&body)
            .ok()
            .and_then(|parsed| parsed.uri)
            .filter(|uri| !uri.is_empty())
            .ok_or_else(|| YarnError::MalformedSubmission {
                name: definition.name.clone(),
                status,
                body: body.clone(),
            })?;

        debug!(service = %definition.name, uri = %uri, "Service accepted");
        Ok(ServiceRef {
            name: definition.name.clone(),
            uri,
        })
    }

    /// Delete a service; an already-missing service counts as deleted
    pub async fn delete(&self, service: &ServiceRef) -> Result<()> {
        self.delete_named(&service.name).await
    }

    /// Delete a service by name
    pub async fn delete_named(&self, name: &str) -> Result<()> {
        let path = format!("{}/{}", SERVICES_PATH, name);
        let response = self.session.delete(&path).send().await?;

        let status = response.status();
        if status.is_success() {
            info!(service = %name, "Deleted YARN service");
            return Ok(());
        }
        if status == StatusCode::NOT_FOUND {
            warn!(service = %name, "Service already gone");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(YarnError::Cleanup {
            name: name.to_string(),
            status,
            body,
        })
    }
}
