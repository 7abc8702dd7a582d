//! Service submission through the YARN services API
//!
//! This module provides:
//! - The service definition document and its naming rules
//! - A submitter that posts definitions and deletes finished services

mod definition;
mod submitter;

#[cfg(test)]
mod tests;

pub use definition::{
    service_name, Artifact, Component, ComponentConfiguration, ConfigFile, LaunchRequest,
    Resource, ServiceConfiguration, ServiceDefinition,
};
pub use submitter::{ServiceRef, ServiceSubmitter, SERVICES_PATH};
