//! Launch data-integration connectors on YARN and stream their output
//!
//! This crate provides the core functionality for:
//! - Authenticated sessions against the YARN REST API
//! - Submitting connector services and deleting them afterwards
//! - Resolving services to applications and polling their status
//! - Relaying the connector's output file until the application ends

pub mod app;
pub mod config;
pub mod error;
pub mod launch;
pub mod observability;
pub mod service;
pub mod session;
pub mod shutdown;
pub mod stream;
pub mod wait;

#[cfg(test)]
mod testing;

pub use app::{ApplicationInfo, ApplicationResolver, StatusPoller, StatusSource};
pub use config::{PollOptions, YarnConfig};
pub use error::{Result, YarnError};
pub use launch::Launcher;
pub use service::{LaunchRequest, ServiceRef, ServiceSubmitter};
pub use session::YarnSession;
pub use stream::{OutputStreamer, StreamSummary};
