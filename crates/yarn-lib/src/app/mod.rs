//! Application lifecycle on the cluster
//!
//! This module provides:
//! - Application snapshots and the terminated/failed predicates
//! - Resolution of a submitted service to its application id
//! - Status polling with a bounded retry window

mod info;
mod poller;
mod resolver;


pub use info::{failed, terminated, ApplicationInfo, ApplicationState, FinalStatus};
pub use poller::{StatusPoller, StatusSource};
pub use resolver::ApplicationResolver;
