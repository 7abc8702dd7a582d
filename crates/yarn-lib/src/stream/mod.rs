//! Output streaming
//!
//! This module provides:
//! - Cursor-based incremental reads of the connector output file
//! - A bounded wait for the output file to appear
//! - The state machine relaying output until the application terminates

mod reader;
mod streamer;


pub use reader::{read_new_lines, wait_for_file};
pub use streamer::{OutputStreamer, StreamState, StreamSummary};
