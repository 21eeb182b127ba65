//! Agent communication protocol for agentbus.
//!
//! This module defines the wire-level contract between agents:
//! - Message envelopes with conversation and correlation IDs
//! - Reserved message tags (`response`, `error`)
//! - Health records for introspection

pub mod envelope;
pub mod types;

pub use envelope::Envelope;
pub use types::{AgentHealth, HealthStatus, MESSAGE_TYPE_ERROR, MESSAGE_TYPE_RESPONSE, PROTOCOL_VERSION};
