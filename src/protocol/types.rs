//! Reserved message tags and health records for agent communication.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wire compatibility marker carried by every envelope.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Reserved `message_type` tag for success replies.
pub const MESSAGE_TYPE_RESPONSE: &str = "response";

/// Reserved `message_type` tag for failure replies.
pub const MESSAGE_TYPE_ERROR: &str = "error";

/// Agent health classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Agent is functioning normally
    Healthy,
    /// Agent is operational but impaired
    Degraded,
    /// Agent cannot process messages
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health record reported by an agent's `health_check`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentHealth {
    /// Reporting agent ID
    pub agent_id: String,
    /// Health classification
    pub status: HealthStatus,
    /// When the report was produced
    pub timestamp: DateTime<Utc>,
    /// Agent version string
    pub version: String,
    /// Operations the agent supports
    pub capabilities: Vec<String>,
    /// Numeric metrics (uptime, processed counts, ...)
    pub metrics: HashMap<String, f64>,
}
