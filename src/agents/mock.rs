//! Mock agent with canned responses, for demos and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use crate::agent::{Agent, AgentStats};
use crate::error::Result;
use crate::protocol::Envelope;

/// Agent that answers every request with a canned or synthetic success
/// payload. Stands in for out-of-process collaborators (file parsing,
/// calendar I/O) whose real implementations live elsewhere.
pub struct MockAgent {
    agent_id: String,
    stats: AgentStats,
    canned: HashMap<String, Value>,
}

impl MockAgent {
    /// Create a mock agent with no canned responses.
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            stats: AgentStats::new(),
            canned: HashMap::new(),
        }
    }

    /// Attach a canned response payload for a message type.
    pub fn with_canned_response(mut self, message_type: impl Into<String>, data: Value) -> Self {
        self.canned.insert(message_type.into(), data);
        self
    }
}

#[async_trait]
impl Agent for MockAgent {
    fn agent_id(&self) -> &str {
        &self.agent_id
    }

    fn version(&self) -> &str {
        "0.1.0-mock"
    }

    fn stats(&self) -> &AgentStats {
        &self.stats
    }

    fn capabilities(&self) -> Result<Vec<String>> {
        let mut capabilities: Vec<String> = self.canned.keys().cloned().collect();
        capabilities.sort();
        capabilities.push("mock_processing".to_string());
        Ok(capabilities)
    }

    async fn handle(&self, request: &Envelope) -> Result<Envelope> {
        self.stats.record_message();

        if let Some(data) = self.canned.get(&request.message_type) {
            return Ok(self.build_response(request, data.clone()));
        }

        Ok(self.build_response(
            request,
            json!({
                "mock_response": true,
                "agent_id": self.agent_id,
                "message_type": request.message_type,
                "timestamp": Utc::now(),
            }),
        ))
    }
}
