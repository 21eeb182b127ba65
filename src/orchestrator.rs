//! Orchestrator agent: cross-agent coordination over the bus.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::agent::{Agent, AgentStats};
use crate::bus::MessageBus;
use crate::error::{Error, Result};
use crate::protocol::Envelope;

/// Well-known bus ID the orchestrator registers under.
pub const ORCHESTRATOR_ID: &str = "orchestrator";

/// Bus member and bus client at once: answers `health_check`,
/// `register_agent`, and `list_agents` requests, and fans its own
/// requests out to other agents via [`OrchestratorAgent::coordinate_request`].
///
/// Holds only a weak bus reference; the registry holds the strong
/// `Arc<dyn Agent>` side, including the orchestrator itself.
pub struct OrchestratorAgent {
    bus: Weak<MessageBus>,
    stats: AgentStats,
    /// Acknowledgment bookkeeping for `register_agent`. Distinct from
    /// bus registration: recording an ID here does not route anything.
    acknowledged: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl OrchestratorAgent {
    /// Create an orchestrator bound to a bus. The caller still registers
    /// it: `bus.register(ORCHESTRATOR_ID, Arc::new(orchestrator))`.
    pub fn new(bus: &Arc<MessageBus>) -> Self {
        Self {
            bus: Arc::downgrade(bus),
            stats: AgentStats::new(),
            acknowledged: Mutex::new(HashMap::new()),
        }
    }

    fn bus(&self) -> Result<Arc<MessageBus>> {
        self.bus.upgrade().ok_or_else(|| Error::AgentFault {
            agent_id: ORCHESTRATOR_ID.to_string(),
            message: "message bus is no longer available".to_string(),
        })
    }

    /// Send a request to another agent through the bus and unwrap the
    /// conventional success payload.
    ///
    /// An error-typed reply is raised as [`Error::AgentFault`] carrying
    /// the wrapped error text; on success the `data` field is returned
    /// (an empty object when the target sent none).
    pub async fn coordinate_request(
        &self,
        target_agent: &str,
        request_type: &str,
        payload: Value,
    ) -> Result<Value> {
        let bus = self.bus()?;
        let message = Envelope::new(request_type, ORCHESTRATOR_ID, target_agent, payload);
        let response = bus.dispatch(message).await?;

        if response.is_error() {
            let detail = response.payload["error"]
                .as_str()
                .unwrap_or("Unknown error")
                .to_string();
            return Err(Error::AgentFault {
                agent_id: target_agent.to_string(),
                message: detail,
            });
        }

        Ok(response
            .payload
            .get("data")
            .cloned()
            .unwrap_or_else(|| json!({})))
    }

    async fn run_operation(&self, request: &Envelope) -> Result<Envelope> {
        match request.message_type.as_str() {
            "health_check" => self.handle_health_check(request).await,
            "register_agent" => self.handle_register_agent(request),
            "list_agents" => self.handle_list_agents(request),
            other => Ok(self.build_error(
                request,
                &Error::UnsupportedOperation(other.to_string()).to_string(),
            )),
        }
    }

    async fn handle_health_check(&self, request: &Envelope) -> Result<Envelope> {
        let bus = self.bus()?;
        let mut agents = Vec::new();

        for agent_id in bus.registered_ids() {
            // Lookup at the moment of use; an ID unregistered mid-walk
            // drops out of the report.
            let agent = match bus.agent(&agent_id) {
                Some(agent) => agent,
                None => continue,
            };

            match agent.health_check().await {
                Ok(health) => agents.push(serde_json::to_value(health)?),
                Err(e) => {
                    tracing::warn!("Health check failed for {}: {}", agent_id, e);
                    agents.push(json!({
                        "agent_id": agent_id,
                        "status": "error",
                        "error": e.to_string(),
                    }));
                }
            }
        }

        let total_agents = agents.len();
        Ok(self.build_response(
            request,
            json!({
                "orchestrator_status": "healthy",
                "agents": agents,
                "total_agents": total_agents,
            }),
        ))
    }

    fn handle_register_agent(&self, request: &Envelope) -> Result<Envelope> {
        let agent_id = match request.payload["agent_id"].as_str() {
            Some(id) => id.to_string(),
            None => {
                return Ok(self.build_error(
                    request,
                    &Error::MissingField("agent_id".to_string()).to_string(),
                ))
            }
        };

        let now = Utc::now();
        self.acknowledged
            .lock()
            .unwrap()
            .insert(agent_id.clone(), now);
        tracing::info!("Acknowledged agent registration: {}", agent_id);

        Ok(self.build_response(
            request,
            json!({
                "registered": true,
                "agent_id": agent_id,
                "timestamp": now,
            }),
        ))
    }

    fn handle_list_agents(&self, request: &Envelope) -> Result<Envelope> {
        let bus = self.bus()?;
        let mut agents = Vec::new();

        for agent_id in bus.registered_ids() {
            let agent = match bus.agent(&agent_id) {
                Some(agent) => agent,
                None => continue,
            };

            match agent.capabilities() {
                Ok(capabilities) => agents.push(json!({
                    "agent_id": agent_id,
                    "capabilities": capabilities,
                    "status": "active",
                })),
                Err(e) => agents.push(json!({
                    "agent_id": agent_id,
                    "status": "error",
                    "error": e.to_string(),
                })),
            }
        }

        let total_count = agents.len();
        Ok(self.build_response(
            request,
            json!({
                "agents": agents,
                "total_count": total_count,
            }),
        ))
    }
}

#[async_trait]
impl Agent for OrchestratorAgent {
    fn agent_id(&self) -> &str {
        ORCHESTRATOR_ID
    }

    fn stats(&self) -> &AgentStats {
        &self.stats
    }

    fn capabilities(&self) -> Result<Vec<String>> {
        Ok(vec![
            "health_check".to_string(),
            "register_agent".to_string(),
            "list_agents".to_string(),
            "coordinate_agents".to_string(),
            "error_handling".to_string(),
        ])
    }

    async fn handle(&self, request: &Envelope) -> Result<Envelope> {
        self.stats.record_message();

        match self.run_operation(request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                tracing::error!("Orchestrator error on message {}: {}", request.message_id, e);
                Ok(self.build_error(request, &format!("Internal error: {}", e)))
            }
        }
    }
}
