//! Message bus: agent registry and envelope dispatch.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde_json::{json, Value};

use crate::agent::Agent;
use crate::error::{Error, Result};
use crate::protocol::{Envelope, MESSAGE_TYPE_ERROR};

/// Process-wide rendezvous point resolving agent IDs to instances.
///
/// The bus owns the registry; agents are `Arc`-shared and may outlive
/// their registration. There is no ambient singleton: the composition
/// root constructs a bus and hands it to whoever needs one.
pub struct MessageBus {
    agents: RwLock<HashMap<String, Arc<dyn Agent>>>,
}

impl MessageBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
        }
    }

    /// Register an agent under an ID. Registering an ID already in use
    /// replaces the prior agent.
    pub fn register(&self, agent_id: impl Into<String>, agent: Arc<dyn Agent>) {
        let agent_id = agent_id.into();
        self.agents.write().unwrap().insert(agent_id.clone(), agent);
        tracing::info!("Registered agent: {}", agent_id);
    }

    /// Remove an agent registration. Unregistering an absent ID is a no-op.
    pub fn unregister(&self, agent_id: &str) {
        if self.agents.write().unwrap().remove(agent_id).is_some() {
            tracing::info!("Unregistered agent: {}", agent_id);
        }
    }

    /// Look up a registered agent at the moment of use.
    pub fn agent(&self, agent_id: &str) -> Option<Arc<dyn Agent>> {
        self.agents.read().unwrap().get(agent_id).cloned()
    }

    /// Sorted snapshot of registered agent IDs.
    pub fn registered_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.agents.read().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Deliver an envelope to its recipient and return the reply.
    ///
    /// An unregistered recipient fails with [`Error::UnknownRecipient`].
    /// Any fault the recipient's handler returns is converted into an
    /// error-typed envelope attributed to that agent; dispatch never
    /// propagates an agent's fault to the caller.
    pub async fn dispatch(&self, envelope: Envelope) -> Result<Envelope> {
        let agent = {
            let agents = self.agents.read().unwrap();
            agents.get(&envelope.recipient).cloned()
        }
        .ok_or_else(|| Error::UnknownRecipient(envelope.recipient.clone()))?;

        tracing::debug!(
            "Dispatching {} from {} to {} ({})",
            envelope.message_type,
            envelope.sender,
            envelope.recipient,
            envelope.message_id
        );

        match agent.handle(&envelope).await {
            Ok(response) => {
                tracing::debug!(
                    "Message {} handled by {} ({})",
                    envelope.message_id,
                    envelope.recipient,
                    response.message_type
                );
                Ok(response)
            }
            Err(fault) => {
                tracing::error!(
                    "Agent {} failed on message {}: {}",
                    envelope.recipient,
                    envelope.message_id,
                    fault
                );
                Ok(envelope.reply(
                    MESSAGE_TYPE_ERROR,
                    envelope.recipient.clone(),
                    json!({
                        "error": fault.to_string(),
                        "error_type": fault.kind(),
                    }),
                ))
            }
        }
    }

    /// Construct an envelope, dispatch it, and bound the wait.
    ///
    /// Dispatch itself never blocks; the bound exists for agents that do
    /// slow external I/O inside `handle`. Expiry fails with
    /// [`Error::Timeout`] and does not cancel the running handler. One
    /// attempt only; retries are the caller's concern.
    pub async fn send_with_timeout(
        &self,
        recipient: &str,
        message_type: &str,
        payload: Value,
        sender: &str,
        timeout: Duration,
    ) -> Result<Envelope> {
        let envelope = Envelope::new(message_type, sender, recipient, payload);
        let message_id = envelope.message_id.clone();

        match tokio::time::timeout(timeout, self.dispatch(envelope)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Message {} to {} timed out", message_id, recipient);
                Err(Error::Timeout {
                    recipient: recipient.to_string(),
                    message_id,
                })
            }
        }
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentStats;
    use async_trait::async_trait;

    struct EchoAgent {
        stats: AgentStats,
    }

    impl EchoAgent {
        fn new() -> Self {
            Self { stats: AgentStats::new() }
        }
    }

    #[async_trait]
    impl Agent for EchoAgent {
        fn agent_id(&self) -> &str {
            "echo"
        }

        fn stats(&self) -> &AgentStats {
            &self.stats
        }

        fn capabilities(&self) -> Result<Vec<String>> {
            Ok(vec!["echo".to_string()])
        }

        async fn handle(&self, request: &Envelope) -> Result<Envelope> {
            self.stats.record_message();
            Ok(self.build_response(request, json!({"echoed": request.payload.clone()})))
        }
    }

    struct FaultyAgent {
        stats: AgentStats,
    }

    #[async_trait]
    impl Agent for FaultyAgent {
        fn agent_id(&self) -> &str {
            "faulty"
        }

        fn stats(&self) -> &AgentStats {
            &self.stats
        }

        fn capabilities(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn handle(&self, _request: &Envelope) -> Result<Envelope> {
            self.stats.record_message();
            Err(Error::AgentFault {
                agent_id: "faulty".to_string(),
                message: "backing store unavailable".to_string(),
            })
        }
    }

    struct SleepyAgent {
        stats: AgentStats,
    }

    #[async_trait]
    impl Agent for SleepyAgent {
        fn agent_id(&self) -> &str {
            "sleepy"
        }

        fn stats(&self) -> &AgentStats {
            &self.stats
        }

        fn capabilities(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn handle(&self, request: &Envelope) -> Result<Envelope> {
            self.stats.record_message();
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(self.build_response(request, json!({})))
        }
    }

    /// Tagging agent used to observe which registration dispatch hits.
    struct TaggedAgent {
        tag: &'static str,
        stats: AgentStats,
    }

    #[async_trait]
    impl Agent for TaggedAgent {
        fn agent_id(&self) -> &str {
            self.tag
        }

        fn stats(&self) -> &AgentStats {
            &self.stats
        }

        fn capabilities(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn handle(&self, request: &Envelope) -> Result<Envelope> {
            self.stats.record_message();
            Ok(self.build_response(request, json!({"tag": self.tag})))
        }
    }

    #[tokio::test]
    async fn test_echo_dispatch() {
        let bus = MessageBus::new();
        bus.register("echo", Arc::new(EchoAgent::new()));

        let request = Envelope::new("x", "s", "echo", json!({"a": 1}));
        let request_id = request.message_id.clone();
        let response = bus.dispatch(request).await.unwrap();

        assert_eq!(response.message_type, "response");
        assert_eq!(response.payload["data"]["echoed"], json!({"a": 1}));
        assert_eq!(response.correlation_id, Some(request_id));
    }

    #[tokio::test]
    async fn test_unknown_recipient_is_a_fault() {
        let bus = MessageBus::new();

        let envelope = Envelope::new("x", "s", "nobody", json!({}));
        let result = bus.dispatch(envelope).await;

        match result {
            Err(Error::UnknownRecipient(id)) => assert_eq!(id, "nobody"),
            other => panic!("expected UnknownRecipient, got {:?}", other.map(|e| e.message_type)),
        }
    }

    #[tokio::test]
    async fn test_agent_fault_becomes_error_envelope() {
        let bus = MessageBus::new();
        bus.register("faulty", Arc::new(FaultyAgent { stats: AgentStats::new() }));

        let request = Envelope::new("x", "caller", "faulty", json!({}));
        let conversation_id = request.conversation_id.clone();
        let request_id = request.message_id.clone();

        let response = bus.dispatch(request).await.unwrap();

        assert_eq!(response.message_type, "error");
        assert_eq!(response.sender, "faulty");
        assert_eq!(response.recipient, "caller");
        assert_eq!(response.conversation_id, conversation_id);
        assert_eq!(response.correlation_id, Some(request_id));
        assert!(response.payload["error"]
            .as_str()
            .unwrap()
            .contains("backing store unavailable"));
        assert_eq!(response.payload["error_type"], "agent_fault");
    }

    #[tokio::test]
    async fn test_register_overwrites() {
        let bus = MessageBus::new();
        bus.register("worker", Arc::new(TaggedAgent { tag: "first", stats: AgentStats::new() }));
        bus.register("worker", Arc::new(TaggedAgent { tag: "second", stats: AgentStats::new() }));

        let response = bus
            .dispatch(Envelope::new("x", "s", "worker", json!({})))
            .await
            .unwrap();
        assert_eq!(response.payload["data"]["tag"], "second");
        assert_eq!(bus.registered_ids(), vec!["worker".to_string()]);
    }

    #[tokio::test]
    async fn test_unregister_absent_is_noop() {
        let bus = MessageBus::new();
        bus.unregister("ghost");

        bus.register("echo", Arc::new(EchoAgent::new()));
        bus.unregister("echo");
        bus.unregister("echo");
        assert!(bus.registered_ids().is_empty());
    }

    #[tokio::test]
    async fn test_send_with_timeout_expires() {
        let bus = MessageBus::new();
        bus.register("sleepy", Arc::new(SleepyAgent { stats: AgentStats::new() }));

        let result = bus
            .send_with_timeout("sleepy", "x", json!({}), "caller", Duration::from_millis(20))
            .await;

        match result {
            Err(Error::Timeout { recipient, .. }) => assert_eq!(recipient, "sleepy"),
            other => panic!("expected Timeout, got {:?}", other.map(|e| e.message_type)),
        }
    }

    #[tokio::test]
    async fn test_send_with_timeout_passes_result_through() {
        let bus = MessageBus::new();
        bus.register("echo", Arc::new(EchoAgent::new()));

        let response = bus
            .send_with_timeout("echo", "x", json!({"k": "v"}), "caller", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(response.payload["data"]["echoed"], json!({"k": "v"}));
        assert_eq!(response.recipient, "caller");
    }
}
