//! Agent capability contract: message handling, health, capabilities.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::error::Result;
use crate::protocol::{AgentHealth, Envelope, HealthStatus, MESSAGE_TYPE_ERROR, MESSAGE_TYPE_RESPONSE};

/// Per-instance counters backing the default health metrics.
///
/// Every agent owns one; implementations call [`AgentStats::record_message`]
/// exactly once on entry into `handle`.
#[derive(Debug)]
pub struct AgentStats {
    started_at: DateTime<Utc>,
    messages_processed: AtomicU64,
}

impl AgentStats {
    /// Create stats anchored at the current time with a zero counter.
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            messages_processed: AtomicU64::new(0),
        }
    }

    /// Increment the processed-message counter, returning the new count.
    pub fn record_message(&self) -> u64 {
        self.messages_processed.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Messages handled since construction.
    pub fn messages_processed(&self) -> u64 {
        self.messages_processed.load(Ordering::Relaxed)
    }

    /// Seconds elapsed since construction.
    pub fn uptime_seconds(&self) -> f64 {
        (Utc::now() - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

impl Default for AgentStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Contract every bus participant implements.
///
/// `handle` is the sole extension point. A well-behaved agent maps its
/// own domain errors to error-typed envelopes via [`Agent::build_error`];
/// an `Err` return is the uncaught fault the bus safety net converts
/// (see `MessageBus::dispatch`).
#[async_trait]
pub trait Agent: Send + Sync {
    /// Stable agent identifier, set once at construction.
    fn agent_id(&self) -> &str;

    /// Agent version reported in health records.
    fn version(&self) -> &str {
        "0.1.0"
    }

    /// Per-instance counters for health metrics.
    fn stats(&self) -> &AgentStats;

    /// Operations this agent supports, for discovery. The bus does not
    /// enforce the list; agents reject unknown operations themselves.
    fn capabilities(&self) -> Result<Vec<String>>;

    /// Process one request and produce a reply envelope.
    async fn handle(&self, request: &Envelope) -> Result<Envelope>;

    /// Report agent health. The default reports healthy with uptime and
    /// processed-message metrics.
    async fn health_check(&self) -> Result<AgentHealth> {
        let stats = self.stats();
        Ok(AgentHealth {
            agent_id: self.agent_id().to_string(),
            status: HealthStatus::Healthy,
            timestamp: Utc::now(),
            version: self.version().to_string(),
            capabilities: self.capabilities()?,
            metrics: HashMap::from([
                ("uptime_seconds".to_string(), stats.uptime_seconds()),
                ("messages_processed".to_string(), stats.messages_processed() as f64),
            ]),
        })
    }

    /// Build a success reply: `{"status": "success", "data": ...}`,
    /// addressed back to the request's sender with conversation and
    /// correlation IDs threaded.
    fn build_response(&self, request: &Envelope, data: Value) -> Envelope {
        request.reply(
            MESSAGE_TYPE_RESPONSE,
            self.agent_id(),
            json!({"status": "success", "data": data}),
        )
    }

    /// Build an error reply: `{"error": ...}`, threaded like
    /// [`Agent::build_response`].
    fn build_error(&self, request: &Envelope, message: &str) -> Envelope {
        request.reply(MESSAGE_TYPE_ERROR, self.agent_id(), json!({"error": message}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct NullAgent {
        stats: AgentStats,
    }

    #[async_trait]
    impl Agent for NullAgent {
        fn agent_id(&self) -> &str {
            "null_agent"
        }

        fn stats(&self) -> &AgentStats {
            &self.stats
        }

        fn capabilities(&self) -> Result<Vec<String>> {
            Ok(vec!["noop".to_string()])
        }

        async fn handle(&self, request: &Envelope) -> Result<Envelope> {
            self.stats.record_message();
            Ok(self.build_response(request, json!({})))
        }
    }

    #[test]
    fn test_build_response_threading() {
        let agent = NullAgent { stats: AgentStats::new() };
        let request = Envelope::new("noop", "caller", "null_agent", json!({"a": 1}));
        let response = agent.build_response(&request, json!({"echoed": true}));

        assert_eq!(response.message_type, MESSAGE_TYPE_RESPONSE);
        assert_eq!(response.sender, "null_agent");
        assert_eq!(response.recipient, "caller");
        assert_eq!(response.conversation_id, request.conversation_id);
        assert_eq!(response.correlation_id, Some(request.message_id.clone()));
        assert_eq!(response.payload["status"], "success");
        assert_eq!(response.payload["data"]["echoed"], true);
    }

    #[test]
    fn test_build_error_payload() {
        let agent = NullAgent { stats: AgentStats::new() };
        let request = Envelope::new("noop", "caller", "null_agent", json!({}));
        let error = agent.build_error(&request, "file too large");

        assert_eq!(error.message_type, MESSAGE_TYPE_ERROR);
        assert!(error.is_error());
        assert_eq!(error.payload["error"], "file too large");
        assert_eq!(error.conversation_id, request.conversation_id);
        assert_eq!(error.correlation_id, Some(request.message_id.clone()));
    }

    #[tokio::test]
    async fn test_stats_counter_increments_per_handle() {
        let agent = NullAgent { stats: AgentStats::new() };
        assert_eq!(agent.stats().messages_processed(), 0);

        let request = Envelope::new("noop", "caller", "null_agent", json!({}));
        agent.handle(&request).await.unwrap();
        agent.handle(&request).await.unwrap();
        assert_eq!(agent.stats().messages_processed(), 2);
    }

    #[tokio::test]
    async fn test_default_health_check() {
        let agent = NullAgent { stats: AgentStats::new() };
        let request = Envelope::new("noop", "caller", "null_agent", json!({}));
        agent.handle(&request).await.unwrap();

        let health = agent.health_check().await.unwrap();
        assert_eq!(health.agent_id, "null_agent");
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.capabilities, vec!["noop".to_string()]);
        assert_eq!(health.metrics["messages_processed"], 1.0);
        assert!(health.metrics["uptime_seconds"] >= 0.0);
    }
}
