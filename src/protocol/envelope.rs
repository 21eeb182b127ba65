//! Message envelopes with conversation and correlation IDs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

use super::types::PROTOCOL_VERSION;

/// Message envelope exchanged between agents.
///
/// Envelopes are value objects: once constructed they are never mutated
/// in place. A reply is always a freshly derived envelope (see
/// [`Envelope::reply`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    /// Wire compatibility marker ("1.0")
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
    /// Unique message ID (UUID v4)
    #[serde(default = "fresh_id")]
    pub message_id: String,
    /// Creation time (UTC, ISO-8601 on the wire)
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Sender agent ID
    pub sender: String,
    /// Recipient agent ID
    pub recipient: String,
    /// Request operation name, or a reserved tag (`response`, `error`)
    pub message_type: String,
    /// Open JSON payload; schema is agent- and operation-specific
    pub payload: Value,
    /// Groups a logical exchange; propagated to every reply
    #[serde(default = "fresh_id")]
    pub conversation_id: String,
    /// `message_id` of the request a reply answers
    #[serde(default)]
    pub correlation_id: Option<String>,
}

impl Envelope {
    /// Create a new envelope with fresh message and conversation IDs.
    pub fn new(
        message_type: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            message_id: fresh_id(),
            timestamp: Utc::now(),
            sender: sender.into(),
            recipient: recipient.into(),
            message_type: message_type.into(),
            payload,
            conversation_id: fresh_id(),
            correlation_id: None,
        }
    }

    /// Pin the message ID instead of the generated one.
    pub fn with_message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = id.into();
        self
    }

    /// Join an existing conversation instead of starting a new one.
    pub fn with_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = id.into();
        self
    }

    /// Set the correlation ID for a reply.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Derive a reply envelope addressed back to this envelope's sender.
    ///
    /// Threads `conversation_id` and sets `correlation_id` to this
    /// envelope's `message_id`.
    pub fn reply(
        &self,
        message_type: impl Into<String>,
        sender: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self::new(message_type, sender, self.sender.clone(), payload)
            .with_conversation_id(self.conversation_id.clone())
            .with_correlation_id(self.message_id.clone())
    }

    /// Check whether this envelope carries the reserved error tag.
    pub fn is_error(&self) -> bool {
        self.message_type == super::types::MESSAGE_TYPE_ERROR
    }

    /// Encode to the JSON wire format.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from the JSON wire format.
    ///
    /// `message_type`, `sender`, `recipient`, and `payload` are required;
    /// every other field is defaulted (fresh IDs, current time).
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::MalformedEnvelope(e.to_string()))
    }
}

fn fresh_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_protocol_version() -> String {
    PROTOCOL_VERSION.to_string()
}
