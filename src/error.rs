//! Error types for the agentbus protocol.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Dispatch target is not registered on the bus. Surfaced to the
    /// caller directly: there is no agent to attribute an error
    /// envelope to.
    #[error("Unknown recipient: {0}")]
    UnknownRecipient(String),

    /// A bounded send expired before the recipient produced a reply.
    #[error("Request to {recipient} timed out (message {message_id})")]
    Timeout {
        recipient: String,
        message_id: String,
    },

    /// Envelope text failed to decode into the wire format.
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// A payload field the operation requires was absent.
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// The agent does not implement the requested message_type.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// An agent's handler failed; the bus converts this into an
    /// error-typed envelope rather than letting it escape dispatch.
    #[error("Agent {agent_id} error: {message}")]
    AgentFault { agent_id: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable classification tag, used as `error_type` in error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnknownRecipient(_) => "unknown_recipient",
            Error::Timeout { .. } => "timeout",
            Error::MalformedEnvelope(_) => "malformed_envelope",
            Error::MissingField(_) => "missing_field",
            Error::UnsupportedOperation(_) => "unsupported_operation",
            Error::AgentFault { .. } => "agent_fault",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
        }
    }
}
