//! agentbus library root.

pub mod agent;
pub mod agents;
pub mod bus;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod protocol;

pub use agent::{Agent, AgentStats};
pub use agents::MockAgent;
pub use bus::MessageBus;
pub use config::{load_settings, load_settings_or_default, Settings};
pub use error::{Error, Result};
pub use orchestrator::{OrchestratorAgent, ORCHESTRATOR_ID};
pub use protocol::{
    AgentHealth, Envelope, HealthStatus, MESSAGE_TYPE_ERROR, MESSAGE_TYPE_RESPONSE,
    PROTOCOL_VERSION,
};
