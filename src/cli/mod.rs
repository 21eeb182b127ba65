//! CLI commands for agentbus using clap.
//!
//! The CLI is the composition root: it constructs the bus, registers
//! the orchestrator and the mock collaborator agents, and drives them
//! over the same dispatch path library users take.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use crate::agents::MockAgent;
use crate::bus::MessageBus;
use crate::config::load_settings_or_default;
use crate::orchestrator::{OrchestratorAgent, ORCHESTRATOR_ID};
use crate::protocol::Envelope;

/// agentbus - message bus and agent protocol for a multi-agent scheduler.
#[derive(Parser)]
#[command(name = "agentbus")]
#[command(version = "0.1.0")]
#[command(about = "Message bus and agent protocol for a multi-agent scheduler", long_about = None)]
pub struct Commands {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Aggregate health report from every registered agent
    Health,

    /// List registered agents and their capabilities
    Agents,

    /// Send a message to an agent and print the reply envelope
    Send {
        /// Recipient agent ID
        recipient: String,

        /// Operation name (message_type)
        message_type: String,

        /// Request payload as JSON
        #[arg(long, default_value = "{}")]
        payload: String,

        /// Sender ID stamped on the envelope
        #[arg(long, default_value = "cli")]
        sender: String,

        /// Timeout in seconds (default: settings.message_timeout_secs)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Decode an envelope from JSON text and echo it back
    Inspect {
        /// Envelope JSON
        json: String,
    },
}

impl Commands {
    /// Run the command.
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Command::Health => cmd_health().await,
            Command::Agents => cmd_agents().await,
            Command::Send {
                recipient,
                message_type,
                payload,
                sender,
                timeout,
            } => cmd_send(recipient, message_type, payload, sender, timeout).await,
            Command::Inspect { json } => cmd_inspect(json),
        }
    }
}

/// Build the demo bus: orchestrator plus mock stand-ins for the external
/// collaborator agents.
fn build_demo_bus() -> Arc<MessageBus> {
    let bus = Arc::new(MessageBus::new());

    let orchestrator = OrchestratorAgent::new(&bus);
    bus.register(ORCHESTRATOR_ID, Arc::new(orchestrator));

    bus.register(
        "parsing_agent",
        Arc::new(MockAgent::new("parsing_agent").with_canned_response(
            "parse_file",
            json!({"status": "completed", "events": [], "events_found": 0}),
        )),
    );

    bus.register(
        "calendar_agent",
        Arc::new(
            MockAgent::new("calendar_agent")
                .with_canned_response(
                    "create_events",
                    json!({"created_count": 0, "created_events": []}),
                )
                .with_canned_response("list_events", json!({"events": [], "count": 0})),
        ),
    );

    bus
}

// Command implementations

async fn cmd_health() -> Result<()> {
    let settings = load_settings_or_default();
    let bus = build_demo_bus();

    let response = bus
        .send_with_timeout(
            ORCHESTRATOR_ID,
            "health_check",
            json!({}),
            "cli",
            settings.message_timeout(),
        )
        .await?;

    println!("{}", serde_json::to_string_pretty(&response.payload)?);
    Ok(())
}

async fn cmd_agents() -> Result<()> {
    let settings = load_settings_or_default();
    let bus = build_demo_bus();

    let response = bus
        .send_with_timeout(
            ORCHESTRATOR_ID,
            "list_agents",
            json!({}),
            "cli",
            settings.message_timeout(),
        )
        .await?;

    println!("{}", serde_json::to_string_pretty(&response.payload)?);
    Ok(())
}

async fn cmd_send(
    recipient: &str,
    message_type: &str,
    payload: &str,
    sender: &str,
    timeout: &Option<u64>,
) -> Result<()> {
    let settings = load_settings_or_default();
    let payload: serde_json::Value =
        serde_json::from_str(payload).context("payload is not valid JSON")?;
    let timeout = timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| settings.message_timeout());

    let bus = build_demo_bus();
    let response = bus
        .send_with_timeout(recipient, message_type, payload, sender, timeout)
        .await?;

    println!("{}", response.to_json()?);
    Ok(())
}

fn cmd_inspect(json: &str) -> Result<()> {
    let envelope = Envelope::from_json(json)?;
    println!("{}", envelope.to_json()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_bus_wiring() {
        let bus = build_demo_bus();
        assert_eq!(
            bus.registered_ids(),
            vec![
                "calendar_agent".to_string(),
                "orchestrator".to_string(),
                "parsing_agent".to_string()
            ]
        );

        let response = bus
            .dispatch(Envelope::new("list_agents", "cli", ORCHESTRATOR_ID, json!({})))
            .await
            .unwrap();
        assert_eq!(response.payload["data"]["total_count"], 3);
    }

    #[tokio::test]
    async fn test_demo_bus_collaborators_answer_canned() {
        let bus = build_demo_bus();

        let response = bus
            .dispatch(Envelope::new(
                "create_events",
                "cli",
                "calendar_agent",
                json!({"events": []}),
            ))
            .await
            .unwrap();
        assert_eq!(response.payload["data"]["created_count"], 0);
    }
}
