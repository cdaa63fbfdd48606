//! Orchestrator trait: the single capability the relay needs from the
//! reasoning agent.
//!
//! The relay formats the directive and the message; the implementation owns
//! the model, the tool wiring, and however many internal steps it takes to
//! reach one final answer.

use crate::error::OrchestratorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Input for one agent run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorRequest {
    /// Persona directive, recent history, and closing instruction
    pub instructions: String,

    /// The message to answer
    pub message: String,

    /// Display name of the sender, for tracing
    pub sender_name: String,
}

#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Run the agent to completion and return its final text.
    async fn orchestrate(&self, request: OrchestratorRequest)
    -> Result<String, OrchestratorError>;
}
