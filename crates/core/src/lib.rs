//! # ZapRelay Core
//!
//! Domain types, traits, and error definitions for the ZapRelay message relay.
//! This crate has **no framework dependencies**: it defines the domain model
//! that every other crate implements against.
//!
//! ## Seams
//!
//! Every external collaborator is a trait here, with implementations living
//! in their own crates:
//! - [`Transport`]: the messaging gateway (send, mark seen, typing, media fetch)
//! - [`Transcriber`] / [`Captioner`]: opaque media-to-text services
//! - [`Provider`]: an LLM chat-completions backend
//! - [`Orchestrator`]: the reasoning agent, text in, text out
//! - [`Tool`]: capabilities the agent may invoke

pub mod error;
pub mod inbound;
pub mod media;
pub mod message;
pub mod orchestrator;
pub mod provider;
pub mod tool;
pub mod transport;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use error::{
    Error, LogError, MediaError, OrchestratorError, ProviderError, Result, ToolError,
    TransportError,
};
pub use inbound::InboundEvent;
pub use media::{Captioner, MediaDescriptor, MediaKind, Transcriber};
pub use message::{Message, MessageToolCall, Role};
pub use orchestrator::{Orchestrator, OrchestratorRequest};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use tool::{Tool, ToolRegistry};
pub use transport::Transport;
pub use turn::{ConversationTurn, TurnRole, TIMESTAMP_FORMAT};
