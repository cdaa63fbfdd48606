//! The agent reasoning loop implementation.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};
use zaprelay_config::AgentConfig;
use zaprelay_core::error::OrchestratorError;
use zaprelay_core::message::Message;
use zaprelay_core::orchestrator::{Orchestrator, OrchestratorRequest};
use zaprelay_core::provider::{Provider, ProviderRequest};
use zaprelay_core::tool::ToolRegistry;

/// The agent loop that orchestrates LLM calls and tool execution.
pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Default max tokens per response
    max_tokens: Option<u32>,

    /// Tool registry
    tools: Arc<ToolRegistry>,

    /// Maximum tool call iterations per run
    max_iterations: u32,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
            tools,
            max_iterations: 8,
        }
    }

    /// Build from the `[agent]` config section.
    pub fn from_config(
        config: &AgentConfig,
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        let agent = Self::new(provider, &config.model, config.temperature, tools)
            .with_max_iterations(config.max_iterations);
        match config.max_tokens {
            Some(max) => agent.with_max_tokens(max),
            None => agent,
        }
    }

    /// Set the maximum number of tool call iterations.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the default max tokens per LLM response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Run tool calls in order, appending one result message per call.
    ///
    /// Tool failures are reported back to the model so it can recover.
    async fn run_tools(&self, messages: &mut Vec<Message>, assistant: Message) {
        let calls = assistant.tool_calls.clone();
        messages.push(assistant);

        for call in &calls {
            let start = std::time::Instant::now();
            let result = self.tools.invoke(call).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let content = match result {
                Ok(output) => {
                    debug!(tool = %call.name, duration_ms, "Tool executed");
                    output
                }
                Err(e) => {
                    warn!(tool = %call.name, error = %e, duration_ms, "Tool execution failed");
                    format!("Error: {e}")
                }
            };
            messages.push(Message::tool_result(&call.id, content));
        }
    }
}

#[async_trait]
impl Orchestrator for AgentLoop {
    /// Drive the model until it answers in plain text.
    async fn orchestrate(&self, request: OrchestratorRequest) -> Result<String, OrchestratorError> {
        info!(sender = %request.sender_name, model = %self.model, "Agent run started");

        let mut messages = vec![
            Message::system(request.instructions),
            Message::user(request.message),
        ];
        let tool_definitions = self.tools.definitions();

        for iteration in 1..=self.max_iterations {
            debug!(iteration, messages = messages.len(), "Agent loop iteration");

            let response = self
                .provider
                .complete(ProviderRequest {
                    model: self.model.clone(),
                    messages: messages.clone(),
                    temperature: self.temperature,
                    max_tokens: self.max_tokens,
                    tools: tool_definitions.clone(),
                })
                .await?;

            if let Some(usage) = &response.usage {
                debug!(model = %response.model, tokens = usage.total_tokens, "Completion received");
            }

            if response.message.tool_calls.is_empty() {
                let text = response.message.content.trim().to_string();
                if text.is_empty() {
                    return Err(OrchestratorError::MalformedOutput(
                        "model returned an empty answer".into(),
                    ));
                }
                info!(iterations = iteration, chars = text.len(), "Agent run finished");
                return Ok(text);
            }

            debug!(tool_count = response.message.tool_calls.len(), "Executing tool calls");
            self.run_tools(&mut messages, response.message).await;
        }

        warn!(max = self.max_iterations, "Max tool iterations reached without an answer");
        Err(OrchestratorError::MalformedOutput(format!(
            "no answer after {} tool iterations",
            self.max_iterations
        )))
    }
}
