//! Capabilities the reasoning agent may call while composing a WhatsApp reply.
//!
//! The relay itself never runs a tool. They are invoked only by the agent
//! loop, when the model answers with a tool call instead of text; whatever a
//! tool returns is fed back to the model as the call's result.

use crate::error::ToolError;
use crate::message::MessageToolCall;
use crate::provider::ToolDefinition;
use async_trait::async_trait;
use std::collections::BTreeMap;

#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model calls the tool by, e.g. `weather_current`.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the arguments object.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Run once with the model's arguments. The text is handed back to the
    /// model verbatim, so it should read as a sentence, not as data.
    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError>;
}

/// Tools offered to the model, keyed by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A later tool with the same name replaces the earlier one.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Definitions in name order, so requests are stable across runs.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool call exactly as the model sent it.
    ///
    /// Arguments arrive as a JSON string; an empty string means no arguments.
    pub async fn invoke(&self, call: &MessageToolCall) -> Result<String, ToolError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;

        let arguments = if call.arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&call.arguments).map_err(|e| {
                ToolError::InvalidArguments(format!("arguments are not valid JSON: {e}"))
            })?
        };

        tool.execute(arguments).await
    }
}
