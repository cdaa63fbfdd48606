//! OpenAI-compatible provider implementation.
//!
//! Works with OpenAI, OpenRouter, Ollama, vLLM, and any endpoint exposing
//! `/chat/completions` with function calling.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use zaprelay_config::AgentConfig;
use zaprelay_core::error::ProviderError;
use zaprelay_core::message::{Message, MessageToolCall, Role};
use zaprelay_core::provider::*;

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: http_client(Duration::from_secs(120)),
        }
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Build from the `[agent]` config section. Fails without an API key.
    pub fn from_config(config: &AgentConfig) -> Result<Self, ProviderError> {
        let key = config
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("agent.api_key is not set".into()))?;
        Ok(Self::new("openai", &config.api_url, key))
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                    Role::System => "system".into(),
                    Role::Tool => "tool".into(),
                },
                content: Some(m.content.clone()),
                tool_calls: if m.tool_calls.is_empty() {
                    None
                } else {
                    Some(
                        m.tool_calls
                            .iter()
                            .map(|tc| ApiToolCall {
                                id: tc.id.clone(),
                                r#type: "function".into(),
                                function: ApiFunction {
                                    name: tc.name.clone(),
                                    arguments: tc.arguments.clone(),
                                },
                            })
                            .collect(),
                    )
                },
                tool_call_id: m.tool_call_id.clone(),
            })
            .collect()
    }

    /// Convert tool definitions to OpenAI API format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }
}

pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// Map non-200 answers onto [`ProviderError`].
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status().as_u16();

    if status == 429 {
        return Err(ProviderError::RateLimited {
            retry_after_secs: 5,
        });
    }

    if status == 401 || status == 403 {
        return Err(ProviderError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        ));
    }

    if !(200..300).contains(&status) {
        let error_body = response.text().await.unwrap_or_default();
        warn!(status, body = %error_body, "Provider returned error");
        return Err(ProviderError::ApiError {
            status_code: status,
            message: error_body,
        });
    }

    Ok(response)
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
            body["tool_choice"] = serde_json::json!("auto");
        }

        debug!(provider = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let api_response: ApiResponse =
            check_status(response)
                .await?
                .json()
                .await
                .map_err(|e| ProviderError::ApiError {
                    status_code: 200,
                    message: format!("Failed to parse response: {e}"),
                })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ApiError {
                status_code: 200,
                message: "No choices in response".into(),
            })?;

        let mut message = Message::assistant(choice.message.content.unwrap_or_default());
        message.tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| MessageToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            message,
            usage,
            model: api_response.model,
        })
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    r#type: String,
    function: ApiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "gpt-4.1-mini".into(),
            messages: vec![Message::system("persona"), Message::user("oi")],
            temperature: 0.7,
            max_tokens: None,
            tools: vec![],
        }
    }

    #[test]
    fn message_conversion() {
        let mut call = Message::assistant("");
        call.tool_calls.push(MessageToolCall {
            id: "c1".into(),
            name: "weather_current".into(),
            arguments: r#"{"city":"Campinas"}"#.into(),
        });
        let messages = vec![Message::system("You are helpful"), call, Message::tool_result("c1", "22°C")];
        let api = OpenAiCompatProvider::to_api_messages(&messages);
        assert_eq!(api[0].role, "system");
        assert_eq!(api[1].tool_calls.as_ref().unwrap()[0].function.name, "weather_current");
        assert_eq!(api[2].role, "tool");
        assert_eq!(api[2].tool_call_id.as_deref(), Some("c1"));
    }

    #[test]
    fn tool_definition_conversion() {
        let tools = vec![ToolDefinition {
            name: "weather_current".into(),
            description: "Current weather".into(),
            parameters: serde_json::json!({"type": "object"}),
        }];
        let api_tools = OpenAiCompatProvider::to_api_tools(&tools);
        assert_eq!(api_tools.len(), 1);
        assert_eq!(api_tools[0].r#type, "function");
    }

    #[test]
    fn from_config_requires_key() {
        let config = AgentConfig::default();
        assert!(matches!(
            OpenAiCompatProvider::from_config(&config),
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn parses_text_completion() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async {
                Json(serde_json::json!({
                    "model": "gpt-4.1-mini",
                    "choices": [{ "message": { "role": "assistant", "content": "Tudo certo." } }],
                    "usage": { "prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13 }
                }))
            }),
        );
        let provider = OpenAiCompatProvider::new("test", serve(app).await, "sk-test");

        let response = provider.complete(request()).await.unwrap();
        assert_eq!(response.message.content, "Tudo certo.");
        assert_eq!(response.usage.unwrap().total_tokens, 13);
    }

    #[tokio::test]
    async fn parses_tool_calls() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async {
                Json(serde_json::json!({
                    "model": "gpt-4.1-mini",
                    "choices": [{ "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": { "name": "weather_current", "arguments": "{\"city\":\"Campinas\"}" }
                        }]
                    }}]
                }))
            }),
        );
        let provider = OpenAiCompatProvider::new("test", serve(app).await, "sk-test");

        let response = provider.complete(request()).await.unwrap();
        assert_eq!(response.message.content, "");
        assert_eq!(response.message.tool_calls.len(), 1);
        assert_eq!(response.message.tool_calls[0].id, "call_1");
    }

    #[tokio::test]
    async fn maps_error_statuses() {
        let app = Router::new()
            .route("/a/chat/completions", post(|| async { StatusCode::UNAUTHORIZED }))
            .route("/b/chat/completions", post(|| async { StatusCode::TOO_MANY_REQUESTS }))
            .route("/c/chat/completions", post(|| async { (StatusCode::BAD_GATEWAY, "upstream") }));
        let base = serve(app).await;

        let err = OpenAiCompatProvider::new("a", format!("{base}/a"), "k")
            .complete(request())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::AuthenticationFailed(_)));

        let err = OpenAiCompatProvider::new("b", format!("{base}/b"), "k")
            .complete(request())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited { .. }));

        let err = OpenAiCompatProvider::new("c", format!("{base}/c"), "k")
            .complete(request())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ApiError { status_code: 502, .. }));
    }
}
