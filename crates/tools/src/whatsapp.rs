//! Send a WhatsApp message to an arbitrary number through the gateway.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use zaprelay_core::error::ToolError;
use zaprelay_core::tool::Tool;
use zaprelay_core::transport::Transport;

pub struct SendWhatsAppTool {
    transport: Arc<dyn Transport>,
}

impl SendWhatsAppTool {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

/// Digits only, then the personal-chat suffix. Accepts `+55 (19) 9...` and
/// ids that already carry `@c.us`.
fn chat_id_for(number: &str) -> Option<String> {
    let bare = number.split('@').next().unwrap_or(number);
    let digits: String = bare.chars().filter(char::is_ascii_digit).collect();
    (digits.len() >= 8).then(|| format!("{digits}@c.us"))
}

#[async_trait]
impl Tool for SendWhatsAppTool {
    fn name(&self) -> &str {
        "send_whatsapp"
    }

    fn description(&self) -> &str {
        "Send a WhatsApp text message to a phone number (international format, digits only)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "Text to send"
                },
                "number": {
                    "type": "string",
                    "description": "Recipient phone number with country code, e.g. 5519999999999"
                }
            },
            "required": ["message", "number"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let message = arguments["message"]
            .as_str()
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'message' argument".into()))?;
        let number = arguments["number"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'number' argument".into()))?;
        let chat_id = chat_id_for(number)
            .ok_or_else(|| ToolError::InvalidArguments(format!("Invalid phone number '{number}'")))?;

        self.transport
            .send_text(&chat_id, message)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().to_string(),
                reason: e.to_string(),
            })?;

        info!(chat_id = %chat_id, "Agent sent WhatsApp message");
        Ok(format!("Mensagem enviada para {chat_id}."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use zaprelay_core::error::TransportError;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        fn name(&self) -> &str {
            "recording"
        }
        async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), TransportError> {
            if self.fail {
                return Err(TransportError::BadStatus {
                    endpoint: "/api/sendText".into(),
                    status: 500,
                });
            }
            self.sent.lock().unwrap().push((chat_id.into(), text.into()));
            Ok(())
        }
        async fn send_seen(&self, _: &str, _: &str, _: Option<&str>) -> Result<(), TransportError> {
            Ok(())
        }
        async fn start_typing(&self, _: &str) -> Result<(), TransportError> {
            Ok(())
        }
        async fn stop_typing(&self, _: &str) -> Result<(), TransportError> {
            Ok(())
        }
        async fn fetch_media(&self, _: &str) -> Result<Vec<u8>, TransportError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn normalizes_numbers() {
        assert_eq!(chat_id_for("+55 (19) 99999-0000").as_deref(), Some("5519999990000@c.us"));
        assert_eq!(chat_id_for("5519999990000@c.us").as_deref(), Some("5519999990000@c.us"));
        assert_eq!(chat_id_for("abc"), None);
    }

    #[tokio::test]
    async fn sends_through_transport() {
        let transport = Arc::new(RecordingTransport::default());
        let tool = SendWhatsAppTool::new(transport.clone());
        let result = tool
            .execute(serde_json::json!({ "message": "chego às 18h", "number": "5519999990000" }))
            .await
            .unwrap();

        assert_eq!(result, "Mensagem enviada para 5519999990000@c.us.");
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0], ("5519999990000@c.us".to_string(), "chego às 18h".to_string()));
    }

    #[tokio::test]
    async fn transport_failure_is_execution_error() {
        let transport = Arc::new(RecordingTransport { fail: true, ..Default::default() });
        let err = SendWhatsAppTool::new(transport)
            .execute(serde_json::json!({ "message": "oi", "number": "5519999990000" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }

    #[tokio::test]
    async fn empty_message_rejected() {
        let tool = SendWhatsAppTool::new(Arc::new(RecordingTransport::default()));
        let err = tool
            .execute(serde_json::json!({ "message": "  ", "number": "5519999990000" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
