//! Image captioning through a vision-capable chat model.
//!
//! The image travels inline as a base64 `data:` URL next to the directive,
//! so nothing has to be publicly reachable.

use crate::openai_compat::{check_status, http_client};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use zaprelay_core::error::MediaError;
use zaprelay_core::media::Captioner;

#[derive(Clone)]
pub struct VisionCaptioner {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for VisionCaptioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionCaptioner")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

impl VisionCaptioner {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: http_client(Duration::from_secs(120)),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn image_part(mime_type: &str, bytes: &[u8]) -> serde_json::Value {
        let data_url = format!("data:{mime_type};base64,{}", STANDARD.encode(bytes));
        serde_json::json!({
            "type": "image_url",
            "image_url": { "url": data_url },
        })
    }
}

#[async_trait]
impl Captioner for VisionCaptioner {
    async fn caption(&self, path: &Path, mime_type: &str, directive: &str) -> Result<String, MediaError> {
        let mime = mime_type.split(';').next().unwrap_or_default().trim();
        // Vision models only read still images.
        if !mime.starts_with("image/") {
            return Err(MediaError::Captioning(format!("unsupported media type '{mime_type}'")));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| MediaError::TempFile(e.to_string()))?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": directive },
                    Self::image_part(mime, &bytes),
                ],
            }],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MediaError::Captioning(e.to_string()))?;

        let parsed: CaptionResponse = check_status(response)
            .await
            .map_err(|e| MediaError::Captioning(e.to_string()))?
            .json()
            .await
            .map_err(|e| MediaError::Captioning(format!("Failed to parse response: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| MediaError::Captioning("empty caption".into()))?;

        debug!(model = %self.model, chars = text.len(), "Image captioned");
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
struct CaptionResponse {
    choices: Vec<CaptionChoice>,
}

#[derive(Debug, Deserialize)]
struct CaptionChoice {
    message: CaptionMessage,
}

#[derive(Debug, Deserialize)]
struct CaptionMessage {
    #[serde(default)]
    content: Option<String>,
}
