//! Whisper-compatible speech-to-text.
//!
//! Uploads the audio file as multipart form data to
//! `{base}/audio/transcriptions` and returns the trimmed transcript.

use crate::openai_compat::{check_status, http_client};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use zaprelay_core::error::MediaError;
use zaprelay_core::media::Transcriber;

#[derive(Clone)]
pub struct WhisperTranscriber {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for WhisperTranscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperTranscriber")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

impl WhisperTranscriber {
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
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, path: &Path, mime_type: &str) -> Result<String, MediaError> {
        let audio = tokio::fs::read(path)
            .await
            .map_err(|e| MediaError::TempFile(e.to_string()))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.ogg".into());
        // Strip codec parameters such as `; codecs=opus`.
        let mime = mime_type.split(';').next().unwrap_or_default().trim();
        let mime = if mime.is_empty() { "audio/ogg" } else { mime };

        let part = Part::bytes(audio)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|e| MediaError::Transcription(e.to_string()))?;
        let form = Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("temperature", "0");

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Transcription(e.to_string()))?;

        let parsed: TranscriptionResponse = check_status(response)
            .await
            .map_err(|e| MediaError::Transcription(e.to_string()))?
            .json()
            .await
            .map_err(|e| MediaError::Transcription(format!("Failed to parse response: {e}")))?;

        let text = parsed.text.trim().to_string();
        debug!(model = %self.model, chars = text.len(), "Audio transcribed");
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}
