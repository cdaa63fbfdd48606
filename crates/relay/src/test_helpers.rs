//! Shared mock collaborators for relay unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use zaprelay_core::error::{MediaError, OrchestratorError, ProviderError, TransportError};
use zaprelay_core::media::{Captioner, Transcriber};
use zaprelay_core::orchestrator::{Orchestrator, OrchestratorRequest};
use zaprelay_core::transport::Transport;

/// Records every gateway call as a short string, in order.
#[derive(Default)]
pub(crate) struct MockTransport {
    pub calls: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<(String, String)>>,
    /// Media bytes by URL; anything else is a 404
    pub media: Mutex<HashMap<String, Vec<u8>>>,
    pub fail_send: bool,
}

impl MockTransport {
    pub fn with_media(url: &str, bytes: &[u8]) -> Self {
        let transport = Self::default();
        transport.media.lock().unwrap().insert(url.into(), bytes.to_vec());
        transport
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push("send".into());
        if self.fail_send {
            return Err(TransportError::BadStatus {
                endpoint: "/api/sendText".into(),
                status: 502,
            });
        }
        self.sent.lock().unwrap().push((chat_id.into(), text.into()));
        Ok(())
    }

    async fn send_seen(&self, _: &str, message_id: &str, _: Option<&str>) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(format!("seen:{message_id}"));
        Ok(())
    }

    async fn start_typing(&self, _: &str) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push("typing:start".into());
        Ok(())
    }

    async fn stop_typing(&self, _: &str) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push("typing:stop".into());
        Ok(())
    }

    async fn fetch_media(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.calls.lock().unwrap().push(format!("fetch:{url}"));
        self.media
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::MediaUnavailable {
                url: url.into(),
                reason: "404 Not Found".into(),
            })
    }
}

/// Answers with a fixed reply, or fails, and keeps every request.
pub(crate) struct MockOrchestrator {
    pub reply: Option<String>,
    pub delay: Option<Duration>,
    pub requests: Mutex<Vec<OrchestratorRequest>>,
}

impl MockOrchestrator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.into()),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<OrchestratorRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Orchestrator for MockOrchestrator {
    async fn orchestrate(&self, request: OrchestratorRequest) -> Result<String, OrchestratorError> {
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone().ok_or_else(|| {
            OrchestratorError::Provider(ProviderError::ApiError {
                status_code: 500,
                message: "boom".into(),
            })
        })
    }
}

/// Echoes the file contents back, prefixed, so tests can see what was written.
pub(crate) struct EchoTranscriber {
    pub fail: bool,
}

#[async_trait]
impl Transcriber for EchoTranscriber {
    async fn transcribe(&self, path: &Path, _: &str) -> Result<String, MediaError> {
        if self.fail {
            return Err(MediaError::Transcription("service down".into()));
        }
        let bytes = std::fs::read(path).map_err(|e| MediaError::TempFile(e.to_string()))?;
        Ok(format!("transcrito: {}", String::from_utf8_lossy(&bytes)))
    }
}

/// Records the temp paths it was handed.
#[derive(Default)]
pub(crate) struct RecordingCaptioner {
    pub paths: Mutex<Vec<std::path::PathBuf>>,
}

#[async_trait]
impl Captioner for RecordingCaptioner {
    async fn caption(&self, path: &Path, mime_type: &str, directive: &str) -> Result<String, MediaError> {
        self.paths.lock().unwrap().push(path.to_path_buf());
        if !mime_type.starts_with("image/") {
            return Err(MediaError::Captioning(format!("unsupported media type '{mime_type}'")));
        }
        Ok(format!("legenda ({} chars de diretiva)", directive.chars().count()))
    }
}
