//! WAHA gateway transport.
//!
//! Talks to a local WAHA (WhatsApp HTTP API) instance. Every operation is a
//! single HTTP call; non-2xx answers are reported as errors and never retried.
//!
//! Media URLs come from webhook bodies, so the API key is only sent to URLs
//! on the gateway's own origin, and downloads stop at a size limit.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};
use zaprelay_config::TransportConfig;
use zaprelay_core::error::TransportError;
use zaprelay_core::transport::Transport;

pub struct WahaTransport {
    base_url: String,
    session: String,
    api_key: Option<String>,
    max_media_bytes: usize,
    client: reqwest::Client,
}

/// Default download limit, WhatsApp's cap for voice notes and images.
pub const DEFAULT_MAX_MEDIA_BYTES: usize = 16 * 1024 * 1024;

impl std::fmt::Debug for WahaTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WahaTransport")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("max_media_bytes", &self.max_media_bytes)
            .finish()
    }
}

impl WahaTransport {
    pub fn new(
        base_url: impl Into<String>,
        session: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: session.into(),
            api_key,
            max_media_bytes: DEFAULT_MAX_MEDIA_BYTES,
            client,
        }
    }

    /// Refuse media downloads larger than `max` bytes.
    pub fn with_max_media_bytes(mut self, max: usize) -> Self {
        self.max_media_bytes = max;
        self
    }

    pub fn from_config(config: &TransportConfig) -> Self {
        Self::new(
            &config.base_url,
            &config.session,
            config.api_key.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn with_key(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("X-Api-Key", key),
            None => builder,
        }
    }

    fn on_gateway_origin(&self, url: &str) -> bool {
        match (reqwest::Url::parse(url), reqwest::Url::parse(&self.base_url)) {
            (Ok(target), Ok(base)) => target.origin() == base.origin(),
            _ => false,
        }
    }

    async fn post(&self, endpoint: &str, body: serde_json::Value) -> Result<(), TransportError> {
        let url = format!("{}{endpoint}", self.base_url);
        debug!(endpoint, "Gateway call");

        let response = self
            .with_key(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::RequestFailed {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::BadStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for WahaTransport {
    fn name(&self) -> &str {
        "waha"
    }

    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), TransportError> {
        self.post(
            "/api/sendText",
            json!({ "chatId": chat_id, "text": text, "session": self.session }),
        )
        .await
    }

    async fn send_seen(
        &self,
        chat_id: &str,
        message_id: &str,
        participant: Option<&str>,
    ) -> Result<(), TransportError> {
        self.post(
            "/api/sendSeen",
            json!({
                "session": self.session,
                "chatId": chat_id,
                "messageId": message_id,
                "participant": participant,
            }),
        )
        .await
    }

    async fn start_typing(&self, chat_id: &str) -> Result<(), TransportError> {
        self.post(
            "/api/startTyping",
            json!({ "session": self.session, "chatId": chat_id }),
        )
        .await
    }

    async fn stop_typing(&self, chat_id: &str) -> Result<(), TransportError> {
        self.post(
            "/api/stopTyping",
            json!({ "session": self.session, "chatId": chat_id }),
        )
        .await
    }

    async fn fetch_media(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let unavailable = |reason: String| TransportError::MediaUnavailable {
            url: url.to_string(),
            reason,
        };

        let request = self.client.get(url);
        let request = if self.on_gateway_origin(url) {
            self.with_key(request)
        } else {
            warn!(url, "Media URL is off the gateway origin, fetching without the API key");
            request
        };

        let mut response = request
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("HTTP {}", status.as_u16())));
        }

        let too_large = |size: u64| {
            unavailable(format!(
                "{size} bytes exceeds the {} byte limit",
                self.max_media_bytes
            ))
        };
        if let Some(declared) = response.content_length() {
            if declared > self.max_media_bytes as u64 {
                return Err(too_large(declared));
            }
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| unavailable(e.to_string()))?
        {
            if bytes.len() + chunk.len() > self.max_media_bytes {
                return Err(too_large((bytes.len() + chunk.len()) as u64));
            }
            bytes.extend_from_slice(&chunk);
        }
        debug!(url, size = bytes.len(), "Media downloaded");
        Ok(bytes)
    }
}
