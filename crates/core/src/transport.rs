//! Transport trait: the abstraction over the messaging gateway.
//!
//! The gateway is a local HTTP bridge to the messaging network. The relay
//! only ever needs the handful of operations below; every call is
//! fire-and-forget from the relay's point of view and any failure is fatal
//! for the request being processed.

use crate::error::TransportError;
use async_trait::async_trait;

/// Outbound operations against the messaging gateway.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Human-readable transport name (e.g., "waha").
    fn name(&self) -> &str;

    /// Send a text message to a chat.
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), TransportError>;

    /// Mark an inbound message as seen.
    async fn send_seen(
        &self,
        chat_id: &str,
        message_id: &str,
        participant: Option<&str>,
    ) -> Result<(), TransportError>;

    /// Show the "typing..." indicator in a chat.
    async fn start_typing(&self, chat_id: &str) -> Result<(), TransportError>;

    /// Hide the "typing..." indicator in a chat.
    async fn stop_typing(&self, chat_id: &str) -> Result<(), TransportError>;

    /// Download the bytes behind a media URL reported in a webhook.
    async fn fetch_media(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}
