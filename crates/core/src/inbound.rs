//! Inbound chat events, normalised from the gateway webhook.

use crate::media::MediaDescriptor;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One inbound delivery from the messaging gateway.
///
/// `sender_id` is always a bare id (the part before `@`): derived from the
/// participant in group chats and from the chat id otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Gateway-assigned unique id of this delivery
    pub event_id: String,

    /// Full chat id (e.g. `5511999@c.us` or `1203...@g.us`)
    pub chat_id: String,

    pub is_group: bool,

    /// Raw participant id in group chats
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,

    pub sender_id: String,

    pub sender_display_name: String,

    pub raw_text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaDescriptor>,

    /// Gateway message type (`chat`, `ptt`, `image`, ...)
    pub message_type: String,

    /// Recipient as reported by the gateway
    pub to: String,

    /// Bare id of the account the gateway is logged in as
    pub own_id: String,

    /// Local receipt time
    pub timestamp: NaiveDateTime,
}

impl InboundEvent {
    /// Strip the `@server` suffix from a gateway id.
    pub fn bare_id(raw: &str) -> &str {
        raw.split('@').next().unwrap_or(raw)
    }
}
