//! Inbound webhook parsing.
//!
//! Turns the gateway's `message.any` JSON envelope into an [`InboundEvent`].
//! Optionally validates an HMAC signature over the raw body.

use chrono::NaiveDateTime;
use serde::Deserialize;
use zaprelay_core::inbound::InboundEvent;
use zaprelay_core::media::{MediaDescriptor, MediaKind};

/// The only event type the relay reacts to.
pub const MESSAGE_EVENT: &str = "message.any";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("Unknown event {0}")]
    UnknownEvent(String),

    #[error("Malformed webhook body: {0}")]
    Malformed(String),
}

/// Top-level webhook body.
#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(default)]
    pub event: Option<String>,

    #[serde(default)]
    pub payload: Option<WahaPayload>,

    #[serde(default)]
    pub me: Option<WahaMe>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WahaPayload {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub from: Option<String>,

    #[serde(default)]
    pub participant: Option<String>,

    #[serde(default)]
    pub body: Option<String>,

    #[serde(default)]
    pub has_media: bool,

    #[serde(default)]
    pub media: Option<WahaMedia>,

    #[serde(default)]
    pub to: Option<String>,

    #[serde(rename = "_data", default)]
    pub data: WahaData,
}

#[derive(Debug, Deserialize)]
pub struct WahaMedia {
    #[serde(default)]
    pub mimetype: Option<String>,

    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WahaData {
    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub notify_name: Option<String>,

    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WahaMe {
    #[serde(default)]
    pub id: Option<String>,
}

impl WebhookEnvelope {
    pub fn parse(body: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(body).map_err(|e| WebhookError::Malformed(e.to_string()))
    }

    /// Validate the event type and normalise the payload.
    ///
    /// `unknown_sender` is used when the gateway reports no display name.
    pub fn into_inbound(
        self,
        received_at: NaiveDateTime,
        unknown_sender: &str,
    ) -> Result<InboundEvent, WebhookError> {
        let event = self.event.unwrap_or_default();
        if event != MESSAGE_EVENT {
            return Err(WebhookError::UnknownEvent(event));
        }

        let payload = self
            .payload
            .ok_or_else(|| WebhookError::Malformed("missing payload".into()))?;
        let event_id = payload
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| WebhookError::Malformed("missing payload.id".into()))?;
        let chat_id = payload
            .from
            .filter(|from| !from.is_empty())
            .ok_or_else(|| WebhookError::Malformed("missing payload.from".into()))?;

        let participant = payload
            .participant
            .or(payload.data.author)
            .filter(|p| !p.is_empty());
        let is_group = chat_id.ends_with("@g.us") && participant.is_some();
        let sender_id = match (&participant, is_group) {
            (Some(p), true) => InboundEvent::bare_id(p),
            _ => InboundEvent::bare_id(&chat_id),
        }
        .to_string();

        let message_type = payload.data.kind.unwrap_or_default();
        let media = if payload.has_media {
            payload.media.and_then(|m| {
                let url = m.url.filter(|u| !u.is_empty())?;
                let mime_type = m.mimetype.unwrap_or_default();
                let kind = MediaKind::classify(&mime_type, &message_type);
                Some(MediaDescriptor { mime_type, url, kind })
            })
        } else {
            None
        };

        let own_id = self
            .me
            .and_then(|me| me.id)
            .map(|id| InboundEvent::bare_id(&id).to_string())
            .unwrap_or_default();

        Ok(InboundEvent {
            event_id,
            chat_id,
            is_group,
            participant,
            sender_id,
            sender_display_name: payload
                .data
                .notify_name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| unknown_sender.to_string()),
            raw_text: payload.body.unwrap_or_default(),
            media,
            message_type,
            to: payload.to.unwrap_or_default(),
            own_id,
            timestamp: received_at,
        })
    }
}

/// HMAC-SHA512 check of the raw body against a shared secret.
#[derive(Clone, Default)]
pub struct SignatureVerifier {
    secret: Option<String>,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl SignatureVerifier {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Validate a hex-encoded HMAC-SHA512 digest, optionally prefixed
    /// `sha512=`. Always true when no secret is configured.
    ///
    /// Uses constant-time comparison.
    pub fn verify(&self, payload: &[u8], signature: Option<&str>) -> bool {
        use hmac::{Hmac, Mac};
        use sha2::Sha512;

        let Some(secret) = &self.secret else {
            return true;
        };
        let Some(signature) = signature else {
            return false;
        };

        let sig_hex = signature.trim();
        let sig_hex = sig_hex.strip_prefix("sha512=").unwrap_or(sig_hex);
        let Ok(provided) = hex::decode(sig_hex) else {
            return false;
        };

        let Ok(mut mac) = Hmac::<Sha512>::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(payload);
        mac.verify_slice(&provided).is_ok()
    }
}
