//! WhatsApp gateway plumbing for ZapRelay.
//!
//! - **WAHA transport**: outbound send / seen / typing / media download
//! - **Webhook**: inbound envelope parsing and HMAC signature validation

pub mod waha;
pub mod webhook;

pub use waha::WahaTransport;
pub use webhook::{MESSAGE_EVENT, SignatureVerifier, WebhookEnvelope, WebhookError};
