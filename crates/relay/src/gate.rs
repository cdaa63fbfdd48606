//! Dispatch gate: decides whether an event is answered, refused, or dropped.
//!
//! Checks run in a fixed order and stop at the first hit:
//!
//! 1. duplicate delivery
//! 2. self-echo (text starts with the reply marker)
//! 3. own message (sender is the gateway account)
//! 4. authorization and toggles, then empty text
//!
//! Steps 1 to 3 are [`DispatchGate::screen`]; step 4 is
//! [`DispatchGate::judge`]. The pipeline only consults the policy store once
//! screening passes.

use zaprelay_config::DispatchConfig;
use zaprelay_policy::Authorization;

/// Why an event was dropped without a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    Duplicate,
    SelfEcho,
    OwnMessage,
}

impl SuppressReason {
    /// Reason string returned in the webhook body.
    pub fn motivo(&self) -> &'static str {
        match self {
            Self::Duplicate => "mensagem duplicada",
            Self::SelfEcho => "mensagem do próprio bot",
            Self::OwnMessage => "mensagem própria",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Drop silently: no log, no reply
    Suppressed(SuppressReason),
    /// Log the text as the response, never send it
    Declined(String),
    Proceed,
}

/// Everything the gate looks at for one event.
#[derive(Debug, Clone)]
pub struct GateInput<'a> {
    pub duplicate: bool,
    /// Resolved text (transcript or caption for media)
    pub text: &'a str,
    pub sender_id: &'a str,
    pub own_id: &'a str,
    pub authorization: Authorization,
}

/// Authorized, replies on, group allowed, and something to answer.
pub fn should_respond(authorization: &Authorization, text: &str) -> bool {
    authorization.allows_reply() && !text.trim().is_empty()
}

#[derive(Debug, Clone)]
pub struct DispatchGate {
    reply_marker: String,
    refusal_text: String,
    empty_text_notice: String,
}

impl DispatchGate {
    pub fn new(
        reply_marker: impl Into<String>,
        refusal_text: impl Into<String>,
        empty_text_notice: impl Into<String>,
    ) -> Self {
        Self {
            reply_marker: reply_marker.into(),
            refusal_text: refusal_text.into(),
            empty_text_notice: empty_text_notice.into(),
        }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(
            &config.reply_marker,
            &config.refusal_text,
            &config.empty_text_notice,
        )
    }

    pub fn reply_marker(&self) -> &str {
        &self.reply_marker
    }

    /// Checks that need no policy lookup.
    pub fn screen(&self, duplicate: bool, text: &str, sender_id: &str, own_id: &str) -> Option<SuppressReason> {
        if duplicate {
            return Some(SuppressReason::Duplicate);
        }
        if !self.reply_marker.is_empty() && text.trim_start().starts_with(&self.reply_marker) {
            return Some(SuppressReason::SelfEcho);
        }
        // The gateway does not always report its own id.
        if !own_id.is_empty() && sender_id == own_id {
            return Some(SuppressReason::OwnMessage);
        }
        None
    }

    /// Policy outcome for an event that passed screening.
    pub fn judge(&self, authorization: &Authorization, text: &str) -> Decision {
        if !authorization.allows_reply() {
            return Decision::Declined(self.refusal_text.clone());
        }
        if text.trim().is_empty() {
            return Decision::Declined(self.empty_text_notice.clone());
        }
        Decision::Proceed
    }

    pub fn decide(&self, input: &GateInput<'_>) -> Decision {
        match self.screen(input.duplicate, input.text, input.sender_id, input.own_id) {
            Some(reason) => Decision::Suppressed(reason),
            None => self.judge(&input.authorization, input.text),
        }
    }
}
