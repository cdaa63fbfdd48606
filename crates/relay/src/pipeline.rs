//! The relay: one inbound event in, exactly one outcome out.
//!
//! Flow per event:
//!
//! ```text
//! dedup ─▶ media (first delivery only) ─▶ screen ─▶ policy ─▶ judge
//!                                           │                  │
//!                                       Suppressed      Declined ─▶ log
//!                                                        Proceed ─▶ history ─▶ agent ─▶ deliver
//! ```

use crate::bridge::OrchestratorBridge;
use crate::dedup::DuplicateFilter;
use crate::delivery::Delivery;
use crate::gate::{Decision, DispatchGate};
use crate::media::MediaResolver;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use zaprelay_config::AppConfig;
use zaprelay_core::inbound::InboundEvent;
use zaprelay_core::media::{Captioner, Transcriber};
use zaprelay_core::orchestrator::Orchestrator;
use zaprelay_core::transport::Transport;
use zaprelay_core::turn::ConversationTurn;
use zaprelay_memory::{ConversationLog, HistoryAssembler};
use zaprelay_policy::{PolicyError, PolicyStore};

/// Reason reported when an attachment could not be turned into text.
pub const MEDIA_FAILURE_MOTIVO: &str = "falha ao processar mídia";

/// The external services the relay talks to.
pub struct Collaborators {
    pub transport: Arc<dyn Transport>,
    pub orchestrator: Arc<dyn Orchestrator>,
    pub transcriber: Arc<dyn Transcriber>,
    pub captioner: Arc<dyn Captioner>,
}

/// What happened to one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Dropped without logging
    Ignored { motivo: String },
    /// Refused; the text was logged, not sent
    Declined { text: String },
    Replied { text: String, chat_id: String },
    /// The gateway or the log failed mid-delivery
    Failed { error: String },
}

impl Outcome {
    /// Webhook response body.
    pub fn body(&self) -> serde_json::Value {
        match self {
            Self::Ignored { motivo } => json!({ "status": "ignorado", "motivo": motivo }),
            Self::Declined { text } => json!({
                "status": "ok",
                "resposta": text,
                "whatsapp": { "status": "ok", "detail": text },
            }),
            Self::Replied { text, chat_id } => json!({
                "status": "ok",
                "resposta": text,
                "whatsapp": { "status": "sent", "chatId": chat_id },
            }),
            Self::Failed { error } => json!({ "status": "erro", "motivo": error }),
        }
    }
}

/// Process-wide relay state, shared across requests behind an `Arc`.
pub struct Relay {
    dedup: DuplicateFilter,
    policy: Arc<PolicyStore>,
    media: MediaResolver,
    gate: DispatchGate,
    history: Arc<HistoryAssembler>,
    bridge: OrchestratorBridge,
    delivery: Delivery,
}

impl Relay {
    /// Wire the relay from config, loading the policy files from storage.
    pub fn new(config: &AppConfig, collaborators: Collaborators) -> Result<Self, PolicyError> {
        let policy = Arc::new(PolicyStore::load(
            config.storage.contacts_path(),
            config.storage.policy_path(),
        )?);
        Ok(Self::with_policy(config, collaborators, policy))
    }

    /// Wire the relay around an already loaded policy store.
    pub fn with_policy(config: &AppConfig, collaborators: Collaborators, policy: Arc<PolicyStore>) -> Self {
        let Collaborators {
            transport,
            orchestrator,
            transcriber,
            captioner,
        } = collaborators;

        let log = Arc::new(ConversationLog::new(config.storage.log_dir()));
        let history = Arc::new(HistoryAssembler::new(
            log.clone(),
            config.history.seed_lines,
            config.history.surfaced_turns,
            &config.agent.persona_name,
        ));

        Self {
            dedup: DuplicateFilter::new(
                config.dedup.capacity,
                Duration::from_secs(config.dedup.ttl_secs),
            ),
            policy,
            media: MediaResolver::new(
                transport.clone(),
                transcriber,
                captioner,
                &config.media.caption_directive,
            ),
            gate: DispatchGate::from_config(&config.dispatch),
            history: history.clone(),
            bridge: OrchestratorBridge::from_config(orchestrator, &config.agent, &config.dispatch),
            delivery: Delivery::new(
                transport,
                log,
                history,
                &config.dispatch.reply_marker,
                Duration::from_secs(config.dispatch.typing_secs),
                &config.agent.persona_name,
            ),
        }
    }

    pub fn policy(&self) -> &Arc<PolicyStore> {
        &self.policy
    }

    pub fn history(&self) -> &Arc<HistoryAssembler> {
        &self.history
    }

    /// Run one event to completion.
    pub async fn handle(&self, event: InboundEvent) -> Outcome {
        let duplicate = self.dedup.seen(&event.event_id);

        let text = match (&event.media, duplicate) {
            (Some(media), false) => match self.media.resolve(media, &event.raw_text).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(event_id = %event.event_id, error = %e, "Media could not be resolved, dropping event");
                    return Outcome::Ignored {
                        motivo: MEDIA_FAILURE_MOTIVO.into(),
                    };
                }
            },
            _ => event.raw_text.clone(),
        };

        if let Some(reason) = self
            .gate
            .screen(duplicate, &text, &event.sender_id, &event.own_id)
        {
            debug!(event_id = %event.event_id, reason = ?reason, "Event suppressed");
            return Outcome::Ignored {
                motivo: reason.motivo().into(),
            };
        }

        let authorization = self.policy.authorize(&event.sender_id, event.is_group).await;
        match self.gate.judge(&authorization, &text) {
            Decision::Suppressed(reason) => Outcome::Ignored {
                motivo: reason.motivo().into(),
            },
            Decision::Declined(refusal) => {
                info!(sender = %event.sender_id, group = event.is_group, "Reply declined");
                match self.delivery.record_declined(&event, &text, &refusal).await {
                    Ok(()) => Outcome::Declined { text: refusal },
                    Err(e) => failed(&event, e),
                }
            }
            Decision::Proceed => self.answer(&event, &text).await,
        }
    }

    async fn answer(&self, event: &InboundEvent, text: &str) -> Outcome {
        let turn = ConversationTurn::user(
            text,
            &event.sender_display_name,
            &event.message_type,
            event.timestamp,
        );
        let turns = self.history.assemble(&event.sender_id, turn).await;
        let reply = self
            .bridge
            .invoke(text, &event.sender_display_name, &turns)
            .await;

        match self.delivery.deliver(event, text, &reply).await {
            Ok(()) => Outcome::Replied {
                text: reply,
                chat_id: event.chat_id.clone(),
            },
            Err(e) => failed(event, e),
        }
    }
}

fn failed(event: &InboundEvent, e: zaprelay_core::Error) -> Outcome {
    error!(event_id = %event.event_id, error = %e, "Event processing failed");
    Outcome::Failed {
        error: e.to_string(),
    }
}
