//! Delivery & logger: the only place that talks back to the chat and
//! writes the conversation log.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use zaprelay_core::inbound::InboundEvent;
use zaprelay_core::transport::Transport;
use zaprelay_core::turn::{ConversationTurn, TIMESTAMP_FORMAT};
use zaprelay_memory::{ConversationLog, HistoryAssembler, LogRecord};

pub struct Delivery {
    transport: Arc<dyn Transport>,
    log: Arc<ConversationLog>,
    history: Arc<HistoryAssembler>,
    reply_marker: String,
    typing: Duration,
    persona_name: String,
}

impl Delivery {
    pub fn new(
        transport: Arc<dyn Transport>,
        log: Arc<ConversationLog>,
        history: Arc<HistoryAssembler>,
        reply_marker: impl Into<String>,
        typing: Duration,
        persona_name: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            log,
            history,
            reply_marker: reply_marker.into(),
            typing,
            persona_name: persona_name.into(),
        }
    }

    /// Outbound form of a reply.
    pub fn marked(&self, reply: &str) -> String {
        format!("{} {reply}", self.reply_marker)
    }

    /// Mark seen, simulate typing, send, then log and remember the reply.
    ///
    /// Any gateway failure stops here: nothing is logged for that event.
    pub async fn deliver(&self, event: &InboundEvent, user_text: &str, reply: &str) -> zaprelay_core::Result<()> {
        let chat = event.chat_id.as_str();

        self.transport
            .send_seen(chat, &event.event_id, event.participant.as_deref())
            .await?;
        self.transport.start_typing(chat).await?;
        tokio::time::sleep(self.typing).await;
        self.transport.stop_typing(chat).await?;
        self.transport.send_text(chat, &self.marked(reply)).await?;
        info!(chat_id = %chat, sender = %event.sender_id, "Reply sent");

        self.log.append(&record(event, user_text, reply)).await?;

        // Same timestamp as the log line, so a reseeded buffer matches this one.
        self.history
            .record_reply(
                &event.sender_id,
                ConversationTurn::assistant(reply, &self.persona_name, event.timestamp),
            )
            .await;
        Ok(())
    }

    /// A refused event is logged with the refusal as its response. Nothing is sent.
    pub async fn record_declined(&self, event: &InboundEvent, user_text: &str, refusal: &str) -> zaprelay_core::Result<()> {
        self.log.append(&record(event, user_text, refusal)).await?;
        debug!(sender = %event.sender_id, "Declined event logged");
        Ok(())
    }
}

fn record(event: &InboundEvent, user_text: &str, response: &str) -> LogRecord {
    LogRecord {
        from: event.sender_id.clone(),
        from_name: event.sender_display_name.clone(),
        to: event.to.clone(),
        kind: event.message_type.clone(),
        user_message: user_text.to_string(),
        assistant_response: response.to_string(),
        timestamp: event.timestamp.format(TIMESTAMP_FORMAT).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockTransport;
    use chrono::NaiveDateTime;
    use zaprelay_core::turn::TurnRole;

    fn event() -> InboundEvent {
        InboundEvent {
            event_id: "msg-1".into(),
            chat_id: "5511999@c.us".into(),
            is_group: false,
            participant: None,
            sender_id: "5511999".into(),
            sender_display_name: "Maria".into(),
            raw_text: "oi".into(),
            media: None,
            message_type: "chat".into(),
            to: "5511000@c.us".into(),
            own_id: "5511000".into(),
            timestamp: NaiveDateTime::parse_from_str("2025-05-01 10:00:00", TIMESTAMP_FORMAT).unwrap(),
        }
    }

    fn delivery(transport: Arc<MockTransport>, dir: &std::path::Path) -> (Delivery, Arc<ConversationLog>, Arc<HistoryAssembler>) {
        let log = Arc::new(ConversationLog::new(dir));
        let history = Arc::new(HistoryAssembler::new(log.clone(), 5, 3, "Arthur"));
        let delivery = Delivery::new(transport, log.clone(), history.clone(), "🤖:", Duration::from_secs(3), "Arthur");
        (delivery, log, history)
    }

    #[tokio::test(start_paused = true)]
    async fn deliver_orders_calls_and_logs() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::default());
        let (delivery, log, history) = delivery(transport.clone(), dir.path());

        delivery.deliver(&event(), "oi", "Olá.").await.unwrap();

        assert_eq!(
            transport.calls(),
            vec!["seen:msg-1", "typing:start", "typing:stop", "send"]
        );
        assert_eq!(transport.sent(), vec![("5511999@c.us".to_string(), "🤖: Olá.".to_string())]);

        let records = log.tail("5511999", 10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_message, "oi");
        assert_eq!(records[0].assistant_response, "Olá.");
        assert_eq!(records[0].from_name, "Maria");
        assert_eq!(records[0].kind, "chat");
        assert_eq!(records[0].timestamp, "2025-05-01 10:00:00");

        let retained = history.retained("5511999").await;
        let last = retained.last().unwrap();
        assert_eq!(last.role, TurnRole::Assistant);
        assert_eq!(last.text, "Olá.");
    }

    #[tokio::test(start_paused = true)]
    async fn send_failure_logs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport {
            fail_send: true,
            ..Default::default()
        });
        let (delivery, log, _) = delivery(transport, dir.path());

        let err = delivery.deliver(&event(), "oi", "Olá.").await.unwrap_err();
        assert!(matches!(err, zaprelay_core::Error::Transport(_)));
        assert!(log.tail("5511999", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn declined_logs_without_sending() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::default());
        let (delivery, log, _) = delivery(transport.clone(), dir.path());

        delivery.record_declined(&event(), "oi", "recusado").await.unwrap();

        assert!(transport.calls().is_empty());
        let records = log.tail("5511999", 10).await.unwrap();
        assert_eq!(records[0].assistant_response, "recusado");
    }
}
