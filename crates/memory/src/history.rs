//! Per-contact context window.
//!
//! The first time a contact is referenced in this process, its buffer is
//! seeded from the tail of its log file. After that the buffer only grows in
//! memory; the file is not read again until restart.

use crate::log::ConversationLog;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use zaprelay_core::turn::ConversationTurn;

pub struct HistoryAssembler {
    log: Arc<ConversationLog>,
    buffers: Mutex<HashMap<String, Vec<ConversationTurn>>>,
    /// Log lines read when seeding
    seed_lines: usize,
    /// Turns handed to the agent
    surfaced_turns: usize,
    /// Speaker name for assistant turns read back from disk
    assistant_name: String,
}

impl HistoryAssembler {
    pub fn new(
        log: Arc<ConversationLog>,
        seed_lines: usize,
        surfaced_turns: usize,
        assistant_name: impl Into<String>,
    ) -> Self {
        Self {
            log,
            buffers: Mutex::new(HashMap::new()),
            seed_lines,
            surfaced_turns,
            assistant_name: assistant_name.into(),
        }
    }

    /// Retained turns per contact: two per seeded line.
    pub fn retention(&self) -> usize {
        self.seed_lines * 2
    }

    /// Append the incoming user turn and return the surfaced window, oldest first.
    pub async fn assemble(&self, contact_id: &str, incoming: ConversationTurn) -> Vec<ConversationTurn> {
        let mut buffers = self.buffers.lock().await;
        let buffer = self.buffer_for(&mut buffers, contact_id).await;
        buffer.push(incoming);
        trim_front(buffer, self.seed_lines * 2);

        let start = buffer.len().saturating_sub(self.surfaced_turns);
        buffer[start..].to_vec()
    }

    /// Record the assistant's reply after it has been delivered.
    pub async fn record_reply(&self, contact_id: &str, reply: ConversationTurn) {
        let mut buffers = self.buffers.lock().await;
        let buffer = self.buffer_for(&mut buffers, contact_id).await;
        buffer.push(reply);
        trim_front(buffer, self.seed_lines * 2);
    }

    /// Everything currently retained for a contact, seeding if needed.
    pub async fn retained(&self, contact_id: &str) -> Vec<ConversationTurn> {
        let mut buffers = self.buffers.lock().await;
        self.buffer_for(&mut buffers, contact_id).await.clone()
    }

    async fn buffer_for<'a>(
        &self,
        buffers: &'a mut HashMap<String, Vec<ConversationTurn>>,
        contact_id: &str,
    ) -> &'a mut Vec<ConversationTurn> {
        if !buffers.contains_key(contact_id) {
            let seeded = self.seed(contact_id).await;
            buffers.insert(contact_id.to_string(), seeded);
        }
        buffers.entry(contact_id.to_string()).or_default()
    }

    async fn seed(&self, contact_id: &str) -> Vec<ConversationTurn> {
        let records = match self.log.tail(contact_id, self.seed_lines).await {
            Ok(records) => records,
            Err(e) => {
                warn!(contact = contact_id, error = %e, "Could not read log for history, starting empty");
                return Vec::new();
            }
        };

        let turns: Vec<ConversationTurn> = records
            .iter()
            .flat_map(|r| r.turns(&self.assistant_name))
            .collect();
        debug!(contact = contact_id, lines = records.len(), turns = turns.len(), "History seeded");
        turns
    }
}

fn trim_front(buffer: &mut Vec<ConversationTurn>, cap: usize) {
    if buffer.len() > cap {
        let excess = buffer.len() - cap;
        buffer.drain(..excess);
    }
}
