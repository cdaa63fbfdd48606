//! Conversation memory for ZapRelay.
//!
//! - `log`: the durable, append-only record of every exchange, one file per contact
//! - `history`: the bounded in-process context window seeded from that record

pub mod history;
pub mod log;

pub use history::HistoryAssembler;
pub use log::{ConversationLog, LogRecord};
