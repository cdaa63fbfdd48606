//! Conversation log: JSON-lines storage, one file per contact.
//!
//! Each line is a JSON-encoded [`LogRecord`]. Files are only ever appended
//! to; nothing here rewrites or deletes a line.
//!
//! Storage location: `<log_dir>/messages_<contact>.log`

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use zaprelay_core::error::LogError;
use zaprelay_core::turn::{ConversationTurn, TIMESTAMP_FORMAT};

/// One exchange as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Bare sender id
    #[serde(default)]
    pub from: String,

    #[serde(default)]
    pub from_name: String,

    #[serde(default)]
    pub to: String,

    /// Gateway message type
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub user_message: String,

    #[serde(default)]
    pub assistant_response: String,

    /// `YYYY-MM-DD HH:MM:SS`, local time
    #[serde(default)]
    pub timestamp: String,
}

impl LogRecord {
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).ok()
    }

    /// Expand into the User/Assistant turns it records, skipping blank sides.
    ///
    /// Text is kept exactly as logged so reseeded turns equal the live ones.
    /// Records without a readable timestamp yield nothing.
    pub fn turns(&self, assistant_name: &str) -> Vec<ConversationTurn> {
        let Some(ts) = self.parsed_timestamp() else {
            return Vec::new();
        };

        let mut turns = Vec::with_capacity(2);
        if !self.user_message.trim().is_empty() {
            let kind = if self.kind.is_empty() { "chat" } else { &self.kind };
            turns.push(ConversationTurn::user(&self.user_message, &self.from_name, kind, ts));
        }
        if !self.assistant_response.trim().is_empty() {
            turns.push(ConversationTurn::assistant(&self.assistant_response, assistant_name, ts));
        }
        turns
    }
}

/// Append-only per-contact log files under one directory.
pub struct ConversationLog {
    dir: PathBuf,
    /// Serializes appends so concurrent exchanges never interleave bytes.
    write_lock: Mutex<()>,
}

impl ConversationLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Deterministic file for a contact. Characters outside `[A-Za-z0-9_-]`
    /// are replaced so an id can never escape the log directory.
    pub fn path_for(&self, contact_id: &str) -> PathBuf {
        let safe: String = contact_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("messages_{safe}.log"))
    }

    /// Append one record to the sender's file.
    pub async fn append(&self, record: &LogRecord) -> Result<(), LogError> {
        let path = self.path_for(&record.from);
        let write_err = |reason: String| LogError::Write {
            path: path.display().to_string(),
            reason,
        };

        let mut line = serde_json::to_string(record).map_err(|e| write_err(e.to_string()))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| write_err(e.to_string()))?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| write_err(e.to_string()))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| write_err(e.to_string()))?;
        file.flush().await.map_err(|e| write_err(e.to_string()))?;

        debug!(contact = %record.from, path = %path.display(), "Exchange logged");
        Ok(())
    }

    /// The last `n` parseable records of a contact's file, oldest first.
    ///
    /// The window is taken over raw lines, so a corrupted line inside it
    /// costs one record instead of pulling in an older one.
    pub async fn tail(&self, contact_id: &str, n: usize) -> Result<Vec<LogRecord>, LogError> {
        let path = self.path_for(contact_id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(LogError::Read {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(n);

        Ok(lines[start..]
            .iter()
            .filter_map(|line| match serde_json::from_str::<LogRecord>(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(contact = contact_id, error = %e, "Skipping corrupted log line");
                    None
                }
            })
            .collect())
    }
}
