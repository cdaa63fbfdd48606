//! Media descriptors and the opaque media-to-text collaborators.

use crate::error::MediaError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What kind of content a media attachment carries.
///
/// Resolved once from the gateway's message type and the MIME type, so the
/// rest of the relay never branches on raw MIME strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Voice,
    Image,
    Video,
    Document,
    Other,
}

impl MediaKind {
    /// Classify an attachment.
    ///
    /// The gateway message type wins for voice notes (`ptt`) and plain
    /// documents; otherwise the MIME top-level type decides.
    pub fn classify(mime_type: &str, message_type: &str) -> Self {
        match message_type {
            "ptt" | "audio" => return Self::Voice,
            "document" => return Self::Document,
            _ => {}
        }

        let top = mime_type
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match top.as_str() {
            "audio" => Self::Voice,
            "image" => Self::Image,
            "video" => Self::Video,
            "application" | "text" => Self::Document,
            _ => Self::Other,
        }
    }

    /// File suffix used for the temporary file handed to collaborators.
    pub fn file_suffix(&self, mime_type: &str) -> &'static str {
        match self {
            Self::Voice => {
                if mime_type.contains("mpeg") {
                    ".mp3"
                } else if mime_type.contains("wav") {
                    ".wav"
                } else {
                    ".ogg"
                }
            }
            Self::Image => {
                if mime_type.contains("png") {
                    ".png"
                } else if mime_type.contains("webp") {
                    ".webp"
                } else {
                    ".jpg"
                }
            }
            Self::Video => ".mp4",
            Self::Document => {
                if mime_type.contains("pdf") {
                    ".pdf"
                } else {
                    ".bin"
                }
            }
            Self::Other => ".bin",
        }
    }
}

/// A media attachment reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub mime_type: String,
    pub url: String,
    pub kind: MediaKind,
}

/// Speech-to-text collaborator.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe the audio file at `path`.
    async fn transcribe(&self, path: &Path, mime_type: &str) -> Result<String, MediaError>;
}

/// Visual description collaborator.
#[async_trait]
pub trait Captioner: Send + Sync {
    /// Describe the file at `path`, following `directive`.
    async fn caption(
        &self,
        path: &Path,
        mime_type: &str,
        directive: &str,
    ) -> Result<String, MediaError>;
}
