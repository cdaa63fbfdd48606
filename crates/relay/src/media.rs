//! Media resolver: turns an attachment into the text the rest of the relay sees.
//!
//! Bytes are written to a named temporary file so collaborators can read
//! them by path. The file is removed when it goes out of scope, on every
//! exit path.

use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use zaprelay_core::error::MediaError;
use zaprelay_core::media::{Captioner, MediaDescriptor, MediaKind, Transcriber};
use zaprelay_core::transport::Transport;

pub struct MediaResolver {
    transport: Arc<dyn Transport>,
    transcriber: Arc<dyn Transcriber>,
    captioner: Arc<dyn Captioner>,
    /// Instruction handed to the captioner
    caption_directive: String,
}

impl MediaResolver {
    pub fn new(
        transport: Arc<dyn Transport>,
        transcriber: Arc<dyn Transcriber>,
        captioner: Arc<dyn Captioner>,
        caption_directive: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            transcriber,
            captioner,
            caption_directive: caption_directive.into(),
        }
    }

    /// Resolve an attachment to text. `Other` keeps `raw_text` and fetches nothing.
    pub async fn resolve(&self, media: &MediaDescriptor, raw_text: &str) -> Result<String, MediaError> {
        if media.kind == MediaKind::Other {
            debug!(mime = %media.mime_type, "Unsupported media kind, keeping body text");
            return Ok(raw_text.to_string());
        }

        let bytes = self.transport.fetch_media(&media.url).await?;
        let file = stage(&bytes, media)?;
        debug!(kind = ?media.kind, bytes = bytes.len(), path = %file.path().display(), "Media staged");

        let text = match media.kind {
            MediaKind::Voice => {
                self.transcriber
                    .transcribe(file.path(), &media.mime_type)
                    .await?
            }
            MediaKind::Image | MediaKind::Video | MediaKind::Document => {
                self.captioner
                    .caption(file.path(), &media.mime_type, &self.caption_directive)
                    .await?
            }
            MediaKind::Other => raw_text.to_string(),
        };

        info!(kind = ?media.kind, chars = text.len(), "Media resolved");
        Ok(text)
    }
}

fn stage(bytes: &[u8], media: &MediaDescriptor) -> Result<NamedTempFile, MediaError> {
    let mut file = tempfile::Builder::new()
        .prefix("zaprelay-")
        .suffix(media.kind.file_suffix(&media.mime_type))
        .tempfile()
        .map_err(|e| MediaError::TempFile(e.to_string()))?;
    file.write_all(bytes)
        .and_then(|()| file.flush())
        .map_err(|e| MediaError::TempFile(e.to_string()))?;
    Ok(file)
}
