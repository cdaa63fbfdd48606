//! Model backends for ZapRelay.
//!
//! All clients speak the OpenAI-compatible HTTP API:
//! - [`OpenAiCompatProvider`]: chat completions with function calling
//! - [`WhisperTranscriber`]: speech-to-text
//! - [`VisionCaptioner`]: image description

pub mod captioning;
pub mod openai_compat;
pub mod transcription;

pub use captioning::VisionCaptioner;
pub use openai_compat::OpenAiCompatProvider;
pub use transcription::WhisperTranscriber;
