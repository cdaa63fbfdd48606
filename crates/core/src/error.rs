//! Error types for the ZapRelay domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for relay operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Gateway transport errors ---
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    // --- Media resolution errors ---
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    // --- Agent errors ---
    #[error("Orchestrator error: {0}")]
    Orchestrator(#[from] OrchestratorError),

    // --- Conversation log errors ---
    #[error("Log error: {0}")]
    Log(#[from] LogError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Gateway request to {endpoint} failed: {reason}")]
    RequestFailed { endpoint: String, reason: String },

    #[error("Gateway returned status {status} for {endpoint}")]
    BadStatus { endpoint: String, status: u16 },

    #[error("Media download failed from {url}: {reason}")]
    MediaUnavailable { url: String, reason: String },
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Media fetch failed: {0}")]
    Fetch(#[from] TransportError),

    #[error("Temporary file error: {0}")]
    TempFile(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Captioning failed: {0}")]
    Captioning(String),
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool not configured: {0}")]
    NotConfigured(String),
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Tool failed: {0}")]
    Tool(#[from] ToolError),

    #[error("Agent timed out after {0}s")]
    Timeout(u64),

    #[error("Agent returned no usable output: {0}")]
    MalformedOutput(String),
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("Failed to write conversation log {path}: {reason}")]
    Write { path: String, reason: String },

    #[error("Failed to read conversation log {path}: {reason}")]
    Read { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_displays_endpoint() {
        let err = Error::Transport(TransportError::BadStatus {
            endpoint: "/api/sendText".into(),
            status: 502,
        });
        assert!(err.to_string().contains("/api/sendText"));
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn media_error_wraps_fetch_failure() {
        let err: MediaError = TransportError::MediaUnavailable {
            url: "http://localhost:3000/files/x.oga".into(),
            reason: "404 Not Found".into(),
        }
        .into();
        assert!(matches!(err, MediaError::Fetch(_)));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn orchestrator_timeout_displays_seconds() {
        let err = OrchestratorError::Timeout(120);
        assert!(err.to_string().contains("120s"));
    }
}
