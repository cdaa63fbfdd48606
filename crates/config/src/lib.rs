//! Configuration loading, validation, and management for ZapRelay.
//!
//! Loads configuration from `~/.zaprelay/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.zaprelay/config.toml`. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Webhook listener
    #[serde(default)]
    pub server: ServerConfig,

    /// Messaging gateway (outbound calls)
    #[serde(default)]
    pub transport: TransportConfig,

    /// On-disk locations for logs and policy files
    #[serde(default)]
    pub storage: StorageConfig,

    /// Reply marker, canned texts, and typing simulation
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Conversation context window
    #[serde(default)]
    pub history: HistoryConfig,

    /// Duplicate delivery suppression
    #[serde(default)]
    pub dedup: DedupConfig,

    /// Reasoning agent
    #[serde(default)]
    pub agent: AgentConfig,

    /// Transcription and captioning
    #[serde(default)]
    pub media: MediaConfig,

    /// Tools exposed to the agent
    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_true() -> bool {
    true
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret for the gateway's HMAC webhook signature. None = no check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_secret: None,
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("webhook_secret", &redact(&self.webhook_secret))
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Base URL of the local messaging gateway
    #[serde(default = "default_gateway_url")]
    pub base_url: String,

    /// Gateway session name
    #[serde(default = "default_session")]
    pub session: String,

    /// Optional `X-Api-Key` for the gateway
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_gateway_url() -> String {
    "http://localhost:3000".into()
}
fn default_session() -> String {
    "default".into()
}
fn default_request_timeout() -> u64 {
    30
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: default_gateway_url(),
            session: default_session(),
            api_key: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl std::fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportConfig")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .field("api_key", &redact(&self.api_key))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory. Defaults to `~/.zaprelay`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,

    /// Per-contact conversation logs, relative to the data dir
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_contacts_file")]
    pub contacts_file: String,

    #[serde(default = "default_policy_file")]
    pub policy_file: String,
}

fn default_log_dir() -> String {
    "logs".into()
}
fn default_contacts_file() -> String {
    "allowed_contacts.txt".into()
}
fn default_policy_file() -> String {
    "config.txt".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            log_dir: default_log_dir(),
            contacts_file: default_contacts_file(),
            policy_file: default_policy_file(),
        }
    }
}

impl StorageConfig {
    pub fn root(&self) -> PathBuf {
        self.data_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(AppConfig::config_dir)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root().join(&self.log_dir)
    }

    pub fn contacts_path(&self) -> PathBuf {
        self.root().join(&self.contacts_file)
    }

    pub fn policy_path(&self) -> PathBuf {
        self.root().join(&self.policy_file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Prefix on every outbound reply; inbound text starting with it is an echo
    #[serde(default = "default_reply_marker")]
    pub reply_marker: String,

    /// Seconds of "typing..." before a reply is sent
    #[serde(default = "default_typing_secs")]
    pub typing_secs: u64,

    /// Logged (never sent) when a contact is not allowed or replies are off
    #[serde(default = "default_refusal_text")]
    pub refusal_text: String,

    /// Logged when an allowed contact sends a message with no text
    #[serde(default = "default_empty_text_notice")]
    pub empty_text_notice: String,

    /// Sent when the agent fails
    #[serde(default = "default_failure_text")]
    pub failure_text: String,

    /// Display name used when the gateway reports none
    #[serde(default = "default_unknown_sender")]
    pub unknown_sender_name: String,
}

fn default_reply_marker() -> String {
    "🤖:".into()
}
fn default_typing_secs() -> u64 {
    3
}
fn default_refusal_text() -> String {
    "Respostas desabilitadas ou remetente não autorizado.".into()
}
fn default_empty_text_notice() -> String {
    "mensagem texto vazia".into()
}
fn default_failure_text() -> String {
    "Não consegui responder agora, tente novamente mais tarde.".into()
}
fn default_unknown_sender() -> String {
    "Desconhecido".into()
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            reply_marker: default_reply_marker(),
            typing_secs: default_typing_secs(),
            refusal_text: default_refusal_text(),
            empty_text_notice: default_empty_text_notice(),
            failure_text: default_failure_text(),
            unknown_sender_name: default_unknown_sender(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Log lines read from disk the first time a contact is seen
    #[serde(default = "default_seed_lines")]
    pub seed_lines: usize,

    /// Buffered turns handed to the agent
    #[serde(default = "default_surfaced_turns")]
    pub surfaced_turns: usize,
}

fn default_seed_lines() -> usize {
    5
}
fn default_surfaced_turns() -> usize {
    3
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            seed_lines: default_seed_lines(),
            surfaced_turns: default_surfaced_turns(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Maximum remembered event ids
    #[serde(default = "default_dedup_capacity")]
    pub capacity: usize,

    /// How long an event id is remembered
    #[serde(default = "default_dedup_ttl")]
    pub ttl_secs: u64,
}

fn default_dedup_capacity() -> usize {
    10_000
}
fn default_dedup_ttl() -> u64 {
    24 * 60 * 60
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            capacity: default_dedup_capacity(),
            ttl_secs: default_dedup_ttl(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// OpenAI-compatible base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Tool-call rounds before the agent is forced to stop
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Upper bound on one agent run
    #[serde(default = "default_agent_timeout")]
    pub timeout_secs: u64,

    /// Name the assistant speaks as; also the speaker of assistant turns
    #[serde(default = "default_persona_name")]
    pub persona_name: String,

    /// Replace the built-in persona directive entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4.1-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_iterations() -> u32 {
    8
}
fn default_agent_timeout() -> u64 {
    120
}
fn default_persona_name() -> String {
    "Arthur".into()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            max_iterations: default_max_iterations(),
            timeout_secs: default_agent_timeout(),
            persona_name: default_persona_name(),
            system_prompt: None,
        }
    }
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_iterations", &self.max_iterations)
            .field("timeout_secs", &self.timeout_secs)
            .field("persona_name", &self.persona_name)
            .field("system_prompt", &self.system_prompt.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,

    #[serde(default = "default_caption_model")]
    pub caption_model: String,

    /// Instruction handed to the captioning service with every image
    #[serde(default = "default_caption_directive")]
    pub caption_directive: String,

    /// Largest attachment the relay will download
    #[serde(default = "default_media_max_bytes")]
    pub max_bytes: usize,
}

fn default_transcription_model() -> String {
    "gpt-4o-mini-transcribe".into()
}
fn default_caption_model() -> String {
    "gpt-4.1-mini".into()
}
fn default_media_max_bytes() -> usize {
    16 * 1024 * 1024
}
fn default_caption_directive() -> String {
    "Comente esta imagem em primeira pessoa, como se você mesmo a tivesse visto \
     numa conversa de WhatsApp. Seja breve e natural. Nunca diga que é uma \
     descrição, uma análise automática ou uma IA."
        .into()
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            transcription_model: default_transcription_model(),
            caption_model: default_caption_model(),
            caption_directive: default_caption_directive(),
            max_bytes: default_media_max_bytes(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// OpenWeather key; weather tools are only registered when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openweather_api_key: Option<String>,

    /// Let the agent message other WhatsApp numbers
    #[serde(default = "default_true")]
    pub send_whatsapp: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            openweather_api_key: None,
            send_whatsapp: true,
        }
    }
}

impl std::fmt::Debug for ToolsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolsConfig")
            .field("openweather_api_key", &redact(&self.openweather_api_key))
            .field("send_whatsapp", &self.send_whatsapp)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.zaprelay/config.toml).
    ///
    /// Environment variables override the file:
    /// - `ZAPRELAY_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `ZAPRELAY_MODEL`
    /// - `ZAPRELAY_GATEWAY_URL`
    /// - `OPENWEATHER_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through a lookup function.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("ZAPRELAY_API_KEY") {
            self.agent.api_key = Some(key);
        } else if self.agent.api_key.is_none() {
            self.agent.api_key = lookup("OPENAI_API_KEY");
        }

        if let Some(model) = lookup("ZAPRELAY_MODEL") {
            self.agent.model = model;
        }

        if let Some(url) = lookup("ZAPRELAY_GATEWAY_URL") {
            self.transport.base_url = url;
        }

        if self.tools.openweather_api_key.is_none() {
            self.tools.openweather_api_key = lookup("OPENWEATHER_API_KEY");
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".zaprelay")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.temperature < 0.0 || self.agent.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "agent.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.dispatch.reply_marker.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "dispatch.reply_marker must not be empty".into(),
            ));
        }

        if self.history.seed_lines == 0 || self.history.surfaced_turns == 0 {
            return Err(ConfigError::ValidationError(
                "history.seed_lines and history.surfaced_turns must be > 0".into(),
            ));
        }

        if self.dedup.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "dedup.capacity must be > 0".into(),
            ));
        }

        if self.media.max_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "media.max_bytes must be > 0".into(),
            ));
        }

        if self.agent.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "agent.timeout_secs must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an agent API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.agent.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.transport.base_url, "http://localhost:3000");
        assert_eq!(config.dispatch.reply_marker, "🤖:");
        assert_eq!(config.history.seed_lines, 5);
        assert_eq!(config.history.surfaced_turns, 3);
        assert_eq!(config.media.max_bytes, 16 * 1024 * 1024);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.server.port, config.server.port);
        assert_eq!(parsed.dispatch.refusal_text, config.dispatch.refusal_text);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 8080

[history]
seed_lines = 8
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.history.seed_lines, 8);
        assert_eq!(config.history.surfaced_turns, 3);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.agent.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_seed_lines_rejected() {
        let mut config = AppConfig::default();
        config.history.seed_lines = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_media_limit_rejected() {
        let mut config = AppConfig::default();
        config.media.max_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "server = [").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-test"),
            ("ZAPRELAY_GATEWAY_URL", "http://waha:3000"),
            ("OPENWEATHER_API_KEY", "ow-key"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.agent.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.transport.base_url, "http://waha:3000");
        assert_eq!(config.tools.openweather_api_key.as_deref(), Some("ow-key"));
    }

    #[test]
    fn relay_key_beats_openai_key() {
        let mut config = AppConfig::default();
        config.apply_env(|k| match k {
            "ZAPRELAY_API_KEY" => Some("relay".into()),
            "OPENAI_API_KEY" => Some("openai".into()),
            _ => None,
        });
        assert_eq!(config.agent.api_key.as_deref(), Some("relay"));
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = AppConfig::default();
        config.agent.api_key = Some("sk-secret".into());
        config.server.webhook_secret = Some("hmac-secret".into());
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(!dbg.contains("hmac-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn storage_paths_resolve_under_data_dir() {
        let storage = StorageConfig {
            data_dir: Some("/srv/relay".into()),
            ..StorageConfig::default()
        };
        assert_eq!(storage.log_dir(), PathBuf::from("/srv/relay/logs"));
        assert_eq!(
            storage.contacts_path(),
            PathBuf::from("/srv/relay/allowed_contacts.txt")
        );
        assert_eq!(storage.policy_path(), PathBuf::from("/srv/relay/config.txt"));
    }
}
