//! Webhook HTTP server for ZapRelay.
//!
//! Exposes the gateway-facing endpoints:
//! - `POST /webhook`: one inbound chat event per request
//! - `GET /health`: liveness probe
//!
//! Built on Axum. Every request runs to completion on its own task; all
//! shared state lives in the [`Relay`].

use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::Timelike;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use zaprelay_agent::AgentLoop;
use zaprelay_channels::{SignatureVerifier, WahaTransport, WebhookEnvelope, WebhookError};
use zaprelay_config::AppConfig;
use zaprelay_core::transport::Transport;
use zaprelay_providers::{OpenAiCompatProvider, VisionCaptioner, WhisperTranscriber};
use zaprelay_relay::{Collaborators, Relay};

/// Header carrying the gateway's HMAC-SHA512 body signature.
pub const SIGNATURE_HEADER: &str = "X-Webhook-Hmac";

/// Shared application state for the webhook server.
pub struct GatewayState {
    pub relay: Arc<Relay>,
    pub verifier: SignatureVerifier,
    /// Display name for senders the gateway does not name
    pub unknown_sender: String,
}

impl GatewayState {
    pub fn new(relay: Arc<Relay>, config: &AppConfig) -> Self {
        Self {
            relay,
            verifier: SignatureVerifier::new(config.server.webhook_secret.clone()),
            unknown_sender: config.dispatch.unknown_sender_name.clone(),
        }
    }
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/webhook", post(webhook_handler))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Wire the concrete HTTP adapters into a [`Relay`].
///
/// Fails when the agent API key is missing or the policy files cannot be read.
pub fn build_relay(config: &AppConfig) -> Result<Relay, Box<dyn std::error::Error>> {
    let api_key = config
        .agent
        .api_key
        .clone()
        .ok_or("No agent API key configured: set ZAPRELAY_API_KEY or OPENAI_API_KEY")?;

    let transport: Arc<dyn Transport> = Arc::new(
        WahaTransport::from_config(&config.transport).with_max_media_bytes(config.media.max_bytes),
    );
    let provider = Arc::new(OpenAiCompatProvider::from_config(&config.agent)?);
    let tools = Arc::new(zaprelay_tools::default_registry(&config.tools, transport.clone()));
    info!(tools = ?tools.names(), "Tool registry ready");

    let agent = AgentLoop::from_config(&config.agent, provider, tools);
    let collaborators = Collaborators {
        transport,
        orchestrator: Arc::new(agent),
        transcriber: Arc::new(WhisperTranscriber::new(
            &config.agent.api_url,
            &api_key,
            &config.media.transcription_model,
        )),
        captioner: Arc::new(VisionCaptioner::new(
            &config.agent.api_url,
            &api_key,
            &config.media.caption_model,
        )),
    };

    Ok(Relay::new(config, collaborators)?)
}

/// Start the webhook server and run until the listener fails.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let relay = Arc::new(build_relay(&config)?);
    let state = Arc::new(GatewayState::new(relay, &config));
    if !state.verifier.is_enabled() {
        warn!("No webhook secret configured, accepting unsigned webhooks");
    }

    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn webhook_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if state.verifier.is_enabled() {
        let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
        if !state.verifier.verify(&body, signature) {
            warn!("Webhook signature rejected");
            return (StatusCode::UNAUTHORIZED, "invalid signature").into_response();
        }
    }

    let now = chrono::Local::now().naive_local();
    // The conversation log keeps whole seconds.
    let received_at = now.with_nanosecond(0).unwrap_or(now);

    let event = match WebhookEnvelope::parse(&body)
        .and_then(|envelope| envelope.into_inbound(received_at, &state.unknown_sender))
    {
        Ok(event) => event,
        Err(e) => {
            match &e {
                WebhookError::UnknownEvent(name) => debug!(event = %name, "Ignoring webhook event"),
                WebhookError::Malformed(reason) => warn!(reason = %reason, "Malformed webhook body"),
            }
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    info!(
        event_id = %event.event_id,
        sender = %event.sender_id,
        group = event.is_group,
        media = event.media.is_some(),
        "Webhook message received"
    );

    let outcome = state.relay.handle(event).await;
    Json(outcome.body()).into_response()
}
