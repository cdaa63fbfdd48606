//! Tools the ZapRelay agent can call.
//!
//! - **weather_current** / **weather_forecast**: OpenWeather lookups
//! - **send_whatsapp**: message another number through the gateway
//!
//! Tools that need a key are only registered when the key is configured.

pub mod weather;
pub mod whatsapp;

use std::sync::Arc;
use tracing::info;
use zaprelay_config::ToolsConfig;
use zaprelay_core::tool::ToolRegistry;
use zaprelay_core::transport::Transport;

pub use weather::{OpenWeatherClient, WeatherCurrentTool, WeatherForecastTool};
pub use whatsapp::SendWhatsAppTool;

/// Build the agent's tool registry from the `[tools]` config section.
pub fn default_registry(config: &ToolsConfig, transport: Arc<dyn Transport>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    if let Some(key) = &config.openweather_api_key {
        let client = Arc::new(OpenWeatherClient::new(key.clone()));
        registry.register(Box::new(WeatherCurrentTool::new(client.clone())));
        registry.register(Box::new(WeatherForecastTool::new(client)));
    }

    if config.send_whatsapp {
        registry.register(Box::new(SendWhatsAppTool::new(transport)));
    }

    info!(tools = ?registry.names(), "Tool registry ready");
    registry
}
