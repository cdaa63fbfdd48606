//! `zaprelay gateway`: Start the webhook server.

use zaprelay_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.server.port = port;
    }

    println!("📲 ZapRelay Gateway");
    println!("   Listening:  {}:{}", config.server.host, config.server.port);
    println!("   WhatsApp:   {} (session {})", config.transport.base_url, config.transport.session);
    println!("   Model:      {}", config.agent.model);
    println!("   Data dir:   {}", config.storage.root().display());
    println!(
        "   Signatures: {}",
        if config.server.webhook_secret.is_some() { "required" } else { "off" }
    );

    zaprelay_gateway::start(config).await?;

    Ok(())
}
