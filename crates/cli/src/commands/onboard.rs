//! `zaprelay onboard`: First-time setup.

use zaprelay_config::AppConfig;
use zaprelay_policy::PolicyConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("📲 ZapRelay — First-Time Setup");
    println!("==============================\n");

    // Create directories
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    // Create config file
    let config = if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
        AppConfig::load_from(&config_path).map_err(|e| format!("Failed to load config: {e}"))?
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
        AppConfig::default()
    };

    let log_dir = config.storage.log_dir();
    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)?;
        println!("✅ Created log directory: {}", log_dir.display());
    }

    let policy_path = config.storage.policy_path();
    if !policy_path.exists() {
        std::fs::write(&policy_path, PolicyConfig::default().render())?;
        println!("✅ Created {} (replies on)", policy_path.display());
    }

    let contacts_path = config.storage.contacts_path();
    if !contacts_path.exists() {
        std::fs::write(&contacts_path, "")?;
        println!("✅ Created {} (empty)", contacts_path.display());
    }

    println!("\n📝 Next steps:");
    println!("   1. Set OPENAI_API_KEY (or agent.api_key in {})", config_path.display());
    println!("   2. Allow a contact: zaprelay contacts add 5511999999999 --name Maria");
    println!("   3. Point the WhatsApp gateway webhook at http://<host>:{}/webhook", config.server.port);
    println!("   4. Run: zaprelay gateway\n");

    println!("🎉 Setup complete!\n");

    Ok(())
}
