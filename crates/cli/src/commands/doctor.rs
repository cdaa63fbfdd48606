//! `zaprelay doctor`: Diagnose system health.

use zaprelay_config::AppConfig;
use zaprelay_policy::PolicyStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 ZapRelay Doctor — System Diagnostics");
    println!("=======================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file — run `zaprelay onboard` (using defaults)");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Fix the config before running further checks.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ Agent API key configured");
    } else {
        println!("  ❌ No agent API key — set OPENAI_API_KEY or agent.api_key");
        issues += 1;
    }

    if config.tools.openweather_api_key.is_some() {
        println!("  ✅ OpenWeather key configured (weather tools on)");
    } else {
        println!("  ⚠️  No OPENWEATHER_API_KEY — weather tools disabled");
    }

    if config.server.webhook_secret.is_none() {
        println!("  ⚠️  No server.webhook_secret — webhook signatures not checked");
    }

    let log_dir = config.storage.log_dir();
    if log_dir.exists() {
        println!("  ✅ Log directory exists: {}", log_dir.display());
    } else {
        println!("  ⚠️  No log directory — run `zaprelay onboard`");
        issues += 1;
    }

    match PolicyStore::load(config.storage.contacts_path(), config.storage.policy_path()) {
        Ok(store) => {
            let contacts = store.contacts().await;
            let enabled = contacts.iter().filter(|c| c.enabled).count();
            let policy = store.config().await;
            println!("  ✅ Policy files readable ({enabled}/{} contacts enabled)", contacts.len());
            if enabled == 0 {
                println!("  ⚠️  No enabled contacts — every message will be declined");
                issues += 1;
            }
            if !policy.responses_enabled {
                println!("  ⚠️  Replies are turned off (`zaprelay policy set responses on`)");
            }
        }
        Err(e) => {
            println!("  ❌ Policy files unreadable: {e}");
            issues += 1;
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
